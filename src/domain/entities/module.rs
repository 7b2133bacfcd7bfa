//! Plugin contract - what a loaded plugin module exposes to the engine

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::errors::OperationError;

/// Future returned by a plugin operation
pub type OperationFuture = BoxFuture<'static, Result<Value, OperationError>>;

/// Callable operation exposed under a capability namespace
pub type Operation = Arc<dyn Fn(Value) -> OperationFuture + Send + Sync>;

/// Cleanup hook run when a plugin is removed
pub type Teardown = Arc<dyn Fn() -> BoxFuture<'static, Result<(), OperationError>> + Send + Sync>;

/// Computes a display cell from a resource document
pub type DisplayFn = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Editable field of a resource, shown when creating or editing an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub key: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub placeholder: Option<String>,
    #[serde(default)]
    pub secret: bool,
}

impl FieldDescriptor {
    pub fn text(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            kind: "text".to_string(),
            placeholder: None,
            secret: false,
        }
    }

    pub fn textarea(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            kind: "textarea".to_string(),
            ..Self::text(name, key)
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }
}

/// Column displayed in a resource table
#[derive(Clone)]
pub struct DisplayColumn {
    pub name: String,
    value: DisplayFn,
}

impl DisplayColumn {
    pub fn new<F>(name: impl Into<String>, value: F) -> Self
    where
        F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            value: Arc::new(value),
        }
    }

    /// Column showing a string property of the document as-is.
    pub fn property(name: impl Into<String>, key: &'static str) -> Self {
        Self::new(name, move |item| {
            item.get(key).and_then(Value::as_str).map(str::to_string)
        })
    }

    pub fn render(&self, item: &Value) -> Option<String> {
        (self.value)(item)
    }
}

impl std::fmt::Debug for DisplayColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayColumn").field("name", &self.name).finish()
    }
}

/// User-tunable setting declared by a plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub label: String,
    pub key: String,
    pub default: Value,
}

impl Setting {
    pub fn new(label: impl Into<String>, key: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            label: label.into(),
            key: key.into(),
            default: default.into(),
        }
    }
}

/// Capability namespace: operations plus metadata for one resource type
#[derive(Default)]
pub struct Capability {
    operations: HashMap<String, Operation>,
    pub fields: Vec<FieldDescriptor>,
    pub display: Vec<DisplayColumn>,
    pub schema: Option<Value>,
}

impl Capability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operation<F, Fut>(mut self, name: impl Into<String>, operation: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, OperationError>> + Send + 'static,
    {
        let operation: Operation = Arc::new(move |argument| Box::pin(operation(argument)));
        self.operations.insert(name.into(), operation);
        self
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_display(mut self, column: DisplayColumn) -> Self {
        self.display.push(column);
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn operation(&self, name: &str) -> Option<Operation> {
        self.operations.get(name).cloned()
    }

    pub fn has_operation(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    pub fn operation_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capability")
            .field("operations", &self.operation_names())
            .field("fields", &self.fields)
            .field("display", &self.display)
            .field("schema", &self.schema)
            .finish()
    }
}

/// Surface a plugin exposes once loaded
#[derive(Default)]
pub struct PluginModule {
    dependencies: Vec<String>,
    capabilities: HashMap<String, Arc<Capability>>,
    settings: Vec<Setting>,
    teardown: Option<Teardown>,
}

impl PluginModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a plugin that must run before this one for any shared operation.
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(name.into());
        self
    }

    pub fn with_capability(mut self, name: impl Into<String>, capability: Capability) -> Self {
        self.capabilities.insert(name.into(), Arc::new(capability));
        self
    }

    pub fn with_setting(mut self, setting: Setting) -> Self {
        self.settings.push(setting);
        self
    }

    pub fn with_teardown<F, Fut>(mut self, teardown: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), OperationError>> + Send + 'static,
    {
        self.teardown = Some(Arc::new(move || Box::pin(teardown())));
        self
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn capability(&self, name: &str) -> Option<Arc<Capability>> {
        self.capabilities.get(name).cloned()
    }

    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }

    pub fn settings(&self) -> &[Setting] {
        &self.settings
    }

    pub fn teardown(&self) -> Option<Teardown> {
        self.teardown.clone()
    }
}

impl std::fmt::Debug for PluginModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginModule")
            .field("dependencies", &self.dependencies)
            .field("capabilities", &self.capabilities.keys().collect::<Vec<_>>())
            .field("settings", &self.settings)
            .field("teardown", &self.teardown.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_capability_operation_is_callable() {
        let capability = Capability::new()
            .with_operation("ping", |arg: Value| async move { Ok(json!({ "echo": arg })) });

        assert!(capability.has_operation("ping"));
        assert!(!capability.has_operation("refresh"));

        let ping = capability.operation("ping").expect("ping registered");
        let output = ping(json!(1)).await.unwrap();
        assert_eq!(output, json!({ "echo": 1 }));
    }

    #[test]
    fn test_module_builder() {
        let module = PluginModule::new()
            .depends_on("core")
            .with_capability("servers", Capability::new())
            .with_setting(Setting::new("Interval", "interval", 60));

        assert_eq!(module.dependencies(), ["core".to_string()]);
        assert!(module.has_capability("servers"));
        assert!(module.capability("websites").is_none());
        assert_eq!(module.settings()[0].default, json!(60));
        assert!(module.teardown().is_none());
    }

    #[test]
    fn test_display_property_column() {
        let column = DisplayColumn::property("Name", "name");
        assert_eq!(column.render(&json!({ "name": "web-1" })).as_deref(), Some("web-1"));
        assert_eq!(column.render(&json!({})), None);
    }
}
