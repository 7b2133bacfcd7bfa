//! Capability resolution - which plugins expose a given resource type

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::ordering;
use super::registry::{PluginRegistry, PluginWrapper};
use crate::application::errors::PluginError;
use crate::domain::entities::{Capability, FieldDescriptor, Setting};

/// One rendered display column of a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayCell {
    pub column: String,
    pub value: Option<String>,
}

impl PluginRegistry {
    /// All registered plugins in dependency order.
    pub async fn ordered(&self) -> Result<Vec<PluginWrapper>, PluginError> {
        ordering::order(self.snapshot().await)
    }

    /// Plugins exposing `capability`, in dependency order.
    pub async fn get_plugin_wrappers(&self, capability: &str) -> Result<Vec<PluginWrapper>, PluginError> {
        Ok(self
            .ordered()
            .await?
            .into_iter()
            .filter(|p| p.module().has_capability(capability))
            .collect())
    }

    /// Capability namespaces named `capability`, in dependency order.
    pub async fn get_plugins(&self, capability: &str) -> Result<Vec<Arc<Capability>>, PluginError> {
        Ok(self
            .get_plugin_wrappers(capability)
            .await?
            .iter()
            .filter_map(|p| p.module().capability(capability))
            .collect())
    }

    /// Editable fields contributed to `capability` by every plugin.
    pub async fn fields(&self, capability: &str) -> Result<Vec<FieldDescriptor>, PluginError> {
        Ok(self
            .get_plugins(capability)
            .await?
            .iter()
            .flat_map(|c| c.fields.iter().cloned())
            .collect())
    }

    /// Evaluate every display column of `capability` against one resource.
    ///
    /// A later plugin's column with the same name replaces the earlier value
    /// but keeps the column's first position.
    pub async fn render_row(&self, capability: &str, item: &Value) -> Result<Vec<DisplayCell>, PluginError> {
        let mut row: Vec<DisplayCell> = Vec::new();
        for namespace in self.get_plugins(capability).await? {
            for column in &namespace.display {
                let value = column.render(item);
                match row.iter_mut().find(|cell| cell.column == column.name) {
                    Some(cell) => cell.value = value,
                    None => row.push(DisplayCell {
                        column: column.name.clone(),
                        value,
                    }),
                }
            }
        }
        Ok(row)
    }

    /// Settings declared by every registered plugin.
    pub async fn settings(&self) -> Result<Vec<Setting>, PluginError> {
        Ok(self
            .ordered()
            .await?
            .iter()
            .flat_map(|p| p.module().settings().iter().cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::engine::testing::{registry_with_builtin, FakeProvider};
    use crate::domain::entities::{DisplayColumn, PluginDescriptor, PluginModule};
    use crate::infrastructure::storage::MemoryPluginStore;
    use serde_json::json;

    async fn registry() -> PluginRegistry {
        let provider = FakeProvider::new()
            .with_plugin(
                "web",
                "1.0.0",
                PluginModule::new().with_capability(
                    "websites",
                    Capability::new()
                        .with_field(FieldDescriptor::text("Domain", "domain"))
                        .with_display(DisplayColumn::property("Domain", "domain")),
                ),
            )
            .with_plugin(
                "ip",
                "1.0.0",
                PluginModule::new().depends_on("core").with_capability(
                    "servers",
                    Capability::new()
                        .with_field(FieldDescriptor::text("IP", "ip"))
                        .with_display(DisplayColumn::property("IP", "ip"))
                        .with_display(DisplayColumn::new("Name", |_| Some("overridden".to_string()))),
                ),
            );
        let builtin = PluginModule::new().with_capability(
            "servers",
            Capability::new()
                .with_field(FieldDescriptor::text("Name", "name"))
                .with_display(DisplayColumn::property("Name", "name")),
        );
        let registry = registry_with_builtin(Arc::new(MemoryPluginStore::new()), provider, builtin);
        registry.initialize().await.unwrap();
        registry.add_plugin(PluginDescriptor::new("web")).await.unwrap();
        registry.add_plugin(PluginDescriptor::new("ip")).await.unwrap();
        registry
    }

    #[tokio::test]
    async fn test_only_plugins_exposing_capability() {
        let registry = registry().await;

        let servers: Vec<String> = registry
            .get_plugin_wrappers("servers")
            .await
            .unwrap()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(servers, ["core", "ip"]);

        let websites = registry.get_plugin_wrappers("websites").await.unwrap();
        assert_eq!(websites.len(), 1);
        assert_eq!(websites[0].name(), "web");

        assert!(registry.get_plugins("printers").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fields_concatenated_in_order() {
        let registry = registry().await;
        let keys: Vec<String> = registry
            .fields("servers")
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.key)
            .collect();
        assert_eq!(keys, ["name", "ip"]);
    }

    #[tokio::test]
    async fn test_render_row_merges_columns() {
        let registry = registry().await;
        let row = registry
            .render_row("servers", &json!({ "name": "web-1", "ip": "10.0.0.1" }))
            .await
            .unwrap();
        assert_eq!(
            row,
            vec![
                DisplayCell { column: "Name".into(), value: Some("overridden".into()) },
                DisplayCell { column: "IP".into(), value: Some("10.0.0.1".into()) },
            ]
        );
    }
}
