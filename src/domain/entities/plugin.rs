use serde::{Deserialize, Serialize};

/// Name of the built-in plugin that is always registered.
pub const CORE_PLUGIN: &str = "core";

/// Request to install a plugin
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub name: String,
    pub version: Option<String>,
    #[serde(default)]
    pub local_install: bool,
    /// Set when re-installing a plugin that already has a stored record.
    pub id: Option<i64>,
}

impl PluginDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Names starting with `.` are paths to a plugin on the local filesystem.
    pub fn is_local_path(&self) -> bool {
        self.name.starts_with('.')
    }
}

impl From<&PluginRecord> for PluginDescriptor {
    fn from(record: &PluginRecord) -> Self {
        Self {
            name: record.name.clone(),
            version: Some(record.version.clone()),
            local_install: false,
            id: record.id,
        }
    }
}

/// Durable record of an installed plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRecord {
    /// Store key; `None` only for the built-in plugin.
    pub id: Option<i64>,
    pub name: String,
    pub version: String,
    pub installed_at: Option<String>,
}

impl PluginRecord {
    /// Synthetic record carried by the built-in plugin.
    pub fn builtin() -> Self {
        Self {
            id: None,
            name: CORE_PLUGIN.to_string(),
            version: "0.0.0".to_string(),
            installed_at: None,
        }
    }
}

/// Record about to be persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPluginRecord {
    pub name: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_path_marker() {
        assert!(PluginDescriptor::new("./plugins/sawmon-ip").is_local_path());
        assert!(!PluginDescriptor::new("sawmon-ip").is_local_path());
    }

    #[test]
    fn test_descriptor_from_record_keeps_identity() {
        let record = PluginRecord {
            id: Some(7),
            name: "sawmon-http".to_string(),
            version: "0.2.0".to_string(),
            installed_at: None,
        };
        let descriptor = PluginDescriptor::from(&record);
        assert_eq!(descriptor.id, Some(7));
        assert_eq!(descriptor.version.as_deref(), Some("0.2.0"));
    }
}
