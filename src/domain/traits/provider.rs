use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use libloading::Library;

use crate::application::errors::PluginError;
use crate::domain::entities::{PluginDescriptor, PluginModule};

/// Where an installed plugin can be loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginLocation {
    /// Package compiled into the binary's catalog
    Registry { name: String, version: String },
    /// Plugin directory on the local filesystem
    Local { name: String, path: PathBuf },
}

impl PluginLocation {
    pub fn name(&self) -> &str {
        match self {
            PluginLocation::Registry { name, .. } | PluginLocation::Local { name, .. } => name,
        }
    }
}

/// Module produced by a provider, ready to be wrapped
pub struct LoadedModule {
    pub module: Arc<PluginModule>,
    /// Version read from the installed package's own metadata
    pub version: String,
    /// Shared library the module's code lives in, for native plugins
    pub library: Option<Arc<Library>>,
}

impl LoadedModule {
    pub fn new(module: PluginModule, version: impl Into<String>) -> Self {
        Self {
            module: Arc::new(module),
            version: version.into(),
            library: None,
        }
    }
}

/// Installs plugin packages and loads them through a fixed interface
#[async_trait]
pub trait ComponentProvider: Send + Sync {
    /// Make the described plugin loadable; no partial side effects on failure.
    async fn install(&self, descriptor: &PluginDescriptor) -> Result<PluginLocation, PluginError>;

    async fn load(&self, location: &PluginLocation) -> Result<LoadedModule, PluginError>;
}
