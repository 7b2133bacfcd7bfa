//! Native plugin loader - loads local plugins from shared libraries

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use libloading::{Library, Symbol};

use super::manifest::{PluginManifest, MANIFEST_FILE};
use crate::application::errors::PluginError;
use crate::domain::entities::{PluginDescriptor, PluginModule};
use crate::domain::traits::{ComponentProvider, LoadedModule, PluginLocation};

/// Symbol every native plugin exports
pub const INIT_SYMBOL: &[u8] = b"sawmon_plugin_init";

/// Function signature for plugin initialization.
///
/// Returns a `Box<PluginModule>` turned into a raw pointer, or null on failure.
pub type PluginInitFn = unsafe extern "C" fn() -> *mut PluginModule;

/// Loads plugins that live in directories on the local filesystem
pub struct NativeLoader {
    plugin_dir: PathBuf,
}

impl NativeLoader {
    pub fn new(plugin_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugin_dir: plugin_dir.into(),
        }
    }

    /// Directory of a local plugin named by a relative path like `./plugins/ip`.
    pub fn resolve(&self, name: &str) -> PathBuf {
        self.plugin_dir.join(name)
    }

    fn check(&self, descriptor: &PluginDescriptor) -> Result<PathBuf, String> {
        let path = self.resolve(&descriptor.name);
        if !path.is_dir() {
            return Err(format!("Plugin directory not found: {}", path.display()));
        }

        let manifest_path = path.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Err(format!("Missing {} in {}", MANIFEST_FILE, path.display()));
        }
        let manifest = PluginManifest::from_file(&manifest_path).map_err(|e| e.to_string())?;

        if let Some(requirement) = &descriptor.version {
            manifest.satisfies(requirement)?;
        }

        let library_path = manifest.library_path(&path);
        if !library_path.exists() {
            return Err(format!("Library not found: {}", library_path.display()));
        }

        Ok(path)
    }

    fn load_from(&self, name: &str, path: &Path) -> Result<LoadedModule, PluginError> {
        let manifest = PluginManifest::from_file(path.join(MANIFEST_FILE))?;
        let library_path = manifest.library_path(path);

        // Load the library
        let library = unsafe {
            Library::new(&library_path)
                .map_err(|e| PluginError::load(name, format!("Failed to load library: {}", e)))?
        };

        // Get the init function
        let module = unsafe {
            let init_fn: Symbol<PluginInitFn> = library
                .get(INIT_SYMBOL)
                .map_err(|e| PluginError::load(name, format!("Failed to find init function: {}", e)))?;

            let module_ptr = init_fn();
            if module_ptr.is_null() {
                return Err(PluginError::load(name, "Plugin init returned null"));
            }
            Box::from_raw(module_ptr)
        };

        tracing::info!("Loaded native plugin: {} v{}", manifest.name, manifest.version);

        Ok(LoadedModule {
            module: Arc::new(*module),
            version: manifest.version,
            library: Some(Arc::new(library)),
        })
    }
}

#[async_trait]
impl ComponentProvider for NativeLoader {
    async fn install(&self, descriptor: &PluginDescriptor) -> Result<PluginLocation, PluginError> {
        let path = self
            .check(descriptor)
            .map_err(|reason| PluginError::installation(&descriptor.name, reason))?;

        Ok(PluginLocation::Local {
            name: descriptor.name.clone(),
            path,
        })
    }

    async fn load(&self, location: &PluginLocation) -> Result<LoadedModule, PluginError> {
        match location {
            PluginLocation::Local { name, path } => self.load_from(name, path),
            PluginLocation::Registry { name, .. } => {
                Err(PluginError::load(name, "Not a local plugin"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_directory_is_installation_failure() {
        let loader = NativeLoader::new("/nonexistent/sawmon");
        let mut descriptor = PluginDescriptor::new("./plugins/sawmon-ip");
        descriptor.local_install = true;

        let result = loader.install(&descriptor).await;
        assert!(matches!(result, Err(PluginError::InstallationFailure { .. })));
    }

    #[tokio::test]
    async fn test_registry_location_rejected() {
        let loader = NativeLoader::new(".");
        let location = PluginLocation::Registry {
            name: "sawmon-ip".to_string(),
            version: "0.1.0".to_string(),
        };
        assert!(matches!(
            loader.load(&location).await,
            Err(PluginError::LoadFailure { .. })
        ));
    }

    #[test]
    fn test_resolve_relative_to_plugin_dir() {
        let loader = NativeLoader::new("/srv/sawmon");
        assert_eq!(
            loader.resolve("./plugins/sawmon-ip"),
            Path::new("/srv/sawmon/./plugins/sawmon-ip")
        );
    }
}
