//! Catalog of plugin packages compiled into the binary
//!
//! Registry installs resolve against this catalog instead of fetching code:
//! every entry carries a manifest and a factory producing the module.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::manifest::PluginManifest;
use crate::application::errors::PluginError;
use crate::domain::entities::{PluginDescriptor, PluginModule};
use crate::domain::traits::{ComponentProvider, LoadedModule, PluginLocation};

/// Builds a fresh module instance
pub type ModuleFactory = Arc<dyn Fn() -> PluginModule + Send + Sync>;

/// A package available for installation
pub struct CatalogEntry {
    pub manifest: PluginManifest,
    factory: ModuleFactory,
}

impl std::fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogEntry")
            .field("manifest", &self.manifest)
            .finish()
    }
}

/// Packages keyed by name
#[derive(Default)]
pub struct Catalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_package<F>(mut self, manifest: PluginManifest, factory: F) -> Self
    where
        F: Fn() -> PluginModule + Send + Sync + 'static,
    {
        self.entries.insert(
            manifest.name.clone(),
            CatalogEntry {
                manifest,
                factory: Arc::new(factory),
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.get(name)
    }

    pub fn manifests(&self) -> Vec<&PluginManifest> {
        self.entries.values().map(|e| &e.manifest).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ComponentProvider for Catalog {
    async fn install(&self, descriptor: &PluginDescriptor) -> Result<PluginLocation, PluginError> {
        let entry = self
            .get(&descriptor.name)
            .ok_or_else(|| PluginError::installation(&descriptor.name, "No such package in catalog"))?;

        if let Some(requirement) = &descriptor.version {
            entry
                .manifest
                .satisfies(requirement)
                .map_err(|reason| PluginError::installation(&descriptor.name, reason))?;
        }

        Ok(PluginLocation::Registry {
            name: entry.manifest.name.clone(),
            version: entry.manifest.version.clone(),
        })
    }

    async fn load(&self, location: &PluginLocation) -> Result<LoadedModule, PluginError> {
        let PluginLocation::Registry { name, .. } = location else {
            return Err(PluginError::load(location.name(), "Not a catalog package"));
        };
        let entry = self
            .get(name)
            .ok_or_else(|| PluginError::load(name, "Package disappeared from catalog"))?;

        Ok(LoadedModule::new((entry.factory)(), entry.manifest.version.clone()))
    }
}
