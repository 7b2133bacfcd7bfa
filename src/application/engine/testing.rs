//! Test doubles shared by the engine's unit tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::registry::PluginRegistry;
use crate::application::errors::{PluginError, StorageError};
use crate::domain::entities::{NewPluginRecord, PluginDescriptor, PluginModule, PluginRecord};
use crate::infrastructure::storage::MemoryPluginStore;
use crate::domain::traits::{ComponentProvider, LoadedModule, PluginLocation, PluginStore};

/// Provider serving prepared modules by name
#[derive(Default)]
pub struct FakeProvider {
    modules: HashMap<String, (String, Arc<PluginModule>)>,
    failing: HashSet<String>,
    unloadable: HashSet<String>,
    installs: Arc<Mutex<Vec<PluginDescriptor>>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plugin(mut self, name: &str, version: &str, module: PluginModule) -> Self {
        self.modules
            .insert(name.to_string(), (version.to_string(), Arc::new(module)));
        self
    }

    /// Installation of `name` is rejected.
    pub fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// Installation of `name` succeeds but loading it fails.
    pub fn unloadable(mut self, name: &str) -> Self {
        self.unloadable.insert(name.to_string());
        self
    }

    pub fn installs(&self) -> Arc<Mutex<Vec<PluginDescriptor>>> {
        self.installs.clone()
    }
}

#[async_trait]
impl ComponentProvider for FakeProvider {
    async fn install(&self, descriptor: &PluginDescriptor) -> Result<PluginLocation, PluginError> {
        self.installs.lock().unwrap().push(descriptor.clone());
        if self.failing.contains(&descriptor.name) {
            return Err(PluginError::installation(&descriptor.name, "package rejected"));
        }
        Ok(PluginLocation::Registry {
            name: descriptor.name.clone(),
            version: descriptor.version.clone().unwrap_or_default(),
        })
    }

    async fn load(&self, location: &PluginLocation) -> Result<LoadedModule, PluginError> {
        let name = location.name();
        if self.unloadable.contains(name) {
            return Err(PluginError::load(name, "module missing"));
        }
        let (version, module) = self
            .modules
            .get(name)
            .ok_or_else(|| PluginError::load(name, "unknown module"))?;
        Ok(LoadedModule {
            module: module.clone(),
            version: version.clone(),
            library: None,
        })
    }
}

/// In-memory store whose next `find_all` fails
pub struct FlakyStore {
    offline: AtomicBool,
    records: MemoryPluginStore,
}

impl FlakyStore {
    pub fn failing_once() -> Self {
        Self {
            offline: AtomicBool::new(true),
            records: MemoryPluginStore::new(),
        }
    }
}

#[async_trait]
impl PluginStore for FlakyStore {
    async fn find_all(&self) -> Result<Vec<PluginRecord>, StorageError> {
        if self.offline.swap(false, Ordering::SeqCst) {
            return Err(StorageError::Internal("store offline".to_string()));
        }
        self.records.find_all().await
    }

    async fn find_one(&self, id: i64) -> Result<Option<PluginRecord>, StorageError> {
        self.records.find_one(id).await
    }

    async fn create(&self, record: NewPluginRecord) -> Result<PluginRecord, StorageError> {
        self.records.create(record).await
    }

    async fn delete(&self, id: i64) -> Result<(), StorageError> {
        self.records.delete(id).await
    }
}

pub fn registry_with(store: Arc<dyn PluginStore>, provider: FakeProvider) -> PluginRegistry {
    registry_with_builtin(store, provider, PluginModule::new())
}

pub fn registry_with_builtin(
    store: Arc<dyn PluginStore>,
    provider: FakeProvider,
    builtin: PluginModule,
) -> PluginRegistry {
    PluginRegistry::new(store, Arc::new(provider), builtin)
}

pub async fn seed(store: &Arc<impl PluginStore>, name: &str, version: &str) {
    store
        .create(NewPluginRecord {
            name: name.to_string(),
            version: version.to_string(),
        })
        .await
        .unwrap();
}
