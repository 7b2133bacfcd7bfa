//! Plugin registry - loaded plugins and their install/remove lifecycle

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use libloading::Library;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::ordering::{self, Dependent};
use crate::application::errors::PluginError;
use crate::domain::entities::{NewPluginRecord, PluginDescriptor, PluginModule, PluginRecord};
use crate::domain::traits::{ComponentProvider, LoadedModule, PluginStore};

/// Loaded plugin paired with its record
#[derive(Clone)]
pub struct PluginWrapper {
    module: Arc<PluginModule>,
    record: PluginRecord,
    // Must stay after `module`: fields drop in declaration order.
    library: Option<Arc<Library>>,
}

impl PluginWrapper {
    pub fn new(loaded: LoadedModule, record: PluginRecord) -> Self {
        Self {
            module: loaded.module,
            record,
            library: loaded.library,
        }
    }

    fn builtin(module: Arc<PluginModule>) -> Self {
        Self {
            module,
            record: PluginRecord::builtin(),
            library: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn module(&self) -> &PluginModule {
        &self.module
    }

    pub fn record(&self) -> &PluginRecord {
        &self.record
    }

    pub fn is_native(&self) -> bool {
        self.library.is_some()
    }
}

impl Dependent for PluginWrapper {
    fn name(&self) -> &str {
        &self.record.name
    }

    fn dependencies(&self) -> &[String] {
        self.module.dependencies()
    }
}

impl std::fmt::Debug for PluginWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginWrapper")
            .field("record", &self.record)
            .field("module", &self.module)
            .field("native", &self.is_native())
            .finish()
    }
}

/// Installation attempt that failed during `initialize`
#[derive(Debug, Clone, Serialize)]
pub struct InstallFailure {
    pub name: String,
    pub error: String,
}

/// Result of loading every stored plugin at startup
#[derive(Debug, Clone, Default, Serialize)]
pub struct InitReport {
    pub installed: Vec<PluginRecord>,
    pub failed: Vec<InstallFailure>,
}

/// Registry of loaded plugins
pub struct PluginRegistry {
    plugins: RwLock<Vec<PluginWrapper>>,
    builtin: Arc<PluginModule>,
    store: Arc<dyn PluginStore>,
    provider: Arc<dyn ComponentProvider>,
    initialized: AtomicBool,
    pub(super) operation_timeout: Option<Duration>,
}

impl PluginRegistry {
    pub fn new(
        store: Arc<dyn PluginStore>,
        provider: Arc<dyn ComponentProvider>,
        builtin: PluginModule,
    ) -> Self {
        Self {
            plugins: RwLock::new(Vec::new()),
            builtin: Arc::new(builtin),
            store,
            provider,
            initialized: AtomicBool::new(false),
            operation_timeout: None,
        }
    }

    /// Deadline applied to every operation started by `run`.
    pub fn with_operation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Seed the built-in plugin and install every stored plugin.
    ///
    /// Stored plugins are installed concurrently. A failed installation is
    /// logged and listed in the report; it never fails the whole call.
    pub async fn initialize(&self) -> Result<InitReport, PluginError> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Err(PluginError::AlreadyInitialized);
        }

        info!("Initializing plugin registry");
        self.plugins
            .write()
            .await
            .push(PluginWrapper::builtin(Arc::clone(&self.builtin)));

        debug!("Finding stored plugins");
        let records = match self.store.find_all().await {
            Ok(records) => records,
            Err(e) => {
                self.plugins.write().await.retain(|p| p.record.id.is_some());
                self.initialized.store(false, Ordering::SeqCst);
                return Err(e.into());
            }
        };

        info!("Installing {} stored plugins", records.len());
        let attempts = records.into_iter().map(|record| async move {
            let name = record.name.clone();
            let descriptor = PluginDescriptor::from(&record);
            let result = self.register(descriptor, Some(record)).await;
            if let Err(e) = &result {
                error!("Failed installing plugin {}: {}", name, e);
            }
            (name, result)
        });

        let mut report = InitReport::default();
        for (name, result) in join_all(attempts).await {
            match result {
                Ok(record) => report.installed.push(record),
                Err(e) => report.failed.push(InstallFailure {
                    name,
                    error: e.to_string(),
                }),
            }
        }

        info!(
            "Plugin registry ready: {} installed, {} failed",
            report.installed.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Install a plugin and register it.
    ///
    /// A descriptor without an id is a new plugin: its record is created with
    /// the version the installed package reports. Failures are logged and
    /// returned; the registry and the store are left untouched.
    pub async fn add_plugin(&self, descriptor: PluginDescriptor) -> Result<PluginRecord, PluginError> {
        let name = descriptor.name.clone();
        self.register(descriptor, None)
            .await
            .inspect_err(|e| error!("Failed installing plugin {}: {}", name, e))
    }

    async fn register(
        &self,
        mut descriptor: PluginDescriptor,
        stored: Option<PluginRecord>,
    ) -> Result<PluginRecord, PluginError> {
        if descriptor.is_local_path() {
            descriptor.local_install = true;
        }
        if self.is_registered(&descriptor.name).await {
            return Err(PluginError::AlreadyRegistered(descriptor.name));
        }

        info!("Installing plugin {}", descriptor.name);
        let location = self.provider.install(&descriptor).await?;
        let loaded = self.provider.load(&location).await?;

        let mut plugins = self.plugins.write().await;
        if plugins.iter().any(|p| p.name() == descriptor.name) {
            return Err(PluginError::AlreadyRegistered(descriptor.name));
        }
        ensure_acyclic(&plugins, &descriptor.name, &loaded.module)?;

        let record = match (stored, descriptor.id) {
            (Some(record), _) => record,
            (None, Some(id)) => PluginRecord {
                id: Some(id),
                name: descriptor.name.clone(),
                version: descriptor.version.clone().unwrap_or_else(|| loaded.version.clone()),
                installed_at: None,
            },
            (None, None) => {
                let record = self
                    .store
                    .create(NewPluginRecord {
                        name: descriptor.name.clone(),
                        version: loaded.version.clone(),
                    })
                    .await?;
                debug!("Saved {}", record.name);
                record
            }
        };

        plugins.push(PluginWrapper::new(loaded, record.clone()));
        info!("Installed {} v{}", record.name, record.version);
        Ok(record)
    }

    /// Delete a stored plugin and unregister it, running its teardown hook.
    pub async fn remove_plugin(&self, id: i64) -> Result<PluginRecord, PluginError> {
        let record = self
            .store
            .find_one(id)
            .await?
            .ok_or(PluginError::RecordNotFound(id))?;
        self.store.delete(id).await?;

        let removed = {
            let mut plugins = self.plugins.write().await;
            plugins
                .iter()
                .position(|p| p.record.id == Some(id))
                .map(|index| plugins.remove(index))
        };

        match removed {
            Some(wrapper) => {
                if let Some(teardown) = wrapper.module().teardown() {
                    if let Err(e) = teardown().await {
                        warn!("Teardown of plugin {} failed: {}", record.name, e);
                    }
                }
                info!("Removed plugin {}", record.name);
            }
            None => warn!("Plugin {} was not loaded, removed its record only", record.name),
        }

        Ok(record)
    }

    /// Plugins as recorded in the store.
    pub async fn installed_plugins(&self) -> Result<Vec<PluginRecord>, PluginError> {
        Ok(self.store.find_all().await?)
    }

    pub async fn is_registered(&self, name: &str) -> bool {
        self.plugins.read().await.iter().any(|p| p.name() == name)
    }

    /// Registered plugins in registration order.
    pub async fn snapshot(&self) -> Vec<PluginWrapper> {
        self.plugins.read().await.clone()
    }

    pub async fn names(&self) -> Vec<String> {
        self.plugins
            .read()
            .await
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.plugins.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Refuse a module whose dependencies would close a cycle.
fn ensure_acyclic(
    plugins: &[PluginWrapper],
    name: &str,
    module: &PluginModule,
) -> Result<(), PluginError> {
    let mut candidates: Vec<ordering::Node<'_>> = plugins.iter().map(ordering::Node::of).collect();
    candidates.push(ordering::Node::new(name, module.dependencies()));
    ordering::order(candidates).map(|_| ())
}
