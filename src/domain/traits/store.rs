use async_trait::async_trait;
use crate::application::errors::StorageError;
use crate::domain::entities::{NewPluginRecord, PluginRecord};

/// Store trait - durable table of installed plugins
#[async_trait]
pub trait PluginStore: Send + Sync {
    async fn find_all(&self) -> Result<Vec<PluginRecord>, StorageError>;
    async fn find_one(&self, id: i64) -> Result<Option<PluginRecord>, StorageError>;

    /// Persist a record; names are unique.
    async fn create(&self, record: NewPluginRecord) -> Result<PluginRecord, StorageError>;
    async fn delete(&self, id: i64) -> Result<(), StorageError>;
}
