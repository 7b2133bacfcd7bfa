//! In-memory plugin record storage

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::application::errors::StorageError;
use crate::domain::entities::{NewPluginRecord, PluginRecord};
use crate::domain::traits::PluginStore;

/// Plugin store kept in memory; contents are lost on exit
#[derive(Default)]
pub struct MemoryPluginStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    records: BTreeMap<i64, PluginRecord>,
}

impl MemoryPluginStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PluginStore for MemoryPluginStore {
    async fn find_all(&self) -> Result<Vec<PluginRecord>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner.records.values().cloned().collect())
    }

    async fn find_one(&self, id: i64) -> Result<Option<PluginRecord>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner.records.get(&id).cloned())
    }

    async fn create(&self, record: NewPluginRecord) -> Result<PluginRecord, StorageError> {
        let mut inner = self.inner.write().await;
        if inner.records.values().any(|r| r.name == record.name) {
            return Err(StorageError::Duplicate(record.name));
        }

        inner.next_id += 1;
        let id = inner.next_id;
        let stored = PluginRecord {
            id: Some(id),
            name: record.name,
            version: record.version,
            installed_at: Some(Utc::now().to_rfc3339()),
        };
        inner.records.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: i64) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        inner
            .records
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_record(name: &str) -> NewPluginRecord {
        NewPluginRecord {
            name: name.to_string(),
            version: "1.0.0".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_ids() {
        let store = MemoryPluginStore::new();
        let first = store.create(new_record("a")).await.unwrap();
        let second = store.create(new_record("b")).await.unwrap();
        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert!(first.installed_at.is_some());
        assert_eq!(store.find_all().await.unwrap().len(), 2);
        assert_eq!(store.find_one(2).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_names_are_unique() {
        let store = MemoryPluginStore::new();
        store.create(new_record("a")).await.unwrap();
        assert!(matches!(
            store.create(new_record("a")).await,
            Err(StorageError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryPluginStore::new();
        let record = store.create(new_record("a")).await.unwrap();
        let id = record.id.unwrap();

        store.delete(id).await.unwrap();
        assert!(store.find_one(id).await.unwrap().is_none());
        assert!(matches!(store.delete(id).await, Err(StorageError::NotFound(_))));
    }
}
