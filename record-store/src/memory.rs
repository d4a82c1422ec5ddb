use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::record::{ModuleName, ModuleRecord};
use crate::Driver;

/// Record store driver that keeps every record in memory.
///
/// Versions are held in insertion order per module, which is the order
/// `query` yields them in.
#[derive(Debug, Default)]
pub struct MemoryStore {
    modules: RwLock<HashMap<String, Vec<ModuleRecord>>>,
}

impl MemoryStore {
    /// Create a new, empty `MemoryStore`.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Driver for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, name: &ModuleName, version: &str) -> Result<ModuleRecord, StoreError> {
        let modules = self.modules.read().await;
        modules
            .get(&name.to_string())
            .and_then(|records| records.iter().find(|record| record.version == version))
            .cloned()
            .ok_or_else(|| {
                StoreError::not_found(
                    self.name(),
                    format!("Module {name} version {version} was not found"),
                )
            })
    }

    async fn query(&self, name: &ModuleName) -> Result<Vec<ModuleRecord>, StoreError> {
        let modules = self.modules.read().await;
        Ok(modules.get(&name.to_string()).cloned().unwrap_or_default())
    }

    async fn scan(&self) -> Result<Vec<ModuleRecord>, StoreError> {
        let modules = self.modules.read().await;
        Ok(modules.values().flatten().cloned().collect())
    }

    async fn put(&self, record: ModuleRecord) -> Result<(), StoreError> {
        let mut modules = self.modules.write().await;
        let records = modules.entry(record.name.to_string()).or_default();
        match records
            .iter_mut()
            .find(|existing| existing.version == record.version)
        {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        Ok(())
    }

    async fn delete(&self, name: &ModuleName, version: &str) -> Result<(), StoreError> {
        let mut modules = self.modules.write().await;
        let removed = modules
            .get_mut(&name.to_string())
            .map(|records| {
                let before = records.len();
                records.retain(|record| record.version != version);
                records.len() != before
            })
            .unwrap_or(false);

        if removed {
            Ok(())
        } else {
            Err(StoreError::not_found(
                self.name(),
                format!("Module {name} version {version} was not found"),
            ))
        }
    }

    async fn provision(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(version: &str) -> ModuleRecord {
        let name = ModuleName::new("zero-ae", "vpc", "aws").unwrap();
        ModuleRecord::new(name, version, "github.com/zero-ae/terraform-aws-vpc")
    }

    #[tokio::test]
    async fn put_get_delete() {
        let store = MemoryStore::new();
        let name = ModuleName::new("zero-ae", "vpc", "aws").unwrap();

        store.put(record("1.0.0")).await.unwrap();

        let found = store.get(&name, "1.0.0").await.unwrap();
        assert_eq!(found.version, "1.0.0");

        store.delete(&name, "1.0.0").await.unwrap();
        assert!(store.get(&name, "1.0.0").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn query_preserves_insertion_order() {
        let store = MemoryStore::new();
        let name = ModuleName::new("zero-ae", "vpc", "aws").unwrap();

        for version in ["0.9.0", "0.0.0", "0.10.0"] {
            store.put(record(version)).await.unwrap();
        }

        let versions: Vec<_> = store
            .query(&name)
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.version)
            .collect();
        assert_eq!(versions, ["0.9.0", "0.0.0", "0.10.0"]);
    }

    #[tokio::test]
    async fn query_unknown_module_is_empty() {
        let store = MemoryStore::new();
        let name = ModuleName::new("nobody", "nothing", "aws").unwrap();
        assert!(store.query(&name).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn put_replaces_existing_version() {
        let store = MemoryStore::new();
        let name = ModuleName::new("zero-ae", "vpc", "aws").unwrap();

        store.put(record("1.0.0")).await.unwrap();
        let mut updated = record("1.0.0");
        updated.description = Some("updated".to_string());
        store.put(updated).await.unwrap();

        let records = store.query(&name).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description.as_deref(), Some("updated"));
    }

    #[tokio::test]
    async fn delete_missing_version_is_not_found() {
        let store = MemoryStore::new();
        let name = ModuleName::new("zero-ae", "vpc", "aws").unwrap();
        assert!(store.delete(&name, "1.0.0").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn scan_crosses_modules() {
        let store = MemoryStore::new();
        store.put(record("1.0.0")).await.unwrap();

        let other = ModuleName::new("zero-ae", "vpc", "google").unwrap();
        store
            .put(ModuleRecord::new(other, "2.0.0", "github.com/zero-ae/vpc-google"))
            .await
            .unwrap();

        assert_eq!(store.scan().await.unwrap().len(), 2);
    }
}
