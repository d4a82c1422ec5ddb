//! Store access for the registry service.

use std::collections::BTreeMap;

use record_store::{ModuleName, ModuleRecord, Store};

use crate::error::RegistryResult;
use crate::version;

/// Registry-facing view of the record store.
///
/// Wraps the store handle together with the service's page limit, and
/// layers version resolution on top of the raw store operations.
#[derive(Clone, Debug)]
pub(crate) struct RegistryStore {
    store: Store,
    page_limit: usize,
}

impl RegistryStore {
    /// Create a new registry store.
    pub(crate) fn new(store: Store, page_limit: usize) -> Self {
        Self { store, page_limit }
    }

    /// The default (and maximum) page size for list responses.
    pub(crate) fn page_limit(&self) -> usize {
        self.page_limit
    }

    /// Fetch the record for an exact `(name, version)` pair.
    pub(crate) async fn get(
        &self,
        name: &ModuleName,
        version: &str,
    ) -> RegistryResult<ModuleRecord> {
        Ok(self.store.get(name, version).await?)
    }

    /// Fetch every version of a module, in store order.
    pub(crate) async fn versions(&self, name: &ModuleName) -> RegistryResult<Vec<ModuleRecord>> {
        Ok(self.store.query(name).await?)
    }

    /// Resolve the latest version of a module and return its record.
    ///
    /// `Ok(None)` means the module has no stored versions at all.
    pub(crate) async fn latest(&self, name: &ModuleName) -> RegistryResult<Option<ModuleRecord>> {
        let records = self.store.query(name).await?;
        Ok(Self::pick_latest(records)?)
    }

    /// The latest record of every module in the store, ordered by
    /// canonical module name for stable pagination.
    pub(crate) async fn latest_modules(&self) -> RegistryResult<Vec<ModuleRecord>> {
        let mut by_name: BTreeMap<String, Vec<ModuleRecord>> = BTreeMap::new();
        for record in self.store.scan().await? {
            by_name
                .entry(record.name.to_string())
                .or_default()
                .push(record);
        }

        let mut modules = Vec::with_capacity(by_name.len());
        for records in by_name.into_values() {
            if let Some(record) = Self::pick_latest(records)? {
                modules.push(record);
            }
        }
        Ok(modules)
    }

    fn pick_latest(records: Vec<ModuleRecord>) -> RegistryResult<Option<ModuleRecord>> {
        let Some(latest) =
            version::resolve_latest(records.iter().map(|record| record.version.as_str()))?
        else {
            return Ok(None);
        };
        let latest = latest.to_string();
        Ok(records.into_iter().find(|record| record.version == latest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use record_store::MemoryStore;

    fn record(namespace: &str, name: &str, provider: &str, version: &str) -> ModuleRecord {
        let name = ModuleName::new(namespace, name, provider).unwrap();
        ModuleRecord::new(name, version, "./module")
    }

    async fn seeded() -> RegistryStore {
        let store: Store = MemoryStore::new().into();
        for version in ["0.9.0", "0.10.0", "0.0.0"] {
            store
                .put(record("zero-ae", "vpc", "aws", version))
                .await
                .unwrap();
        }
        store
            .put(record("zero-ae", "vpc", "google", "2.0.0"))
            .await
            .unwrap();
        RegistryStore::new(store, 1000)
    }

    #[tokio::test]
    async fn latest_resolves_numerically() {
        let store = seeded().await;
        let name = ModuleName::new("zero-ae", "vpc", "aws").unwrap();
        let latest = store.latest(&name).await.unwrap().unwrap();
        assert_eq!(latest.version, "0.10.0");
    }

    #[tokio::test]
    async fn latest_of_unknown_module_is_none() {
        let store = seeded().await;
        let name = ModuleName::new("nobody", "nothing", "aws").unwrap();
        assert!(store.latest(&name).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn latest_modules_collapses_versions() {
        let store = seeded().await;
        let modules = store.latest_modules().await.unwrap();
        assert_eq!(modules.len(), 2);
        // BTreeMap ordering: zero-ae/vpc/aws before zero-ae/vpc/google.
        assert_eq!(modules[0].version, "0.10.0");
        assert_eq!(modules[1].version, "2.0.0");
    }
}
