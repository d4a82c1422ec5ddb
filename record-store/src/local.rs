use camino::{Utf8Path, Utf8PathBuf};

use crate::error::{StoreError, StoreErrorKind};
use crate::record::{ModuleName, ModuleRecord};
use crate::Driver;

/// Record store driver that persists each record as a JSON document on the
/// local filesystem, at `<root>/<namespace>/<name>/<provider>/<version>.json`.
#[derive(Debug)]
pub struct LocalStore {
    root: Utf8PathBuf,
}

impl LocalStore {
    /// Create a store rooted at `root`. The directory is not created until
    /// [`Driver::provision`] is called.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn module_dir(&self, name: &ModuleName) -> Utf8PathBuf {
        self.root
            .join(&name.namespace)
            .join(&name.name)
            .join(&name.provider)
    }

    fn record_path(&self, name: &ModuleName, version: &str) -> Utf8PathBuf {
        self.module_dir(name).join(format!("{version}.json"))
    }

    fn io_error(&self, context: &str, err: std::io::Error) -> StoreError {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StoreErrorKind::NotFound,
            _ => StoreErrorKind::Io,
        };
        StoreError::with_source(self.name(), kind, context.to_string(), err)
    }

    async fn read_record(&self, path: &Utf8Path) -> Result<ModuleRecord, StoreError> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|err| self.io_error(&format!("read {path}"), err))?;
        serde_json::from_slice(&data).map_err(|err| {
            StoreError::with_source(
                self.name(),
                StoreErrorKind::Serialization,
                format!("malformed record at {path}"),
                err,
            )
        })
    }

    /// Collect every `.json` entry in a provider directory, in directory
    /// order. A missing directory yields no entries.
    async fn read_module_dir(&self, dir: &Utf8Path) -> Result<Vec<ModuleRecord>, StoreError> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(self.io_error(&format!("read_dir {dir}"), err)),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| self.io_error(&format!("read_dir {dir}"), err))?
        {
            let path = Utf8PathBuf::from_path_buf(entry.path()).map_err(|path| {
                StoreError::new(
                    self.name(),
                    StoreErrorKind::Io,
                    format!("non-UTF-8 path in store: {}", path.display()),
                )
            })?;
            if path.extension() == Some("json") {
                records.push(self.read_record(&path).await?);
            }
        }
        Ok(records)
    }

    async fn subdirectories(&self, dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, StoreError> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(self.io_error(&format!("read_dir {dir}"), err)),
        };

        let mut dirs = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| self.io_error(&format!("read_dir {dir}"), err))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map_err(|err| self.io_error("file_type", err))?
                .is_dir();
            if is_dir {
                let path = Utf8PathBuf::from_path_buf(entry.path()).map_err(|path| {
                    StoreError::new(
                        self.name(),
                        StoreErrorKind::Io,
                        format!("non-UTF-8 path in store: {}", path.display()),
                    )
                })?;
                dirs.push(path);
            }
        }
        Ok(dirs)
    }
}

#[async_trait::async_trait]
impl Driver for LocalStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn get(&self, name: &ModuleName, version: &str) -> Result<ModuleRecord, StoreError> {
        let path = self.record_path(name, version);
        match self.read_record(&path).await {
            Ok(record) => Ok(record),
            Err(err) if err.is_not_found() => Err(StoreError::not_found(
                self.name(),
                format!("Module {name} version {version} was not found"),
            )),
            Err(err) => Err(err),
        }
    }

    async fn query(&self, name: &ModuleName) -> Result<Vec<ModuleRecord>, StoreError> {
        self.read_module_dir(&self.module_dir(name)).await
    }

    async fn scan(&self) -> Result<Vec<ModuleRecord>, StoreError> {
        let mut records = Vec::new();
        for namespace in self.subdirectories(&self.root).await? {
            for name in self.subdirectories(&namespace).await? {
                for provider in self.subdirectories(&name).await? {
                    records.extend(self.read_module_dir(&provider).await?);
                }
            }
        }
        Ok(records)
    }

    async fn put(&self, record: ModuleRecord) -> Result<(), StoreError> {
        let path = self.record_path(&record.name, &record.version);
        tokio::fs::create_dir_all(self.module_dir(&record.name))
            .await
            .map_err(|err| self.io_error("create module directory", err))?;

        let data = serde_json::to_vec_pretty(&record).map_err(|err| {
            StoreError::with_source(
                self.name(),
                StoreErrorKind::Serialization,
                format!("serialize record {}/{}", record.name, record.version),
                err,
            )
        })?;

        tokio::fs::write(&path, data)
            .await
            .map_err(|err| self.io_error(&format!("write {path}"), err))
    }

    async fn delete(&self, name: &ModuleName, version: &str) -> Result<(), StoreError> {
        let path = self.record_path(name, version);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(StoreError::not_found(
                self.name(),
                format!("Module {name} version {version} was not found"),
            )),
            Err(err) => Err(self.io_error(&format!("remove {path}"), err)),
        }
    }

    async fn provision(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|err| self.io_error("create store root", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(version: &str) -> ModuleRecord {
        let name = ModuleName::new("zero-ae", "vpc", "aws").unwrap();
        ModuleRecord::new(name, version, "github.com/zero-ae/terraform-aws-vpc")
    }

    fn test_store() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, LocalStore::new(root.join("store")))
    }

    #[tokio::test]
    async fn record_round_trips_through_disk() {
        let (_dir, store) = test_store();
        store.provision().await.unwrap();

        let mut original = record("1.2.3");
        original.owner = Some("platform".to_string());
        store.put(original.clone()).await.unwrap();

        let name = ModuleName::new("zero-ae", "vpc", "aws").unwrap();
        let found = store.get(&name, "1.2.3").await.unwrap();
        assert_eq!(found, original);
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let (_dir, store) = test_store();
        store.provision().await.unwrap();

        let name = ModuleName::new("zero-ae", "vpc", "aws").unwrap();
        let err = store.get(&name, "9.9.9").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("zero-ae/vpc/aws"));
    }

    #[tokio::test]
    async fn query_and_scan_find_records() {
        let (_dir, store) = test_store();
        store.provision().await.unwrap();

        store.put(record("0.1.0")).await.unwrap();
        store.put(record("0.2.0")).await.unwrap();

        let other = ModuleName::new("acme", "dns", "google").unwrap();
        store
            .put(ModuleRecord::new(other, "1.0.0", "github.com/acme/dns"))
            .await
            .unwrap();

        let name = ModuleName::new("zero-ae", "vpc", "aws").unwrap();
        assert_eq!(store.query(&name).await.unwrap().len(), 2);
        assert_eq!(store.scan().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn provision_is_idempotent() {
        let (_dir, store) = test_store();
        store.provision().await.unwrap();
        store.provision().await.unwrap();
    }
}
