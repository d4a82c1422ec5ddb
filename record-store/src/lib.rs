//! # Record store
//!
//! Persistence for Terraform module registry records, keyed by fully
//! qualified module name plus version.
//!
//! The [`Driver`] trait is the backend seam; [`MemoryStore`] keeps records
//! in process memory and [`LocalStore`] persists them as JSON documents on
//! disk. [`Store`] is the cloneable handle the registry service consumes:
//! it validates records before writes and instruments every operation.
//!
//! ## Example
//!
//! ```no_run
//! use record_store::{MemoryStore, ModuleName, ModuleRecord, Store};
//!
//! # async fn example() -> Result<(), record_store::StoreError> {
//! let store: Store = MemoryStore::new().into();
//!
//! let name = ModuleName::new("zero-ae", "vpc", "aws")?;
//! store
//!     .put(ModuleRecord::new(name.clone(), "1.0.0", "github.com/zero-ae/terraform-aws-vpc"))
//!     .await?;
//!
//! let versions = store.query(&name).await?;
//! assert_eq!(versions.len(), 1);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use camino::Utf8PathBuf;
use serde::Deserialize;

mod error;
mod local;
mod memory;
mod record;

pub use error::{StoreError, StoreErrorKind};
pub use local::LocalStore;
pub use memory::MemoryStore;
pub use record::{InvalidModuleName, ModuleName, ModuleRecord};

impl From<InvalidModuleName> for StoreError {
    fn from(err: InvalidModuleName) -> Self {
        StoreError::with_source("store", StoreErrorKind::InvalidRecord, err.to_string(), err)
    }
}

/// A record store backend.
///
/// `query` and `scan` yield records in backend order; callers that need a
/// particular ordering impose it themselves.
#[async_trait::async_trait]
pub trait Driver: fmt::Debug {
    /// The name of the driver, used in error reports and tracing fields.
    fn name(&self) -> &'static str;

    /// Fetch the record for an exact `(name, version)` pair.
    async fn get(&self, name: &ModuleName, version: &str) -> Result<ModuleRecord, StoreError>;

    /// Fetch every version of a module. Unknown modules yield an empty
    /// sequence, not an error.
    async fn query(&self, name: &ModuleName) -> Result<Vec<ModuleRecord>, StoreError>;

    /// Fetch every record in the store.
    async fn scan(&self) -> Result<Vec<ModuleRecord>, StoreError>;

    /// Write a record, replacing any existing record for the same
    /// `(name, version)` pair.
    async fn put(&self, record: ModuleRecord) -> Result<(), StoreError>;

    /// Delete the record for an exact `(name, version)` pair.
    async fn delete(&self, name: &ModuleName, version: &str) -> Result<(), StoreError>;

    /// Prepare the backend for use (create tables, directories, ...).
    /// Idempotent, and only ever invoked by setup tooling.
    async fn provision(&self) -> Result<(), StoreError>;
}

pub(crate) type ArcDriver = Arc<dyn Driver + Send + Sync>;

/// A cloneable handle to a record store backend.
#[derive(Debug, Clone)]
pub struct Store {
    driver: ArcDriver,
}

impl<D> From<D> for Store
where
    D: Driver + Send + Sync + 'static,
{
    fn from(value: D) -> Self {
        Store::new(value)
    }
}

impl Store {
    /// Wrap a driver in a store handle.
    pub fn new<D: Driver + Send + Sync + 'static>(driver: D) -> Self {
        Self {
            driver: Arc::new(driver),
        }
    }

    /// The name of the underlying driver.
    pub fn name(&self) -> &str {
        self.driver.name()
    }

    /// Fetch the record for an exact `(name, version)` pair.
    #[tracing::instrument(skip(self), fields(driver = self.driver.name(), %name))]
    pub async fn get(&self, name: &ModuleName, version: &str) -> Result<ModuleRecord, StoreError> {
        self.driver.get(name, version).await
    }

    /// Fetch every version of a module, in backend order.
    #[tracing::instrument(skip(self), fields(driver = self.driver.name(), %name))]
    pub async fn query(&self, name: &ModuleName) -> Result<Vec<ModuleRecord>, StoreError> {
        self.driver.query(name).await
    }

    /// Fetch every record in the store.
    #[tracing::instrument(skip(self), fields(driver = self.driver.name()))]
    pub async fn scan(&self) -> Result<Vec<ModuleRecord>, StoreError> {
        self.driver.scan().await
    }

    /// Validate and write a record.
    ///
    /// Rejects records whose name fails its invariants, whose version is
    /// not a semantic version, or whose `getter_url` is empty. The stored
    /// record replaces any existing record for the same pair.
    #[tracing::instrument(skip(self, record), fields(driver = self.driver.name(), name = %record.name, version = record.version))]
    pub async fn put(&self, record: ModuleRecord) -> Result<(), StoreError> {
        record.name.validate()?;
        semver::Version::from_str(&record.version).map_err(|err| {
            StoreError::with_source(
                self.driver.name(),
                StoreErrorKind::InvalidRecord,
                format!("version {:?} is not a semantic version", record.version),
                err,
            )
        })?;
        if record.getter_url.is_empty() {
            return Err(StoreError::new(
                self.driver.name(),
                StoreErrorKind::InvalidRecord,
                format!(
                    "record {}/{} is missing a getter URL",
                    record.name, record.version
                ),
            ));
        }

        self.driver.put(record).await
    }

    /// Delete the record for an exact `(name, version)` pair.
    #[tracing::instrument(skip(self), fields(driver = self.driver.name(), %name))]
    pub async fn delete(&self, name: &ModuleName, version: &str) -> Result<(), StoreError> {
        self.driver.delete(name, version).await
    }

    /// Prepare the backend for use. Idempotent.
    #[tracing::instrument(skip(self), fields(driver = self.driver.name()))]
    pub async fn provision(&self) -> Result<(), StoreError> {
        self.driver.provision().await
    }
}

/// Configuration for a record store backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreConfig {
    /// In-memory records, lost on shutdown.
    Memory,

    /// JSON documents under the given root directory.
    Local {
        /// The root directory for stored records.
        path: Utf8PathBuf,
    },
}

impl StoreConfig {
    /// Build a store handle from this configuration.
    #[tracing::instrument]
    pub fn build(self) -> Store {
        match self {
            StoreConfig::Memory => MemoryStore::new().into(),
            StoreConfig::Local { path } => LocalStore::new(path).into(),
        }
    }
}
