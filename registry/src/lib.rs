//! # Terraform Module Registry
//!
//! This crate implements a Terraform-compatible module registry server
//! following the [Terraform Registry protocol], including the
//! [remote service discovery] convention.
//!
//! ## Features
//!
//! - Module listing, search, and version listing
//! - Semantic-version resolution for "latest" queries
//! - The two-step download indirection (302 to a pinned version, then a
//!   `204` carrying the `X-Terraform-Get` artifact location)
//! - Pluggable persistence via the `record-store` crate
//! - Builder pattern for configuration
//!
//! ## Example
//!
//! ```no_run
//! use record_store::{MemoryStore, Store};
//! use terraform_registry::RegistryBuilder;
//!
//! # fn example() {
//! let store: Store = MemoryStore::new().into();
//! let registry = RegistryBuilder::new()
//!     .store(store)
//!     .base_path("/v1")
//!     .build();
//!
//! // Use the registry service with axum or any tower-compatible server
//! # }
//! ```
//!
//! [Terraform Registry protocol]: https://developer.hashicorp.com/terraform/registry/api-docs
//! [remote service discovery]: https://developer.hashicorp.com/terraform/internals/remote-service-discovery

mod api;
#[cfg(feature = "cli")]
pub mod config;
mod error;
mod modules;
mod store;
mod version;

pub use api::RegistryBuilder;
pub use error::{RegistryError, RegistryResult};
