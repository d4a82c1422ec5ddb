//! API server builder and the discovery endpoint

use axum::routing::get;
use axum::{Json, Router};
use record_store::Store;
use serde::Serialize;

use crate::store::RegistryStore;

/// Default base path the module API is mounted under.
const DEFAULT_BASE_PATH: &str = "/v1";

/// Default (and maximum) page size for list responses.
const DEFAULT_PAGE_LIMIT: usize = 1000;

/// The service discovery document served at `/.well-known/terraform.json`.
///
/// Terraform clients read `modules.v1` and issue every module API call
/// relative to it, so this value is the single source of truth for the
/// API's mount point.
#[derive(Debug, Clone, Serialize)]
struct DiscoveryDocument {
    #[serde(rename = "modules.v1")]
    modules_v1: String,
}

/// Registry builder for configuring and creating the module registry service
#[derive(Debug)]
pub struct RegistryBuilder {
    store: Option<Store>,
    base_path: String,
    advertise: Option<String>,
    page_limit: usize,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    /// Create a new registry builder
    pub fn new() -> Self {
        Self {
            store: None,
            base_path: DEFAULT_BASE_PATH.to_string(),
            advertise: None,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    /// Set the record store backend
    pub fn store(mut self, store: Store) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the base path the module API is mounted under. Must start with
    /// `/` and must not be `/` itself. Defaults to `/v1`.
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Advertise an absolute URL in the discovery document instead of the
    /// root-relative base path. In production this must be an `https` URL;
    /// the scheme is enforced by the fronting proxy, not here.
    pub fn advertise(mut self, url: impl Into<String>) -> Self {
        self.advertise = Some(url.into());
        self
    }

    /// Set the default and maximum page size for list responses.
    pub fn page_limit(mut self, limit: usize) -> Self {
        self.page_limit = limit;
        self
    }

    /// Build the registry service
    ///
    /// Returns a Router that can be served with any tower-compatible
    /// server. The discovery document and the module API mount point are
    /// derived from the same base path, so clients that follow discovery
    /// always land on the mounted routes.
    pub fn build(self) -> Router {
        let store = self.store.expect("record store must be configured");
        assert!(
            self.base_path.starts_with('/') && self.base_path.len() > 1,
            "base path must start with '/' and must not be the root"
        );

        let discovery = DiscoveryDocument {
            modules_v1: self.advertise.unwrap_or_else(|| self.base_path.clone()),
        };

        Router::new()
            .route(
                "/.well-known/terraform.json",
                get(move || {
                    let document = discovery.clone();
                    async move { Json(document) }
                }),
            )
            .nest(&self.base_path, crate::modules::router())
            // The nested `/` route only matches the bare prefix, so the
            // trailing-slash form of the base path is routed explicitly.
            .route(
                &format!("{}/", self.base_path),
                get(crate::modules::list_all),
            )
            .with_state(RegistryStore::new(store, self.page_limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use record_store::MemoryStore;

    #[test]
    fn test_builder() {
        let store: Store = MemoryStore::new().into();
        let _registry = RegistryBuilder::new()
            .store(store)
            .base_path("/v1")
            .page_limit(50)
            .build();
    }

    #[test]
    fn discovery_document_shape() {
        let document = DiscoveryDocument {
            modules_v1: "/v1".to_string(),
        };
        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(value["modules.v1"], "/v1");
    }

    #[test]
    #[should_panic(expected = "base path")]
    fn root_base_path_is_rejected() {
        let store: Store = MemoryStore::new().into();
        let _registry = RegistryBuilder::new().store(store).base_path("/").build();
    }
}
