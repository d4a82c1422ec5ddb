//! The Terraform Registry module endpoints.
//!
//! Implements the module listing, search, version listing, and download
//! operations of the [registry API], mounted under the base path the
//! discovery document advertises.
//!
//! [registry API]: https://developer.hashicorp.com/terraform/registry/api-docs

use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use record_store::{ModuleName, ModuleRecord};
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};
use crate::store::RegistryStore;

/// Router for the module endpoints, relative to the API base path.
pub(crate) fn router() -> Router<RegistryStore> {
    Router::new()
        .route("/", get(list_all))
        .route("/search", get(search))
        .route("/{namespace}", get(list_namespace))
        .route("/{namespace}/{name}", get(latest_all_providers))
        .route("/{namespace}/{name}/{provider}", get(latest_for_provider))
        .route("/{namespace}/{name}/{provider}/versions", get(list_versions))
        .route("/{namespace}/{name}/{provider}/download", get(download_latest))
        .route("/{namespace}/{name}/{provider}/{version}", get(get_module))
        .route(
            "/{namespace}/{name}/{provider}/{version}/download",
            get(download),
        )
}

/// Query parameters accepted by the list and search endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SearchParams {
    q: String,
    offset: usize,
    limit: Option<usize>,
    provider: Option<String>,
    verified: Option<bool>,
    namespace: Option<String>,
}

/// A module as rendered in API responses.
#[derive(Debug, Serialize)]
struct ModuleView {
    id: String,
    namespace: String,
    name: String,
    provider: String,
    version: String,
    published_at: DateTime<Utc>,
    downloads: u64,
    verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl From<ModuleRecord> for ModuleView {
    fn from(record: ModuleRecord) -> Self {
        ModuleView {
            id: format!("{}/{}", record.name, record.version),
            namespace: record.name.namespace,
            name: record.name.name,
            provider: record.name.provider,
            version: record.version,
            published_at: record.published_at,
            downloads: record.downloads,
            verified: record.verified.unwrap_or(false),
            owner: record.owner,
            description: record.description,
            source: record.source,
        }
    }
}

/// Pagination metadata for list responses.
#[derive(Debug, Serialize)]
struct Meta {
    limit: usize,
    current_offset: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_offset: Option<usize>,
}

/// A paginated module listing.
#[derive(Debug, Serialize)]
pub(crate) struct ModuleList {
    meta: Meta,
    modules: Vec<ModuleView>,
}

/// The version listing response.
#[derive(Debug, Serialize)]
struct VersionsResponse {
    modules: Vec<ModuleVersions>,
}

#[derive(Debug, Serialize)]
struct ModuleVersions {
    source: String,
    versions: Vec<VersionItem>,
}

#[derive(Debug, Serialize)]
struct VersionItem {
    version: String,
}

/// List all modules in the registry
///
/// Also routed directly for the trailing-slash form of the base path,
/// which the nested router's `/` route does not match.
pub(crate) async fn list_all(
    State(store): State<RegistryStore>,
    Query(mut params): Query<SearchParams>,
) -> RegistryResult<Json<ModuleList>> {
    params.q = "*".to_string();
    search_records(&store, params).await
}

/// List all modules in the given namespace
async fn list_namespace(
    State(store): State<RegistryStore>,
    Path(namespace): Path<String>,
    Query(mut params): Query<SearchParams>,
) -> RegistryResult<Json<ModuleList>> {
    params.q = "*".to_string();
    params.namespace = Some(namespace);
    search_records(&store, params).await
}

/// Search for modules in the registry
async fn search(
    State(store): State<RegistryStore>,
    Query(params): Query<SearchParams>,
) -> RegistryResult<Json<ModuleList>> {
    search_records(&store, params).await
}

/// List the latest version of a module for every provider
async fn latest_all_providers(
    State(store): State<RegistryStore>,
    Path((namespace, name)): Path<(String, String)>,
    Query(params): Query<SearchParams>,
) -> RegistryResult<Json<ModuleList>> {
    let mut modules = store.latest_modules().await?;
    modules.retain(|record| record.name.namespace == namespace && record.name.name == name);
    Ok(Json(paginate(&store, &params, modules)))
}

/// Latest version for a specific module provider
async fn latest_for_provider(
    State(store): State<RegistryStore>,
    Path((namespace, name, provider)): Path<(String, String, String)>,
) -> RegistryResult<Json<ModuleView>> {
    let name = ModuleName::new(namespace, name, provider)?;
    let record = store
        .latest(&name)
        .await?
        .ok_or_else(|| RegistryError::ModuleNotFound(name.to_string()))?;
    Ok(Json(record.into()))
}

/// List available versions for a specific module
async fn list_versions(
    State(store): State<RegistryStore>,
    Path((namespace, name, provider)): Path<(String, String, String)>,
) -> RegistryResult<Json<VersionsResponse>> {
    let name = ModuleName::new(namespace, name, provider)?;
    let records = store.versions(&name).await?;

    let versions = records
        .into_iter()
        .map(|record| VersionItem {
            version: record.version,
        })
        .collect();

    Ok(Json(VersionsResponse {
        modules: vec![ModuleVersions {
            source: name.to_string(),
            versions,
        }],
    }))
}

/// Get a specific module
async fn get_module(
    State(store): State<RegistryStore>,
    Path((namespace, name, provider, version)): Path<(String, String, String, String)>,
) -> RegistryResult<Json<ModuleView>> {
    let name = ModuleName::new(namespace, name, provider)?;
    let record = store.get(&name, &version).await?;
    Ok(Json(record.into()))
}

/// Download the latest version of a module
///
/// Redirects to the pinned download path for the resolved latest version.
/// The redirect target is the current request path with the trailing
/// `/download` segment rewritten to `/{version}/download`, so any mount
/// prefix set by the discovery step is preserved.
async fn download_latest(
    State(store): State<RegistryStore>,
    Path((namespace, name, provider)): Path<(String, String, String)>,
    OriginalUri(uri): OriginalUri,
) -> RegistryResult<Response> {
    let name = ModuleName::new(namespace, name, provider)?;
    let records = store.versions(&name).await?;

    let latest = crate::version::resolve_latest(
        records.iter().map(|record| record.version.as_str()),
    )?
    .ok_or_else(|| RegistryError::ModuleNotFound(name.to_string()))?;

    let location = pin_download_path(uri.path(), &latest.to_string());
    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, location.clone())],
        Html(format!("<a href=\"{location}\">Found</a>.")),
    )
        .into_response())
}

/// Download source code for a specific module version
///
/// A slight misnomer: the response carries no body. The `X-Terraform-Get`
/// header points at the actual module location in go-getter URL format.
async fn download(
    State(store): State<RegistryStore>,
    Path((namespace, name, provider, version)): Path<(String, String, String, String)>,
) -> RegistryResult<Response> {
    let name = ModuleName::new(namespace, name, provider)?;
    let record = store.get(&name, &version).await?;

    if record.getter_url.is_empty() {
        return Err(RegistryError::MissingGetterUrl(format!(
            "{name}/{version}"
        )));
    }

    Ok((
        StatusCode::NO_CONTENT,
        [(
            HeaderName::from_static("x-terraform-get"),
            record.getter_url,
        )],
    )
        .into_response())
}

/// Rewrite a `.../download` request path to pin it to a version.
fn pin_download_path(path: &str, version: &str) -> String {
    match path.strip_suffix("/download") {
        Some(prefix) => format!("{prefix}/{version}/download"),
        // The routes calling this always end in /download.
        None => format!("{path}/{version}/download"),
    }
}

async fn search_records(
    store: &RegistryStore,
    params: SearchParams,
) -> RegistryResult<Json<ModuleList>> {
    let mut modules = store.latest_modules().await?;
    modules.retain(|record| matches(record, &params));
    Ok(Json(paginate(store, &params, modules)))
}

fn paginate(store: &RegistryStore, params: &SearchParams, modules: Vec<ModuleRecord>) -> ModuleList {
    // A zero limit would pin next_offset to the current offset, sending
    // clients that follow it into a loop.
    let limit = match params.limit {
        Some(0) | None => store.page_limit(),
        Some(limit) => limit.min(store.page_limit()),
    };
    let total = modules.len();

    let window = modules
        .into_iter()
        .skip(params.offset)
        .take(limit)
        .map(ModuleView::from)
        .collect();
    let next_offset = (params.offset + limit < total).then(|| params.offset + limit);

    ModuleList {
        meta: Meta {
            limit,
            current_offset: params.offset,
            next_offset,
        },
        modules: window,
    }
}

fn matches(record: &ModuleRecord, params: &SearchParams) -> bool {
    let query = params.q.trim();
    let text_match = query.is_empty() || query == "*" || {
        let query = query.to_lowercase();
        record.name.to_string().to_lowercase().contains(&query)
            || record
                .description
                .as_deref()
                .map_or(false, |description| {
                    description.to_lowercase().contains(&query)
                })
    };

    text_match
        && params
            .namespace
            .as_deref()
            .map_or(true, |namespace| record.name.namespace == namespace)
        && params
            .provider
            .as_deref()
            .map_or(true, |provider| record.name.provider == provider)
        && params
            .verified
            .map_or(true, |verified| record.verified.unwrap_or(false) == verified)
}
