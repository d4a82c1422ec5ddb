//! Error types for the registry service

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use record_store::{InvalidModuleName, StoreError};

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Error types for registry operations
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No version of the module exists
    #[error("Module {0} was not found!")]
    ModuleNotFound(String),

    /// The record exists but carries no artifact location
    #[error("{0} is missing the `getter_url` attribute")]
    MissingGetterUrl(String),

    /// A path segment did not form a valid module name
    #[error(transparent)]
    InvalidName(#[from] InvalidModuleName),

    /// A stored version string is not a valid semantic version. This is a
    /// data-integrity violation, never silently skipped.
    #[error("stored version {version:?} is not a valid semantic version")]
    InvalidStoredVersion {
        /// The offending version string.
        version: String,
        /// The parse failure.
        source: semver::Error,
    },

    /// The record store failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RegistryError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            RegistryError::ModuleNotFound(_) => StatusCode::NOT_FOUND,
            RegistryError::MissingGetterUrl(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RegistryError::InvalidName(_) => StatusCode::BAD_REQUEST,
            RegistryError::InvalidStoredVersion { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            RegistryError::Store(err) if err.is_not_found() => StatusCode::NOT_FOUND,
            RegistryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Terraform Registry protocol error response format
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    errors: Vec<String>,
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(error = %message, "registry request failed");
        }

        let body = ErrorResponse {
            errors: vec![message],
        };

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            RegistryError::ModuleNotFound("a/b/c".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            RegistryError::MissingGetterUrl("a/b/c/1.0.0".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            RegistryError::InvalidStoredVersion {
                version: "oops".into(),
                source: semver::Version::parse("oops").unwrap_err(),
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn store_not_found_maps_to_404() {
        let err = RegistryError::Store(StoreError::not_found("memory", "missing"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn not_found_message_names_the_module() {
        let err = RegistryError::ModuleNotFound("zero-ae/vpc/aws".into());
        assert_eq!(err.to_string(), "Module zero-ae/vpc/aws was not found!");
    }
}
