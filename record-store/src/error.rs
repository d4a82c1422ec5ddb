//! The store error type shared by every backend.

use std::error::Error as StdError;
use std::fmt;

use tracing_error::SpanTrace;

/// Categorizes store errors by their semantic meaning, independent of the
/// backend implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// The requested record (or module) does not exist.
    NotFound,

    /// The record failed validation before being written.
    InvalidRecord,

    /// A persisted record could not be (de)serialized.
    Serialization,

    /// The backend failed with an I/O error.
    Io,

    /// An unexpected or uncategorized error.
    Other,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreErrorKind::NotFound => write!(f, "not found"),
            StoreErrorKind::InvalidRecord => write!(f, "invalid record"),
            StoreErrorKind::Serialization => write!(f, "serialization error"),
            StoreErrorKind::Io => write!(f, "I/O error"),
            StoreErrorKind::Other => write!(f, "other error"),
        }
    }
}

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// An error from a record store backend.
///
/// Carries the backend name, an error kind for dispatch, a human-readable
/// message, and the span trace at the point of creation.
pub struct StoreError {
    engine: &'static str,
    kind: StoreErrorKind,
    message: String,
    source: Option<BoxError>,
    span_trace: SpanTrace,
}

impl StoreError {
    /// Create a new error with no underlying source.
    #[track_caller]
    pub fn new(engine: &'static str, kind: StoreErrorKind, message: impl Into<String>) -> Self {
        StoreError {
            engine,
            kind,
            message: message.into(),
            source: None,
            span_trace: SpanTrace::capture(),
        }
    }

    /// Create a new error wrapping an underlying source error.
    #[track_caller]
    pub fn with_source(
        engine: &'static str,
        kind: StoreErrorKind,
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        StoreError {
            engine,
            kind,
            message: message.into(),
            source: Some(source.into()),
            span_trace: SpanTrace::capture(),
        }
    }

    /// A `NotFound` error naming the missing record.
    #[track_caller]
    pub fn not_found(engine: &'static str, message: impl Into<String>) -> Self {
        StoreError::new(engine, StoreErrorKind::NotFound, message)
    }

    /// The kind of this error.
    pub fn kind(&self) -> StoreErrorKind {
        self.kind
    }

    /// The backend that produced this error.
    pub fn engine(&self) -> &'static str {
        self.engine
    }

    /// Whether this error means the record does not exist.
    pub fn is_not_found(&self) -> bool {
        self.kind == StoreErrorKind::NotFound
    }

    /// The span trace captured when the error was created.
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreError")
            .field("engine", &self.engine)
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("source", &self.source)
            .finish()
    }
}

impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_deref().map(|err| err as _)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_dispatchable() {
        let err = StoreError::not_found("memory", "Module a/b/c version 1.0.0 was not found");
        assert!(err.is_not_found());
        assert_eq!(err.kind(), StoreErrorKind::NotFound);
        assert_eq!(err.to_string(), "Module a/b/c version 1.0.0 was not found");
    }

    #[test]
    fn source_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StoreError::with_source("local", StoreErrorKind::Io, "write failed", io);
        assert!(err.source().is_some());
        assert!(!err.is_not_found());
    }
}
