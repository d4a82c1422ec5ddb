//! The record schema: fully qualified module names and the per-version
//! records stored against them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error returned when a module name fails validation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvalidModuleName {
    /// The canonical form did not have exactly three segments.
    #[error("expected namespace/name/provider, got {0:?}")]
    SegmentCount(String),

    /// A field was empty or contained the separator character.
    #[error("module name field `{0}` must be non-empty and must not contain '/'")]
    Field(&'static str),
}

/// A fully qualified module name (FQMN): `namespace/name/provider`.
///
/// Equality is structural. The canonical string form is the three fields
/// joined by `/`, and parsing that form reconstructs an equal value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleName {
    /// The module namespace (e.g. an organization).
    pub namespace: String,
    /// The module name.
    pub name: String,
    /// The module's primary provider.
    pub provider: String,
}

impl ModuleName {
    /// Create a module name, validating each field.
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
    ) -> Result<Self, InvalidModuleName> {
        let module = ModuleName {
            namespace: namespace.into(),
            name: name.into(),
            provider: provider.into(),
        };
        module.validate()?;
        Ok(module)
    }

    /// Check the field invariants: non-empty, no `/`.
    pub fn validate(&self) -> Result<(), InvalidModuleName> {
        for (field, value) in [
            ("namespace", &self.namespace),
            ("name", &self.name),
            ("provider", &self.provider),
        ] {
            if value.is_empty() || value.contains('/') {
                return Err(InvalidModuleName::Field(field));
            }
        }
        Ok(())
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.name, self.provider)
    }
}

impl FromStr for ModuleName {
    type Err = InvalidModuleName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = s.split('/');
        let (Some(namespace), Some(name), Some(provider), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(InvalidModuleName::SegmentCount(s.to_string()));
        };
        ModuleName::new(namespace, name, provider)
    }
}

/// One published version of a module.
///
/// `(name, version)` is the primary key: the store holds at most one
/// record per pair. `getter_url` is the artifact locator in go-getter
/// syntax; `source` is the human-facing repository URL, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRecord {
    /// The fully qualified module name.
    #[serde(flatten)]
    pub name: ModuleName,

    /// The semantic version of this record.
    pub version: String,

    /// Where the module source can be fetched from, in go-getter syntax.
    pub getter_url: String,

    /// When this record was created. Immutable after creation.
    pub published_at: DateTime<Utc>,

    /// Download counter, monotonically non-decreasing.
    #[serde(default)]
    pub downloads: u64,

    /// Whether the module is verified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,

    /// The owning user or team.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// A short human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The human-facing repository URL, distinct from `getter_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ModuleRecord {
    /// Create a record with `published_at` set to now and all optional
    /// metadata unset.
    pub fn new(
        name: ModuleName,
        version: impl Into<String>,
        getter_url: impl Into<String>,
    ) -> Self {
        ModuleRecord {
            name,
            version: version.into(),
            getter_url: getter_url.into(),
            published_at: Utc::now(),
            downloads: 0,
            verified: None,
            owner: None,
            description: None,
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_display_round_trips() {
        let name = ModuleName::new("zero-ae", "vpc", "aws").unwrap();
        let parsed: ModuleName = name.to_string().parse().unwrap();
        assert_eq!(parsed, name);
    }

    #[test]
    fn name_rejects_empty_fields() {
        assert_eq!(
            ModuleName::new("", "vpc", "aws"),
            Err(InvalidModuleName::Field("namespace"))
        );
        assert_eq!(
            ModuleName::new("zero-ae", "vpc", ""),
            Err(InvalidModuleName::Field("provider"))
        );
    }

    #[test]
    fn name_rejects_separator_in_field() {
        assert_eq!(
            ModuleName::new("zero-ae", "vpc/extra", "aws"),
            Err(InvalidModuleName::Field("name"))
        );
    }

    #[test]
    fn name_parse_requires_three_segments() {
        assert!("zero-ae/vpc".parse::<ModuleName>().is_err());
        assert!("zero-ae/vpc/aws/extra".parse::<ModuleName>().is_err());
        assert!("zero-ae//aws".parse::<ModuleName>().is_err());
    }

    #[test]
    fn record_serde_round_trips() {
        let name = ModuleName::new("zero-ae", "vpc", "aws").unwrap();
        let mut record = ModuleRecord::new(name, "1.0.0", "github.com/zero-ae/vpc");
        record.description = Some("A VPC module".to_string());

        let json = serde_json::to_string(&record).unwrap();
        let parsed: ModuleRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn record_serde_flattens_name() {
        let name = ModuleName::new("zero-ae", "vpc", "aws").unwrap();
        let record = ModuleRecord::new(name, "1.0.0", "github.com/zero-ae/vpc");

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["namespace"], "zero-ae");
        assert_eq!(value["provider"], "aws");
        assert!(value.get("owner").is_none());
    }
}
