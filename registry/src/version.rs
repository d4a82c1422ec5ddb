//! Semantic version resolution for "latest" queries.

use semver::Version;

use crate::error::{RegistryError, RegistryResult};

/// Select the latest version among a collection of version strings.
///
/// Returns `Ok(None)` for empty input. Every string must parse as a
/// semantic version; a malformed one is a data-integrity error and fails
/// the whole resolution. Precedence follows the SemVer spec: numeric
/// per-component comparison, pre-releases below their release, build
/// metadata ignored. Equal versions keep the first seen.
pub(crate) fn resolve_latest<'a, I>(versions: I) -> RegistryResult<Option<Version>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut latest: Option<Version> = None;
    for raw in versions {
        let version = Version::parse(raw).map_err(|err| RegistryError::InvalidStoredVersion {
            version: raw.to_string(),
            source: err,
        })?;
        if latest
            .as_ref()
            .map_or(true, |current| version.cmp_precedence(current).is_gt())
        {
            latest = Some(version);
        }
    }
    Ok(latest)
}
