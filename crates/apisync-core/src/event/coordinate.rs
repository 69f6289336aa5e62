//! Artifact coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Group used by the registry when an event carries no `groupId`.
pub const DEFAULT_GROUP: &str = "default";

/// Identifies an artifact, or one version of it, inside the registry.
///
/// Every segment is guaranteed to be a single safe path component, so a
/// coordinate can be joined onto a directory without escaping it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "CoordinateParts")]
pub struct ArtifactCoordinate {
    group: String,
    artifact_id: String,
    version: Option<String>,
}

impl ArtifactCoordinate {
    /// Creates an artifact-level coordinate.
    pub fn artifact(group: impl Into<String>, artifact_id: impl Into<String>) -> Result<Self> {
        let group = group.into();
        let artifact_id = artifact_id.into();
        validate_segment("groupId", &group)?;
        validate_segment("artifactId", &artifact_id)?;

        Ok(Self {
            group,
            artifact_id,
            version: None,
        })
    }

    /// Creates a version-level coordinate.
    pub fn version(
        group: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self> {
        Self::artifact(group, artifact_id)?.with_version(version)
    }

    /// Returns a copy of this coordinate pinned to the given version.
    pub fn with_version(mut self, version: impl Into<String>) -> Result<Self> {
        let version = version.into();
        validate_segment("version", &version)?;
        self.version = Some(version);
        Ok(self)
    }

    /// Returns the registry group.
    #[inline]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Returns the artifact identifier.
    #[inline]
    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    /// Returns the version, if this is a version-level coordinate.
    #[inline]
    pub fn version_id(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Returns the version or a decode error naming the coordinate.
    pub fn require_version(&self) -> Result<&str> {
        self.version.as_deref().ok_or_else(|| {
            Error::decode()
                .with_message("version is required for version-level events")
                .with_context(self.to_string())
        })
    }
}

/// Unvalidated wire form of [`ArtifactCoordinate`].
#[derive(Deserialize)]
struct CoordinateParts {
    group: String,
    artifact_id: String,
    #[serde(default)]
    version: Option<String>,
}

impl TryFrom<CoordinateParts> for ArtifactCoordinate {
    type Error = Error;

    fn try_from(parts: CoordinateParts) -> Result<Self> {
        let coordinate = Self::artifact(parts.group, parts.artifact_id)?;
        match parts.version {
            Some(version) => coordinate.with_version(version),
            None => Ok(coordinate),
        }
    }
}

impl fmt::Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}/{}/{}", self.group, self.artifact_id, version),
            None => write!(f, "{}/{}", self.group, self.artifact_id),
        }
    }
}

/// Rejects identifiers that would not map onto exactly one directory.
fn validate_segment(field: &'static str, value: &str) -> Result<()> {
    let unsafe_segment = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\', '\0']);

    if unsafe_segment {
        return Err(Error::decode()
            .with_message(format!("{field} is not a valid path segment"))
            .with_context(format!("{field}: {value:?}")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_artifact_coordinate() {
        let coordinate = ArtifactCoordinate::artifact("shop", "orders-api").unwrap();
        assert_eq!(coordinate.group(), "shop");
        assert_eq!(coordinate.artifact_id(), "orders-api");
        assert_eq!(coordinate.version_id(), None);
        assert_eq!(coordinate.to_string(), "shop/orders-api");
    }

    #[test]
    fn test_version_coordinate() {
        let coordinate = ArtifactCoordinate::version("shop", "orders-api", "1").unwrap();
        assert_eq!(coordinate.version_id(), Some("1"));
        assert_eq!(coordinate.require_version().unwrap(), "1");
        assert_eq!(coordinate.to_string(), "shop/orders-api/1");
    }

    #[test]
    fn test_require_version_on_artifact() {
        let coordinate = ArtifactCoordinate::artifact("shop", "orders-api").unwrap();
        let error = coordinate.require_version().unwrap_err();
        assert_eq!(error.kind, ErrorKind::Decode);
    }

    #[test]
    fn test_rejects_path_traversal() {
        assert!(ArtifactCoordinate::artifact("..", "orders-api").is_err());
        assert!(ArtifactCoordinate::artifact("shop", "a/b").is_err());
        assert!(ArtifactCoordinate::artifact("shop", "").is_err());
        assert!(ArtifactCoordinate::version("shop", "orders-api", ".").is_err());
        assert!(ArtifactCoordinate::version("shop", "orders-api", "1\\2").is_err());
    }

    #[test]
    fn test_allows_dotted_versions() {
        let coordinate = ArtifactCoordinate::version("shop", "orders-api", "1.2.0").unwrap();
        assert_eq!(coordinate.version_id(), Some("1.2.0"));
    }

    #[test]
    fn test_deserialize_validates_segments() {
        let coordinate: ArtifactCoordinate =
            serde_json::from_str(r#"{"group":"shop","artifact_id":"orders-api","version":"1"}"#)
                .unwrap();
        assert_eq!(coordinate.to_string(), "shop/orders-api/1");

        let traversal = serde_json::from_str::<ArtifactCoordinate>(
            r#"{"group":"..","artifact_id":"orders-api"}"#,
        );
        assert!(traversal.is_err());
    }
}
