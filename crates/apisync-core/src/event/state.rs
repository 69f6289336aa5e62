//! Artifact version lifecycle states.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

/// Lifecycle state of an artifact version as reported by the registry.
///
/// Parsing never fails: states this crate does not know about are kept
/// verbatim in [`VersionState::Other`] and treated as not enabled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString)]
#[derive(Serialize, Deserialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(into = "String", from = "String")]
pub enum VersionState {
    /// The version is live and policies should exist for it.
    Enabled,
    /// The version has been switched off.
    Disabled,
    /// The version is still served but scheduled for removal.
    Deprecated,
    /// The version is not yet published.
    Draft,
    /// Any state not listed above.
    #[strum(default)]
    Other(String),
}

impl VersionState {
    /// Returns true for [`VersionState::Enabled`].
    #[inline]
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled)
    }
}

impl fmt::Display for VersionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Enabled => "ENABLED",
            Self::Disabled => "DISABLED",
            Self::Deprecated => "DEPRECATED",
            Self::Draft => "DRAFT",
            Self::Other(raw) => raw,
        };
        f.write_str(name)
    }
}

impl From<String> for VersionState {
    fn from(value: String) -> Self {
        match Self::from_str(&value) {
            Ok(state) => state,
            Err(_) => Self::Other(value),
        }
    }
}

impl From<VersionState> for String {
    fn from(value: VersionState) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_states() {
        assert_eq!(VersionState::from("ENABLED".to_owned()), VersionState::Enabled);
        assert_eq!(VersionState::from("DISABLED".to_owned()), VersionState::Disabled);
        assert_eq!(
            VersionState::from("DEPRECATED".to_owned()),
            VersionState::Deprecated
        );
        assert_eq!(VersionState::from("DRAFT".to_owned()), VersionState::Draft);
    }

    #[test]
    fn test_parse_unknown_state() {
        let state = VersionState::from("ARCHIVED".to_owned());
        assert_eq!(state, VersionState::Other("ARCHIVED".to_owned()));
        assert!(!state.is_enabled());
        assert_eq!(state.to_string(), "ARCHIVED");
    }

    #[test]
    fn test_state_is_case_sensitive() {
        assert!(!VersionState::from("enabled".to_owned()).is_enabled());
    }

    #[test]
    fn test_serde_roundtrip_through_string() {
        let state: VersionState = serde_json::from_str("\"ENABLED\"").unwrap();
        assert!(state.is_enabled());
        assert_eq!(serde_json::to_string(&state).unwrap(), "\"ENABLED\"");
    }
}
