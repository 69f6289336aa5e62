//! Decoding of raw registry notifications into [`LifecycleEvent`]s.
//!
//! Registry notifications are double encoded: the message body is a JSON
//! object whose `payload` field holds another JSON document, usually as a
//! string. Inline objects are accepted as well.

use serde::Deserialize;
use serde_json::Value;

use super::{ArtifactCoordinate, DEFAULT_GROUP, EventKind, LifecycleEvent, VersionState};
use crate::{Error, Result, TRACING_TARGET_DECODE};

/// Event type emitted when a new artifact version is created.
pub const VERSION_CREATED: &str = "ARTIFACT_VERSION_CREATED";
/// Event type emitted when an artifact version changes state.
pub const VERSION_STATE_CHANGED: &str = "ARTIFACT_VERSION_STATE_CHANGED";
/// Event type emitted when an artifact and all its versions are deleted.
pub const ARTIFACT_DELETED: &str = "ARTIFACT_DELETED";
/// Event type emitted when a single artifact version is deleted.
pub const VERSION_DELETED: &str = "ARTIFACT_VERSION_DELETED";

#[derive(Debug, Deserialize)]
struct Envelope {
    payload: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Payload {
    event_type: Option<String>,
    artifact_id: Option<String>,
    version: Option<String>,
    group_id: Option<String>,
    new_state: Option<String>,
}

impl LifecycleEvent {
    /// Decodes one raw stream message.
    ///
    /// # Errors
    ///
    /// Returns a [`Decode`](crate::ErrorKind::Decode) error when the body or
    /// its payload is not valid JSON, when `eventType` or `artifactId` is
    /// missing, when a version-level event has no `version`, when a state
    /// change has no `newState`, or when an identifier is not a safe path
    /// segment.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let envelope: Envelope = serde_json::from_slice(body)?;
        let payload = match envelope.payload {
            Some(Value::String(inner)) => serde_json::from_str::<Payload>(&inner)?,
            Some(value @ Value::Object(_)) => serde_json::from_value::<Payload>(value)?,
            Some(_) | None => return Err(missing_field("payload")),
        };

        let event = Self::from_payload(payload)?;
        tracing::trace!(
            target: TRACING_TARGET_DECODE,
            event_type = %event.kind,
            coordinate = %event.coordinate,
            "Decoded lifecycle event"
        );
        Ok(event)
    }

    fn from_payload(payload: Payload) -> Result<Self> {
        let event_type = payload
            .event_type
            .ok_or_else(|| missing_field("eventType"))?;
        let artifact_id = payload
            .artifact_id
            .ok_or_else(|| missing_field("artifactId"))?;
        let group = payload
            .group_id
            .unwrap_or_else(|| DEFAULT_GROUP.to_owned());

        let mut coordinate = ArtifactCoordinate::artifact(group, artifact_id)?;
        if let Some(version) = payload.version {
            coordinate = coordinate.with_version(version)?;
        }

        let kind = match event_type.as_str() {
            VERSION_CREATED => EventKind::VersionCreated,
            VERSION_STATE_CHANGED => {
                let new_state = payload
                    .new_state
                    .ok_or_else(|| missing_field("newState"))?;
                EventKind::VersionStateChanged {
                    new_state: VersionState::from(new_state),
                }
            }
            ARTIFACT_DELETED => EventKind::ArtifactDeleted,
            VERSION_DELETED => EventKind::VersionDeleted,
            _ => EventKind::Other(event_type),
        };

        if kind.is_version_scoped() {
            coordinate.require_version()?;
        }

        Ok(Self { kind, coordinate })
    }
}

fn missing_field(field: &'static str) -> Error {
    Error::decode().with_message(format!("missing required field `{field}`"))
}
