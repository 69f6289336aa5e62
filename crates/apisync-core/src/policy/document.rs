//! Parsed generator output.

use derive_more::{AsRef, Deref};
use serde_yaml::Value;

use crate::{Error, Result};

/// Top-level field the generator may emit that must never be persisted.
pub const STATUS_FIELD: &str = "status";

/// A structured document produced by the policy generator.
///
/// Dereferences to the underlying YAML value.
#[derive(Debug, Clone, PartialEq)]
#[derive(AsRef, Deref)]
pub struct PolicyDocument {
    #[deref]
    #[as_ref]
    value: Value,
}

impl PolicyDocument {
    /// Parses raw generator output.
    ///
    /// # Errors
    ///
    /// Returns a [`Generation`](crate::ErrorKind::Generation) error when the
    /// output is not valid YAML or is empty.
    pub fn parse(output: &[u8]) -> Result<Self> {
        let value: Value = serde_yaml::from_slice(output).map_err(|err| {
            Error::generation()
                .with_message("generator output is not valid YAML")
                .with_source(err)
        })?;

        if value.is_null() {
            return Err(Error::generation().with_message("generator produced an empty document"));
        }

        Ok(Self { value })
    }

    /// Returns the document with any top-level `status` field removed.
    #[must_use]
    pub fn without_status(mut self) -> Self {
        if let Value::Mapping(mapping) = &mut self.value {
            mapping.remove(STATUS_FIELD);
        }
        self
    }

    /// Returns true if the document carries a top-level `status` field.
    pub fn has_status(&self) -> bool {
        self.value
            .as_mapping()
            .is_some_and(|mapping| mapping.contains_key(STATUS_FIELD))
    }

    /// Returns the `kind` of the resource, if present.
    pub fn kind(&self) -> Option<&str> {
        self.value.get("kind").and_then(Value::as_str)
    }

    /// Serializes the document back to YAML.
    ///
    /// Serialization is deterministic: equal documents yield equal bytes.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.value).map_err(|err| {
            Error::write()
                .with_message("failed to serialize policy document")
                .with_source(err)
        })
    }
}
