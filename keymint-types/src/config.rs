//! Operator-configured links, stored as a singleton hash-record.
//!
//! Owned by the admin-config handlers; the activation path only ever reads
//! the shortcut link out of it.

use crate::{Error, RecordFields, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The singleton operator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Distribution link handed to activating clients.
    #[serde(default)]
    pub shortcut_link: Option<String>,
    /// Documentation link shown on the dashboard.
    #[serde(default)]
    pub doc_link: Option<String>,
}

impl SystemConfig {
    /// Converts to the stored hash-record shape.
    pub fn to_fields(&self) -> Result<RecordFields> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::MalformedRecord(format!(
                "config serialized to non-object: {other}"
            ))),
        }
    }

    /// Parses a stored hash-record; absent fields stay unset.
    pub fn from_fields(fields: &RecordFields) -> Result<Self> {
        serde_json::from_value(Value::Object(fields.clone())).map_err(Error::from)
    }
}
