//! Stream metadata.

use crate::handle::Handle;
use serde::Serialize;

/// Descriptive attributes of an open handle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct Metadata {
    /// Always false: there are no timeouts.
    pub timed_out: bool,
    /// Always true: every call blocks.
    pub blocked: bool,
    /// Whether the last read reached the end of the resource.
    pub eof: bool,
    pub wrapper_type: String,
    pub stream_type: String,
    pub mode: String,
    /// Always 0: nothing is buffered ahead of the handle.
    pub unread_bytes: u64,
    pub seekable: bool,
    pub uri: String,
}

/// Keys accepted by [`Metadata::get`].
pub const METADATA_KEYS: &[&str] = &[
    "timed_out",
    "blocked",
    "eof",
    "wrapper_type",
    "stream_type",
    "mode",
    "unread_bytes",
    "seekable",
    "uri",
];

/// A single metadata value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetadataValue {
    Bool(bool),
    Int(u64),
    Text(String),
}

impl MetadataValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetadataValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

#[cfg(feature = "json")]
impl From<MetadataValue> for serde_json::Value {
    fn from(value: MetadataValue) -> Self {
        match value {
            MetadataValue::Bool(b) => serde_json::Value::Bool(b),
            MetadataValue::Int(n) => serde_json::Value::from(n),
            MetadataValue::Text(s) => serde_json::Value::String(s),
        }
    }
}

impl Metadata {
    pub(crate) fn of(handle: &dyn Handle) -> Self {
        Self {
            timed_out: false,
            blocked: true,
            eof: handle.reached_eof(),
            wrapper_type: handle.wrapper_type().to_string(),
            stream_type: handle.stream_type().to_string(),
            mode: handle.mode().as_str().to_string(),
            unread_bytes: 0,
            seekable: handle.is_seekable(),
            uri: handle.uri().to_string(),
        }
    }

    /// Look up one attribute by key; `None` for unknown keys.
    pub fn get(&self, key: &str) -> Option<MetadataValue> {
        let value = match key {
            "timed_out" => MetadataValue::Bool(self.timed_out),
            "blocked" => MetadataValue::Bool(self.blocked),
            "eof" => MetadataValue::Bool(self.eof),
            "wrapper_type" => MetadataValue::Text(self.wrapper_type.clone()),
            "stream_type" => MetadataValue::Text(self.stream_type.clone()),
            "mode" => MetadataValue::Text(self.mode.clone()),
            "unread_bytes" => MetadataValue::Int(self.unread_bytes),
            "seekable" => MetadataValue::Bool(self.seekable),
            "uri" => MetadataValue::Text(self.uri.clone()),
            _ => return None,
        };
        Some(value)
    }

    /// The whole record as a JSON object.
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
