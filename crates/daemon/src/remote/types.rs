//! Wire types for the remote gift code API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::RemoteError;

/// Raw lines returned by a successful list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeListing {
    /// One entry per element of the `codes` array, unvalidated.
    pub lines: Vec<String>,
    /// HTTP status the listing arrived with.
    pub status: u16,
}

/// Acknowledgement body of a write (POST/DELETE).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WriteAck {
    /// Whether the remote applied the write.
    #[serde(default)]
    pub success: Option<bool>,
    /// Optional human-readable detail.
    #[serde(default)]
    pub message: Option<String>,
    /// Optional error detail.
    #[serde(default)]
    pub error: Option<String>,
}

impl WriteAck {
    /// Detail to attach to a rejection.
    pub(crate) fn detail(self) -> Option<String> {
        self.error.or(self.message)
    }
}

/// Body of a check-style GET.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct CheckResponse {
    #[serde(default)]
    pub exists: bool,
}

/// POST body.
#[derive(Debug, Serialize)]
pub(crate) struct UpsertBody<'a> {
    pub code: &'a str,
    pub date: String,
}

/// DELETE body.
#[derive(Debug, Serialize)]
pub(crate) struct DeleteBody<'a> {
    pub code: &'a str,
}

/// Decode the body of a list call.
///
/// An object carrying `error` is an explicit API error. Any other object
/// yields its `codes` array (missing means empty). `null` entries become
/// empty lines and non-string entries their JSON text, so every element is
/// still classified downstream. A non-object body has no codes.
pub(crate) fn parse_listing(body: &str, status: u16) -> Result<CodeListing, RemoteError> {
    if body.trim().is_empty() {
        return Err(RemoteError::EmptyBody);
    }

    let value: Value =
        serde_json::from_str(body).map_err(|e| RemoteError::Decode(e.to_string()))?;

    let Value::Object(map) = value else {
        return Ok(CodeListing {
            lines: Vec::new(),
            status,
        });
    };

    if let Some(error) = map.get("error") {
        let message = error
            .as_str()
            .map_or_else(|| error.to_string(), ToString::to_string);
        return Err(RemoteError::Api(message));
    }

    let lines = match map.get("codes") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    };

    Ok(CodeListing { lines, status })
}
