//! Response envelopes of the Graph API.
//!
//! | Shape | Returned by |
//! |-------|-------------|
//! | [`ListEnvelope`] `{ "data": [ … ] }` | `GET /<parent-id>/<connection>` |
//! | [`ErrorResponse`] `{ "error": { … } }` | any non-2xx response |
//! | `{ "id": "…" }` | `POST /<parent-id>/<connection>`, see [`first_string_member`] |

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// The body of a connection listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListEnvelope<T> {
    /// Connected nodes in server order.
    pub data: Vec<T>,
}

/// The body returned for error responses.
///
/// ```json
/// { "error": { "message": "Invalid OAuth access token.", "type": "OAuthException", "code": 190 } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDetail {
    /// Human-readable description of the problem.
    pub message: String,

    /// Error class, e.g. `OAuthException`.
    #[serde(rename = "type", default)]
    pub error_type: String,

    /// Numeric Graph error code.
    #[serde(default)]
    pub code: i64,
}

impl ErrorResponse {
    pub fn new(error_type: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
                error_type: error_type.into(),
                code,
            },
        }
    }
}

/// Build a [`GraphError::Remote`] from a failed response body.
///
/// Uses the envelope's message when the body is a Graph error, the raw body
/// text otherwise.
pub(crate) fn remote_error(status: u16, body: &[u8]) -> GraphError {
    let message = match serde_json::from_slice::<ErrorResponse>(body) {
        Ok(envelope) if envelope.error.error_type.is_empty() => envelope.error.message,
        Ok(envelope) => format!("{} ({})", envelope.error.message, envelope.error.error_type),
        Err(_) => String::from_utf8_lossy(body).trim().to_string(),
    };
    GraphError::Remote { status, message }
}

/// The string value of the first member of a JSON object.
///
/// The append endpoint answers with an object whose first member carries the
/// id of the new node.
pub fn first_string_member(payload: &[u8]) -> Result<String, GraphError> {
    let value: serde_json::Value = serde_json::from_slice(payload)?;
    let object = value
        .as_object()
        .ok_or_else(|| GraphError::Parse("expected a JSON object".into()))?;
    let (key, first) = object
        .iter()
        .next()
        .ok_or_else(|| GraphError::Parse("expected a non-empty JSON object".into()))?;
    first
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| GraphError::Parse(format!("member {key:?} is not a string")))
}
