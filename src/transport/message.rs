//! Message-envelope payload decoding.
//!
//! Embedders that hold a live handle to the preview post JSON envelopes
//! instead of navigating: `{"type": "render", "code": "...", "components":
//! {...}}`. The `code` field is plain text here, not base64. `components`
//! may be an object, or a string carrying the query form's base64(JSON
//! object) encoding.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde::Deserialize;
use serde_json::Value;

use crate::error::DecodeError;
use crate::types::RenderRequest;

use super::query::{components_from_value, parse_components};

/// The raw envelope shape, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub components: Option<Value>,
}

/// Decode one posted envelope into a render request.
pub fn decode_message(json: &str) -> Result<RenderRequest, DecodeError> {
    let envelope: MessageEnvelope = serde_json::from_str(json)?;

    if envelope.kind != "render" && envelope.kind != "preview-code" {
        return Err(DecodeError::UnknownMessageType(envelope.kind));
    }

    let components = match envelope.components {
        None | Some(Value::Null) => Default::default(),
        Some(Value::String(encoded)) => {
            let bytes = STANDARD
                .decode(encoded.as_bytes())
                .or_else(|_| URL_SAFE_NO_PAD.decode(encoded.as_bytes()))
                .map_err(|source| DecodeError::Base64 {
                    field: "components",
                    source,
                })?;
            let json = String::from_utf8(bytes).map_err(|_| DecodeError::Utf8 {
                field: "components",
            })?;
            parse_components(&json)?
        }
        Some(value) => components_from_value(value)?,
    };

    Ok(RenderRequest {
        document: envelope.code.unwrap_or_default(),
        components,
    })
}

// =============================================================================
// Tests
// =============================================================================
