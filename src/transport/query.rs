//! Query-string payload decoding.
//!
//! The embedding page passes the deck through the preview URL:
//! `?code=<base64 document>&components=<base64 JSON object>`. Values are
//! percent-decoded first; base64 is accepted in both the standard and the
//! URL-safe unpadded alphabet, since senders differ.

use std::collections::BTreeMap;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde_json::Value;

use crate::error::DecodeError;
use crate::types::RenderRequest;

/// Decode a query string (with or without the leading `?`).
pub fn decode_query(query: &str) -> Result<RenderRequest, DecodeError> {
    let query = query.strip_prefix('?').unwrap_or(query);

    let mut code = None;
    let mut components_raw = None;
    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        match key {
            "code" => code = Some(value),
            "components" => components_raw = Some(value),
            _ => {}
        }
    }

    let code = code.ok_or(DecodeError::MissingDocument)?;
    let document = decode_field("code", code)?;

    let components = match components_raw {
        Some(raw) if !raw.is_empty() => {
            let json = decode_field("components", raw)?;
            parse_components(&json)?
        }
        _ => BTreeMap::new(),
    };

    Ok(RenderRequest {
        document,
        components,
    })
}

/// Percent-decode, then base64-decode, then require UTF-8.
fn decode_field(field: &'static str, raw: &str) -> Result<String, DecodeError> {
    let unescaped =
        urlencoding::decode(raw).map_err(|_| DecodeError::PercentEncoding { field })?;

    let bytes = STANDARD
        .decode(unescaped.as_bytes())
        .or_else(|_| URL_SAFE_NO_PAD.decode(unescaped.as_bytes()))
        .map_err(|source| DecodeError::Base64 { field, source })?;

    String::from_utf8(bytes).map_err(|_| DecodeError::Utf8 { field })
}

/// Parse the components payload: a JSON object mapping names to source
/// strings. Anything else is rejected as a whole.
pub(crate) fn parse_components(json: &str) -> Result<BTreeMap<String, String>, DecodeError> {
    let value: Value = serde_json::from_str(json)?;
    components_from_value(value)
}

pub(crate) fn components_from_value(
    value: Value,
) -> Result<BTreeMap<String, String>, DecodeError> {
    let Value::Object(map) = value else {
        return Err(DecodeError::NotAnObject);
    };
    let mut components = BTreeMap::new();
    for (name, source) in map {
        match source {
            Value::String(source) => {
                components.insert(name, source);
            }
            _ => return Err(DecodeError::NonStringSource(name)),
        }
    }
    Ok(components)
}

// =============================================================================
// Tests
// =============================================================================
