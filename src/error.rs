//! Error taxonomy.
//!
//! Every failure in the core surfaces as a typed value; nothing is thrown
//! uncaught across the public boundary. Decode failures leave the previous
//! render visible; compile and render failures replace the mount target with
//! a visible error panel.

use thiserror::Error;

// =============================================================================
// Transport
// =============================================================================

/// A malformed transport payload. Recoverable: reported and ignored.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid percent-encoding in `{field}`")]
    PercentEncoding { field: &'static str },

    #[error("invalid base64 in `{field}`: {source}")]
    Base64 {
        field: &'static str,
        source: base64::DecodeError,
    },

    #[error("invalid UTF-8 in `{field}`")]
    Utf8 { field: &'static str },

    #[error("invalid JSON in `components`: {0}")]
    Json(#[from] serde_json::Error),

    #[error("`components` must be a JSON object")]
    NotAnObject,

    #[error("component `{0}` source must be a string")]
    NonStringSource(String),

    #[error("unknown message type `{0}`")]
    UnknownMessageType(String),

    #[error("missing `code` parameter")]
    MissingDocument,
}

// =============================================================================
// Compilation
// =============================================================================

/// A template or behavior-script compilation failure.
///
/// When a source produces several errors, the first is surfaced here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CompileError {
    pub message: String,
}

impl CompileError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// A failure while evaluating a compiled template against its scope, or
/// while materializing the result into the host document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("unknown binding `{0}`")]
    UnknownBinding(String),

    #[error("`{0}` is not iterable")]
    NotIterable(String),

    #[error("unknown component `{0}`")]
    UnknownComponent(String),

    #[error("component nesting exceeds depth limit")]
    DepthExceeded,

    #[error("{0}")]
    Eval(String),
}

// =============================================================================
// Stage
// =============================================================================

/// Session-level failure reported upward by the stage after it has replaced
/// the mount target with an error panel. No partial mount is left behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_display() {
        let err = CompileError::new("missing <template> section");
        assert_eq!(err.to_string(), "missing <template> section");
    }

    #[test]
    fn test_stage_error_is_transparent() {
        let err: StageError = RenderError::UnknownBinding("count".into()).into();
        assert_eq!(err.to_string(), "unknown binding `count`");
    }
}
