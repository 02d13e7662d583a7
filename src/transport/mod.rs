//! Inbound payload decoding and dispatch.
//!
//! Two delivery shapes reach the preview: a query string on navigation and a
//! posted JSON envelope from a live embedder. Both normalize into a
//! [`RenderRequest`]; the [`TransportAdapter`] forwards it to the stage.
//! Decode failures are reported to the caller and otherwise ignored, so the
//! previous render stays visible; compile and render failures are the
//! stage's to display.
//!
//! ## Modules
//!
//! - [`query`] - `?code=...&components=...` decoding
//! - [`message`] - posted envelope decoding

mod message;
mod query;

use tracing::{debug, warn};

use crate::error::DecodeError;
use crate::stage::Stage;
use crate::types::RenderRequest;

pub use message::{decode_message, MessageEnvelope};
pub use query::decode_query;

/// How payloads arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Query-string navigation: the payload is the full query string.
    Query,
    /// Posted message: the payload is one JSON envelope.
    Post,
}

/// Glue between a payload source and one stage.
pub struct TransportAdapter {
    stage: Stage,
    delivery: DeliveryMode,
}

impl TransportAdapter {
    pub fn new(stage: Stage, delivery: DeliveryMode) -> Self {
        Self { stage, delivery }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Decode and apply one raw payload in the adapter's delivery mode.
    pub fn forward(&self, payload: &str) -> Result<(), DecodeError> {
        match self.delivery {
            DeliveryMode::Query => self.handle_query(payload),
            DeliveryMode::Post => self.handle_message(payload),
        }
    }

    pub fn handle_query(&self, query: &str) -> Result<(), DecodeError> {
        let request = decode_query(query)?;
        self.apply(request);
        Ok(())
    }

    pub fn handle_message(&self, json: &str) -> Result<(), DecodeError> {
        let request = decode_message(json)?;

        // A live embedder posts envelopes with a blank document while its
        // editor is empty, components or not; keep whatever is mounted.
        if self.delivery == DeliveryMode::Post && request.document.trim().is_empty() {
            debug!("empty posted payload; keeping current render");
            return Ok(());
        }

        self.apply(request);
        Ok(())
    }

    fn apply(&self, request: RenderRequest) {
        // The stage reports failures by mounting its error panel; nothing
        // more to do here beyond the log line.
        if let Err(err) = self.stage.render(&request) {
            warn!(error = %err, "render request rejected");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
