//! # deckview
//!
//! Live preview and rendering engine for generated slide decks.
//!
//! deckview consumes two externally produced payloads — a slide document
//! (delimiter-separated content blocks with optional frontmatter) and a set
//! of named component sources (template + optional behavior script +
//! optional style rules) — and keeps a rendered, auto-scaled view of them
//! mounted inside a host document, across an unbounded number of update
//! cycles.
//!
//! ## Architecture
//!
//! The pipeline is one-way:
//!
//! ```text
//! Transport Adapter → Splitter / Compiler → Stage → host document
//!                                             ↘ atomic styles (post-attach)
//! ```
//!
//! - [`transport`] decodes query-string or message-envelope payloads into a
//!   normalized [`RenderRequest`](types::RenderRequest).
//! - [`document`] splits the slide document into ordered
//!   [`SlideRecord`](types::SlideRecord)s, merging frontmatter defaults.
//! - [`compiler`] turns one component source into a renderable definition or
//!   a structured [`CompileError`](error::CompileError); behavior scripts run
//!   in an isolated scope against an enumerated host API.
//! - [`stage`] owns at most one render session per mount target and drives
//!   compile → mount → observe → rescale → dispose.
//! - [`styles`] generates utility CSS on demand from the class tokens
//!   observed on the mounted subtree.
//! - [`host`] models the host page: node arena, resize/mutation observers,
//!   and a coalesced frame scheduler. [`layout`] measures the natural size
//!   of mounted content for the fit-to-container rescale.
//!
//! ## Modules
//!
//! - [`types`] - Core types (SlideRecord, RenderRequest, VNode, etc.)
//! - [`error`] - Error taxonomy (DecodeError, CompileError, RenderError)
//! - [`document`] - Frontmatter/content splitter
//! - [`compiler`] - Component compiler and behavior-script sandbox
//! - [`host`] - Host document model (nodes, observers, frames)
//! - [`layout`] - Natural-size measurement via flexbox computation
//! - [`styles`] - Atomic utility CSS generation
//! - [`stage`] - Mount/session lifecycle state machine
//! - [`transport`] - Inbound payload decoding

pub mod compiler;
pub mod document;
pub mod error;
pub mod host;
pub mod layout;
pub mod stage;
pub mod styles;
pub mod transport;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::{CompileError, DecodeError, RenderError, StageError};

pub use document::{split_document, Frontmatter};

pub use compiler::{compile_component, CompiledComponent, CompiledSet, CompiledTemplate};

pub use host::{FrameId, Host, MutationKind, NodeId, NodeKind, ObserverId};

pub use layout::{measure_text_height, natural_size, string_width};

pub use styles::{collect_class_tokens, generator, AtomicStyles};

pub use stage::{fit_to_container, Stage, StageState};

pub use transport::{
    decode_message, decode_query, DeliveryMode, MessageEnvelope, TransportAdapter,
};
