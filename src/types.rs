//! Core types for deckview.
//!
//! These types define the foundation that everything builds on: the records
//! the splitter emits, the normalized inbound request, and the virtual node
//! tree that compiled templates render into.

use std::collections::BTreeMap;

use serde_json::Value;

// =============================================================================
// Deck geometry
// =============================================================================

/// Default slide design width in pixels (16:9 deck).
pub const DESIGN_WIDTH: f64 = 1280.0;

/// Default slide design height in pixels (16:9 deck).
pub const DESIGN_HEIGHT: f64 = 720.0;

/// A uniform scale plus centering offsets, applied to a mounted root so the
/// deck's design box fits its container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleTransform {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl ScaleTransform {
    /// The identity transform: no scaling, no offset.
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };
}

// =============================================================================
// Slide records
// =============================================================================

/// Merged frontmatter for one slide: document-level defaults overlaid with
/// the per-slide block's keys.
pub type Frontmatter = serde_json::Map<String, Value>;

/// One slide as emitted by the splitter.
///
/// Immutable once produced; lives for one render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideRecord {
    /// 1-based position in source order. Never reordered by content.
    pub ordinal: usize,
    /// Merged frontmatter (defaults + per-slide overrides).
    pub frontmatter: Frontmatter,
    /// Raw content block, surrounding blank lines trimmed.
    pub content: String,
}

// =============================================================================
// Component sources
// =============================================================================

/// A named, externally supplied component source module.
///
/// Referenced by name from slide content via an embedding tag; never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSource {
    pub name: String,
    pub raw: String,
}

impl ComponentSource {
    pub fn new(name: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw: raw.into(),
        }
    }
}

// =============================================================================
// Normalized inbound request
// =============================================================================

/// A fully decoded render request.
///
/// This is the normalized form of both transport shapes (query string and
/// message envelope). Transient: the last received request wins, there is no
/// queueing or history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderRequest {
    /// The slide document text (or a single component source, when
    /// component-shaped).
    pub document: String,
    /// Component sources by name.
    pub components: BTreeMap<String, String>,
}

impl RenderRequest {
    /// A payload whose document text starts with `<template` is a single
    /// component to preview full-bleed rather than a slide document.
    pub fn is_component_shaped(&self) -> bool {
        self.document.trim_start().starts_with("<template")
    }
}

// =============================================================================
// Virtual nodes
// =============================================================================

/// Output of a compiled template's render function.
///
/// A `VNode` tree is pure data; the stage materializes it into host nodes,
/// expanding [`VNode::Component`] references against the compiled set.
#[derive(Debug, Clone, PartialEq)]
pub enum VNode {
    Element {
        tag: String,
        classes: Vec<String>,
        attrs: BTreeMap<String, String>,
        children: Vec<VNode>,
    },
    Text(String),
    /// Reference to another supplied component, expanded at mount time.
    Component {
        name: String,
        /// Evaluated attribute values, overlaid on the component's own
        /// script bindings when its template renders.
        props: serde_json::Map<String, Value>,
    },
}

impl VNode {
    /// Shorthand for a plain element with no classes or attributes.
    pub fn element(tag: impl Into<String>, children: Vec<VNode>) -> Self {
        Self::Element {
            tag: tag.into(),
            classes: Vec::new(),
            attrs: BTreeMap::new(),
            children,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_shaped_detection() {
        let doc = RenderRequest {
            document: "# Title\n---\nbody".into(),
            components: BTreeMap::new(),
        };
        assert!(!doc.is_component_shaped());

        let comp = RenderRequest {
            document: "  <template>\n<div/>\n</template>".into(),
            components: BTreeMap::new(),
        };
        assert!(comp.is_component_shaped());
    }

    #[test]
    fn test_vnode_shorthand() {
        let node = VNode::element("div", vec![VNode::text("hi")]);
        match node {
            VNode::Element { tag, children, .. } => {
                assert_eq!(tag, "div");
                assert_eq!(children, vec![VNode::Text("hi".into())]);
            }
            _ => panic!("expected element"),
        }
    }
}
