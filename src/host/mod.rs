//! Host document model.
//!
//! [`Host`] is the embedder-facing handle: a shared node arena plus observer
//! registries and a coalesced frame scheduler. Mutation methods record the
//! change, then fire matching observer callbacks only after every internal
//! borrow has been released, so callbacks are free to mutate the document or
//! schedule frames.
//!
//! ## Modules
//!
//! - [`node`] - node arena (slots + free list)
//! - [`observer`] - resize and mutation observers
//! - [`frame`] - frame scheduler

mod frame;
mod node;
mod observer;

use std::cell::RefCell;
use std::rc::Rc;

use crate::types::ScaleTransform;

pub use frame::FrameId;
pub use node::{Document, Node, NodeId, NodeKind};
pub use observer::{MutationKind, ObserverId};

use frame::FrameQueue;
use observer::{Callback, Observers};

/// Shared handle to one host document. Clones alias the same document.
#[derive(Clone, Default)]
pub struct Host {
    doc: Rc<RefCell<Document>>,
    observers: Rc<RefCell<Observers>>,
    frames: Rc<RefCell<FrameQueue>>,
}

impl Host {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Node creation
    // =========================================================================

    pub fn create_element(&self, tag: impl Into<String>) -> NodeId {
        self.doc
            .borrow_mut()
            .create(NodeKind::Element { tag: tag.into() })
    }

    pub fn create_text(&self, content: impl Into<String>) -> NodeId {
        let mut doc = self.doc.borrow_mut();
        let id = doc.create(NodeKind::Text);
        if let Some(node) = doc.get_mut(id) {
            node.text = content.into();
        }
        id
    }

    /// A style node carries a verbatim CSS payload in its text.
    pub fn create_style(&self, css: impl Into<String>) -> NodeId {
        let mut doc = self.doc.borrow_mut();
        let id = doc.create(NodeKind::Style);
        if let Some(node) = doc.get_mut(id) {
            node.text = css.into();
        }
        id
    }

    // =========================================================================
    // Mutations (observer-visible)
    // =========================================================================

    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        let callbacks = {
            let mut doc = self.doc.borrow_mut();
            doc.append_child(parent, child);
            let chain = doc.ancestors(parent);
            self.observers
                .borrow()
                .mutated(&chain, MutationKind::CHILD_LIST)
        };
        run_all(callbacks);
    }

    /// Detach `id` and free its subtree. Returns the number of nodes freed.
    pub fn release(&self, id: NodeId) -> usize {
        let (freed, callbacks) = {
            let mut doc = self.doc.borrow_mut();
            let parent = doc.get(id).and_then(|n| n.parent);
            let freed = doc.release(id);
            let callbacks = match parent {
                Some(parent) => {
                    let chain = doc.ancestors(parent);
                    self.observers
                        .borrow()
                        .mutated(&chain, MutationKind::CHILD_LIST)
                }
                None => Vec::new(),
            };
            (freed, callbacks)
        };
        run_all(callbacks);
        freed
    }

    pub fn set_text(&self, id: NodeId, content: impl Into<String>) {
        let callbacks = {
            let mut doc = self.doc.borrow_mut();
            if let Some(node) = doc.get_mut(id) {
                node.text = content.into();
            }
            let chain = doc.ancestors(id);
            self.observers
                .borrow()
                .mutated(&chain, MutationKind::CHARACTER_DATA)
        };
        run_all(callbacks);
    }

    pub fn set_attr(&self, id: NodeId, name: impl Into<String>, value: impl Into<String>) {
        let callbacks = {
            let mut doc = self.doc.borrow_mut();
            if let Some(node) = doc.get_mut(id) {
                node.attrs.insert(name.into(), value.into());
            }
            let chain = doc.ancestors(id);
            self.observers
                .borrow()
                .mutated(&chain, MutationKind::ATTRIBUTES)
        };
        run_all(callbacks);
    }

    pub fn set_classes(&self, id: NodeId, classes: Vec<String>) {
        let callbacks = {
            let mut doc = self.doc.borrow_mut();
            if let Some(node) = doc.get_mut(id) {
                node.classes = classes;
            }
            let chain = doc.ancestors(id);
            self.observers
                .borrow()
                .mutated(&chain, MutationKind::ATTRIBUTES)
        };
        run_all(callbacks);
    }

    /// Set a node's laid-out size, firing resize observers on it. This is
    /// how the embedder reports container resizes.
    pub fn set_size(&self, id: NodeId, width: f32, height: f32) {
        let callbacks = {
            let mut doc = self.doc.borrow_mut();
            if let Some(node) = doc.get_mut(id) {
                node.size = Some((width, height));
            }
            self.observers.borrow().resized(id)
        };
        run_all(callbacks);
    }

    /// Set a node's scale transform. Deliberately fires no observers: the
    /// rescale loop writes transforms and must not re-trigger itself.
    pub fn set_transform(&self, id: NodeId, transform: ScaleTransform) {
        if let Some(node) = self.doc.borrow_mut().get_mut(id) {
            node.transform = Some(transform);
        }
    }

    // =========================================================================
    // Observers and frames
    // =========================================================================

    pub fn observe_resize(&self, target: NodeId, callback: impl Fn() + 'static) -> ObserverId {
        self.observers
            .borrow_mut()
            .observe_resize(target, Rc::new(callback))
    }

    pub fn observe_mutations(
        &self,
        target: NodeId,
        kinds: MutationKind,
        callback: impl Fn() + 'static,
    ) -> ObserverId {
        self.observers
            .borrow_mut()
            .observe_mutations(target, kinds, Rc::new(callback))
    }

    pub fn unobserve(&self, id: ObserverId) -> bool {
        self.observers.borrow_mut().unobserve(id)
    }

    pub fn request_frame(&self, callback: impl Fn() + 'static) -> FrameId {
        self.frames.borrow_mut().request(Rc::new(callback))
    }

    pub fn cancel_frame(&self, id: FrameId) -> bool {
        self.frames.borrow_mut().cancel(id)
    }

    /// Run the pending frame batch. Returns the number of callbacks run.
    /// Callbacks scheduled during the batch wait for the next call.
    pub fn run_frame(&self) -> usize {
        let batch = self.frames.borrow_mut().take();
        let count = batch.len();
        run_all(batch);
        count
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn with_node<R>(&self, id: NodeId, f: impl FnOnce(&Node) -> R) -> Option<R> {
        self.doc.borrow().get(id).map(f)
    }

    pub fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        self.with_node(id, |n| n.children.clone()).unwrap_or_default()
    }

    pub fn tag_of(&self, id: NodeId) -> Option<String> {
        self.with_node(id, |n| match &n.kind {
            NodeKind::Element { tag } => Some(tag.clone()),
            _ => None,
        })
        .flatten()
    }

    pub fn text_of(&self, id: NodeId) -> Option<String> {
        self.with_node(id, |n| n.text.clone())
    }

    pub fn classes_of(&self, id: NodeId) -> Vec<String> {
        self.with_node(id, |n| n.classes.clone()).unwrap_or_default()
    }

    pub fn size_of(&self, id: NodeId) -> Option<(f32, f32)> {
        self.with_node(id, |n| n.size).flatten()
    }

    pub fn transform_of(&self, id: NodeId) -> Option<ScaleTransform> {
        self.with_node(id, |n| n.transform).flatten()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.doc.borrow().get(id).is_some()
    }

    /// Live node count. Disposal tests assert this returns to baseline.
    pub fn node_count(&self) -> usize {
        self.doc.borrow().len()
    }

    /// Registered observer count. Disposal tests assert this returns to
    /// baseline.
    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.borrow().len()
    }
}

fn run_all(callbacks: Vec<Callback>) {
    for cb in callbacks {
        cb();
    }
}

// =============================================================================
// Tests
// =============================================================================
