//! Node arena.
//!
//! Nodes live in a slot vector with a free list; releasing a node recursively
//! frees its subtree and returns the slots for reuse. Identifiers are plain
//! indices, valid until the node is released.

use std::collections::BTreeMap;

use crate::types::ScaleTransform;

/// Handle to a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

/// What a node is. `Text` and `Style` carry their content in
/// [`Node::text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element { tag: String },
    Text,
    Style,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub classes: Vec<String>,
    pub attrs: BTreeMap<String, String>,
    pub text: String,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    /// Laid-out box, set by the embedder. Read as the container size.
    pub size: Option<(f32, f32)>,
    pub transform: Option<ScaleTransform>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            classes: Vec::new(),
            attrs: BTreeMap::new(),
            text: String::new(),
            children: Vec::new(),
            parent: None,
            size: None,
            transform: None,
        }
    }
}

/// The node arena.
#[derive(Debug, Default)]
pub struct Document {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let node = Node::new(kind);
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(node);
                NodeId(index)
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Attach `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.get_mut(parent) {
            node.children.push(child);
        }
    }

    /// Remove `child` from its parent's child list without freeing it.
    pub fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.get(child).and_then(|n| n.parent) else {
            return;
        };
        if let Some(node) = self.get_mut(parent) {
            node.children.retain(|c| *c != child);
        }
        if let Some(node) = self.get_mut(child) {
            node.parent = None;
        }
    }

    /// Detach `id` and free its whole subtree. Returns the number of nodes
    /// freed.
    pub fn release(&mut self, id: NodeId) -> usize {
        self.detach(id);
        self.release_subtree(id)
    }

    fn release_subtree(&mut self, id: NodeId) -> usize {
        let Some(node) = self.slots.get_mut(id.0).and_then(Option::take) else {
            return 0;
        };
        self.free.push(id.0);
        let mut freed = 1;
        for child in node.children {
            freed += self.release_subtree(child);
        }
        freed
    }

    /// The chain from `id` up to the root, inclusive of `id`.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            chain.push(current);
            cursor = self.get(current).and_then(|n| n.parent);
        }
        chain
    }

    /// Live node count.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
