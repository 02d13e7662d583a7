//! Resize and mutation observers.
//!
//! Observers are registered against a target node. A resize observer fires
//! when the target's laid-out size changes; a mutation observer fires when a
//! mutation of a subscribed kind happens anywhere in the target's subtree.

use std::collections::BTreeMap;
use std::rc::Rc;

use bitflags::bitflags;

use super::node::NodeId;

bitflags! {
    /// Which mutations an observer subscribes to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MutationKind: u8 {
        /// Children added or removed.
        const CHILD_LIST = 1 << 0;
        /// Attribute or class changes.
        const ATTRIBUTES = 1 << 1;
        /// Text or style content changes.
        const CHARACTER_DATA = 1 << 2;
    }
}

/// Handle to a registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(pub(crate) usize);

pub(crate) type Callback = Rc<dyn Fn()>;

#[derive(Default)]
pub(crate) struct Observers {
    next_id: usize,
    resize: BTreeMap<ObserverId, (NodeId, Callback)>,
    mutation: BTreeMap<ObserverId, (NodeId, MutationKind, Callback)>,
}

impl Observers {
    fn next(&mut self) -> ObserverId {
        self.next_id += 1;
        ObserverId(self.next_id)
    }

    pub(crate) fn observe_resize(&mut self, target: NodeId, callback: Callback) -> ObserverId {
        let id = self.next();
        self.resize.insert(id, (target, callback));
        id
    }

    pub(crate) fn observe_mutations(
        &mut self,
        target: NodeId,
        kinds: MutationKind,
        callback: Callback,
    ) -> ObserverId {
        let id = self.next();
        self.mutation.insert(id, (target, kinds, callback));
        id
    }

    pub(crate) fn unobserve(&mut self, id: ObserverId) -> bool {
        self.resize.remove(&id).is_some() || self.mutation.remove(&id).is_some()
    }

    /// Callbacks for a resize of `target`.
    pub(crate) fn resized(&self, target: NodeId) -> Vec<Callback> {
        self.resize
            .values()
            .filter(|(watched, _)| *watched == target)
            .map(|(_, cb)| Rc::clone(cb))
            .collect()
    }

    /// Callbacks for a mutation of `kind` whose ancestor chain is
    /// `ancestors` (mutated node first).
    pub(crate) fn mutated(&self, ancestors: &[NodeId], kind: MutationKind) -> Vec<Callback> {
        self.mutation
            .values()
            .filter(|(watched, kinds, _)| {
                kinds.intersects(kind) && ancestors.contains(watched)
            })
            .map(|(_, _, cb)| Rc::clone(cb))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.resize.len() + self.mutation.len()
    }
}
