//! Coalesced frame scheduler.
//!
//! Work scheduled with [`FrameQueue::request`] runs on the next call to
//! `run`, unless cancelled first. Callbacks scheduled while a frame is
//! running land in the following frame.

use std::collections::BTreeMap;
use std::rc::Rc;

/// Handle to a scheduled callback, usable to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(pub(crate) usize);

#[derive(Default)]
pub(crate) struct FrameQueue {
    next_id: usize,
    pending: BTreeMap<FrameId, Rc<dyn Fn()>>,
}

impl FrameQueue {
    pub(crate) fn request(&mut self, callback: Rc<dyn Fn()>) -> FrameId {
        self.next_id += 1;
        let id = FrameId(self.next_id);
        self.pending.insert(id, callback);
        id
    }

    pub(crate) fn cancel(&mut self, id: FrameId) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Take the current batch, leaving the queue ready for re-scheduling.
    pub(crate) fn take(&mut self) -> Vec<Rc<dyn Fn()>> {
        std::mem::take(&mut self.pending).into_values().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}
