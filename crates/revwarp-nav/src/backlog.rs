//! Debounced discovery backlog for newly-seen parent revisions.
//!
//! Parents reported by resolving nodes queue up here instead of being
//! instantiated immediately. A single-shot cooldown timer drains the
//! queue at most [`BACKLOG_BATCH`] ids per tick, which bounds burst load
//! on the store when an ancestor chain is deep and avoids re-sorting the
//! candidate set on every single discovery.
//!
//! The timer itself is just a deadline value; the embedding event loop
//! sleeps until [`deadline`](Backlog::deadline) and then calls the
//! timeline's tick. Arming is debounced: while a tick is pending, further
//! discoveries do not move the deadline.

use std::collections::VecDeque;

use tokio::time::Instant;
use tracing::trace;

use revwarp_types::RevisionId;

use crate::constants::{BACKLOG_BATCH, BACKLOG_COOLDOWN};

/// FIFO of revision ids awaiting discovery.
#[derive(Debug, Default)]
pub struct Backlog {
    queue: VecDeque<RevisionId>,
    deadline: Option<Instant>,
}

impl Backlog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue newly-reported parents, arming the cooldown timer if no
    /// tick is already pending.
    pub fn extend(&mut self, parents: impl IntoIterator<Item = RevisionId>) {
        let before = self.queue.len();
        self.queue.extend(parents);
        if self.queue.len() > before {
            trace!(pending = self.queue.len(), "backlog grew");
        }
        if !self.queue.is_empty() && self.deadline.is_none() {
            self.deadline = Some(Instant::now() + BACKLOG_COOLDOWN);
        }
    }

    /// When the pending tick is due, if one is armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Dequeue the next batch (at most [`BACKLOG_BATCH`] ids) and disarm
    /// the timer. The caller processes the batch, then calls
    /// [`rearm_if_pending`](Self::rearm_if_pending).
    pub fn take_batch(&mut self) -> Vec<RevisionId> {
        self.deadline = None;
        let n = self.queue.len().min(BACKLOG_BATCH);
        self.queue.drain(..n).collect()
    }

    /// Re-arm the cooldown timer when ids are still queued.
    pub fn rearm_if_pending(&mut self) {
        if !self.queue.is_empty() && self.deadline.is_none() {
            self.deadline = Some(Instant::now() + BACKLOG_COOLDOWN);
        }
    }
}
