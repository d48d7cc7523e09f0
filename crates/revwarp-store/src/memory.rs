//! In-memory reference store.
//!
//! `MemStore` backs unit tests and demos: revisions are inserted with
//! explicit metadata, availability can be flipped to simulate revisions
//! propagating to or vanishing from this peer, and watched flips are
//! pushed to subscribers exactly like a real connector would.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::trace;

use revwarp_types::{DocumentId, Link, RevisionId, RevisionMetadata};

use crate::connector::{AvailabilityChange, AvailabilityEvent, StoreConnector, WatchHandle};
use crate::error::StoreError;

/// Buffered availability changes per subscriber before lag kicks in.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

struct RevEntry {
    meta: RevisionMetadata,
    available: bool,
}

#[derive(Default)]
struct Inner {
    revisions: HashMap<RevisionId, RevEntry>,
    documents: HashMap<DocumentId, RevisionId>,
    watches: HashMap<u64, RevisionId>,
    next_watch: u64,
}

impl Inner {
    fn is_watched(&self, rev: &RevisionId) -> bool {
        self.watches.values().any(|r| r == rev)
    }
}

/// In-memory [`StoreConnector`] implementation.
pub struct MemStore {
    inner: Mutex<Inner>,
    changes: broadcast::Sender<AvailabilityChange>,
}

impl MemStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { inner: Mutex::new(Inner::default()), changes }
    }

    /// Insert a revision as available, minting its id from `content`.
    ///
    /// If the id was being watched (e.g. referenced as a parent before it
    /// propagated), subscribers see `Appeared`.
    pub fn insert_revision(&self, content: &[u8], meta: RevisionMetadata) -> RevisionId {
        let rev = RevisionId::hash(content);
        let mut inner = self.inner.lock();
        let was_available =
            inner.revisions.insert(rev, RevEntry { meta, available: true }).is_some_and(|e| e.available);
        if !was_available && inner.is_watched(&rev) {
            self.emit(&inner, rev, AvailabilityEvent::Appeared);
        }
        rev
    }

    /// Flip a revision's availability, notifying watchers on a real change.
    ///
    /// Returns false if the revision is unknown or already in that state.
    pub fn set_available(&self, rev: &RevisionId, available: bool) -> bool {
        let mut inner = self.inner.lock();
        let Some(entry) = inner.revisions.get_mut(rev) else {
            return false;
        };
        if entry.available == available {
            return false;
        }
        entry.available = available;
        if inner.is_watched(rev) {
            let event = if available {
                AvailabilityEvent::Appeared
            } else {
                AvailabilityEvent::Disappeared
            };
            self.emit(&inner, *rev, event);
        }
        true
    }

    /// Point a document at its current revision.
    pub fn put_document(&self, doc: DocumentId, rev: RevisionId) {
        self.inner.lock().documents.insert(doc, rev);
    }

    /// Delete a document (its revisions stay content-addressed).
    pub fn remove_document(&self, doc: &DocumentId) {
        self.inner.lock().documents.remove(doc);
    }

    fn emit(&self, _inner: &Inner, rev: RevisionId, event: AvailabilityEvent) {
        trace!(rev = %rev.short(), %event, "availability change");
        // No receivers is fine — nobody has subscribed yet.
        let _ = self.changes.send(AvailabilityChange { rev, event });
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreConnector for MemStore {
    fn stat(&self, rev: &RevisionId) -> Result<RevisionMetadata, StoreError> {
        let inner = self.inner.lock();
        match inner.revisions.get(rev) {
            Some(entry) if entry.available => Ok(entry.meta.clone()),
            _ => Err(StoreError::NotFound(*rev)),
        }
    }

    fn lookup_rev(&self, rev: &RevisionId) -> bool {
        let inner = self.inner.lock();
        inner.revisions.get(rev).is_some_and(|e| e.available)
    }

    fn resolve_link(&self, link: &Link) -> Vec<RevisionId> {
        match link {
            // A revision link is its own single candidate; whether it can
            // actually be served is a stat/lookup question.
            Link::Rev(l) => vec![l.rev],
            Link::Doc(l) => {
                let inner = self.inner.lock();
                inner.documents.get(&l.doc).copied().into_iter().collect()
            }
        }
    }

    fn watch(&self, rev: RevisionId) -> WatchHandle {
        let mut inner = self.inner.lock();
        let id = inner.next_watch;
        inner.next_watch += 1;
        inner.watches.insert(id, rev);
        WatchHandle(id)
    }

    fn unwatch(&self, handle: WatchHandle) {
        self.inner.lock().watches.remove(&handle.0);
    }

    fn subscribe_changes(&self) -> broadcast::Receiver<AvailabilityChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(mtime: i64) -> RevisionMetadata {
        RevisionMetadata::new(mtime, vec![], "org.revwarp.dict")
    }

    #[test]
    fn test_stat_unknown_is_not_found() {
        let store = MemStore::new();
        let rev = RevisionId::hash(b"missing");
        let err = store.stat(&rev).unwrap_err();
        assert!(err.is_not_found());
        assert!(!store.lookup_rev(&rev));
    }

    #[test]
    fn test_insert_then_stat() {
        let store = MemStore::new();
        let rev = store.insert_revision(b"r1", meta(100));
        assert_eq!(store.stat(&rev).unwrap().mtime, 100);
        assert!(store.lookup_rev(&rev));
    }

    #[test]
    fn test_unavailable_revision_is_not_served() {
        let store = MemStore::new();
        let rev = store.insert_revision(b"r1", meta(100));
        assert!(store.set_available(&rev, false));
        assert!(store.stat(&rev).unwrap_err().is_not_found());
        // Flipping to the same state is not a change.
        assert!(!store.set_available(&rev, false));
    }

    #[test]
    fn test_doc_link_resolution() {
        let store = MemStore::new();
        let rev = store.insert_revision(b"r1", meta(100));
        let doc = DocumentId::new();

        assert!(store.resolve_link(&Link::doc(doc)).is_empty());
        store.put_document(doc, rev);
        assert_eq!(store.resolve_link(&Link::doc(doc)), vec![rev]);
        store.remove_document(&doc);
        assert!(store.resolve_link(&Link::doc(doc)).is_empty());
    }

    #[test]
    fn test_rev_link_is_its_own_candidate() {
        let store = MemStore::new();
        let rev = RevisionId::hash(b"never inserted");
        assert_eq!(store.resolve_link(&Link::rev(rev)), vec![rev]);
    }

    #[test]
    fn test_watched_flips_are_pushed() {
        let store = MemStore::new();
        let rev = store.insert_revision(b"r1", meta(100));
        let mut rx = store.subscribe_changes();

        let handle = store.watch(rev);
        store.set_available(&rev, false);
        store.set_available(&rev, true);

        assert_eq!(
            rx.try_recv().unwrap(),
            AvailabilityChange { rev, event: AvailabilityEvent::Disappeared }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            AvailabilityChange { rev, event: AvailabilityEvent::Appeared }
        );

        // After unwatch, flips are silent.
        store.unwatch(handle);
        store.set_available(&rev, false);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unwatched_revisions_are_silent() {
        let store = MemStore::new();
        let rev = store.insert_revision(b"r1", meta(100));
        let other = store.insert_revision(b"r2", meta(200));
        let mut rx = store.subscribe_changes();

        let _h = store.watch(rev);
        store.set_available(&other, false);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_late_insert_appears_to_watchers() {
        let store = MemStore::new();
        let rev = RevisionId::hash(b"future");
        let mut rx = store.subscribe_changes();
        let _h = store.watch(rev);

        let inserted = store.insert_revision(b"future", meta(50));
        assert_eq!(inserted, rev);
        assert_eq!(
            rx.try_recv().unwrap(),
            AvailabilityChange { rev, event: AvailabilityEvent::Appeared }
        );
    }
}
