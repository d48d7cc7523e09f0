//! Browser facade: history + TimeWarp over one store connector.
//!
//! Implements the inbound command surface the presentation layer drives:
//! link opening with container dispatch, back/forward/menu navigation,
//! and the warp explorer lifecycle. Store failures never escape — a
//! navigation that cannot complete is a logged no-op, exactly like a
//! link whose document vanished.

use std::sync::Arc;

use tracing::{debug, info};

use revwarp_store::StoreConnector;
use revwarp_types::{Link, RevisionId, RevisionMetadata, UiState};

use crate::error::{HistoryError, NavError};
use crate::history::{EntryId, History, HistoryEntry, HistoryObserver, LeaveUpdate};
use crate::timeline::{Direction, Timeline, TimelineObserver};

/// How an open request was handled.
#[derive(Debug)]
pub enum Opened {
    /// A container link — pushed onto the history.
    Pushed(EntryId),
    /// A leaf document — hand it to an external viewer.
    External { link: Link, state: UiState },
    /// The link could not be followed (document gone, store failure).
    /// Deliberately silent: the browser never shows a broken state.
    Ignored,
}

/// The navigation core of one browser window.
pub struct Browser {
    store: Arc<dyn StoreConnector>,
    history: History,
    /// The TimeWarp explorer while warp mode is active.
    warp: Option<Timeline>,
    /// Timeline observer, parked here between warp sessions.
    warp_observer: Option<Box<dyn TimelineObserver>>,
}

impl Browser {
    pub fn new(store: Arc<dyn StoreConnector>) -> Self {
        Self { store, history: History::new(), warp: None, warp_observer: None }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn warp(&self) -> Option<&Timeline> {
        self.warp.as_ref()
    }

    pub fn warp_active(&self) -> bool {
        self.warp.is_some()
    }

    /// Register the history's leave/enter extension point.
    pub fn set_history_observer(&mut self, observer: Box<dyn HistoryObserver>) {
        self.history.set_observer(observer);
    }

    /// Register the timeline observer. Survives warp off/on cycles.
    pub fn set_warp_observer(&mut self, observer: Box<dyn TimelineObserver>) {
        match self.warp.as_mut() {
            Some(timeline) => {
                timeline.set_observer(observer);
                // Catch the new observer up on the current window.
                timeline.recompute();
            }
            None => self.warp_observer = Some(observer),
        }
    }

    // ── History commands ─────────────────────────────────────────────────

    /// Visit a link unconditionally (initial navigation, command line).
    pub fn push_link(&mut self, link: Link, state: UiState) -> EntryId {
        self.leave_warp();
        self.history.push(link, state)
    }

    /// Open a link the way in-browser activation does: silently ignore a
    /// vanished document, push containers, delegate leaves outward.
    pub fn open_link(&mut self, link: Link, state: UiState) -> Opened {
        let meta = match self.resolve_meta(&link) {
            Ok((_, meta)) => meta,
            Err(err) => {
                debug!(link = %link.short(), %err, "open aborted");
                return Opened::Ignored;
            }
        };
        if meta.is_container() {
            self.leave_warp();
            let id = self.history.push(link, state);
            Opened::Pushed(id)
        } else {
            Opened::External { link, state }
        }
    }

    pub fn back(&mut self) {
        self.leave_warp();
        self.history.back();
    }

    pub fn forward(&mut self) {
        self.leave_warp();
        self.history.forward();
    }

    pub fn go_to(&mut self, id: EntryId) -> Result<(), HistoryError> {
        // Validate before leaving warp: a failed jump must not disturb
        // the explorer.
        if !self.history.items().any(|e| e.id() == id) {
            return Err(HistoryError::UnknownEntry(id));
        }
        self.leave_warp();
        self.history.go_to(id)
    }

    pub fn back_items(&self, max: usize) -> Vec<&HistoryEntry> {
        self.history.back_items(max)
    }

    pub fn forward_items(&self, max: usize) -> Vec<&HistoryEntry> {
        self.history.forward_items(max)
    }

    /// Presentation reports a snapshot into an entry it was told it left.
    pub fn update_entry(&mut self, id: EntryId, update: LeaveUpdate) -> Result<(), HistoryError> {
        self.history.update_entry(id, update)
    }

    /// Caption for the current entry, from fetched document metadata.
    pub fn set_display_text(&mut self, text: impl Into<String>) {
        self.history.set_display_text(text);
    }

    // ── TimeWarp commands ────────────────────────────────────────────────

    /// Enter warp mode on the current entry's revision. No-op (false)
    /// when there is no current entry or its link cannot be resolved.
    pub fn warp_on(&mut self, state: UiState) -> bool {
        if self.warp.is_some() {
            return true;
        }
        let Some(entry) = self.history.current() else {
            return false;
        };
        let link = *entry.link();
        match self.resolve_first(&link) {
            Ok(root) => {
                info!(root = %root.short(), "entering time warp");
                let mut timeline = Timeline::new(Arc::clone(&self.store), root, state);
                if let Some(observer) = self.warp_observer.take() {
                    timeline.set_observer(observer);
                    // Construction reconciled before the observer was
                    // attached; report the initial window now.
                    timeline.recompute();
                }
                self.warp = Some(timeline);
                true
            }
            Err(err) => {
                debug!(link = %link.short(), %err, "cannot warp");
                false
            }
        }
    }

    /// Leave warp mode, tearing the explorer down.
    pub fn warp_off(&mut self) {
        self.leave_warp();
    }

    /// Move the warp cursor; no-op outside warp mode.
    pub fn move_cursor(&mut self, direction: Direction) {
        if let Some(timeline) = self.warp.as_mut() {
            timeline.move_cursor(direction);
        }
    }

    /// Open the revision under the warp cursor. A container collapses
    /// the explorer back into the history; a leaf leaves it running.
    pub fn open_current(&mut self) -> Opened {
        let Some(timeline) = self.warp.as_mut() else {
            return Opened::Ignored;
        };
        let Some((link, state)) = timeline.open() else {
            return Opened::Ignored;
        };
        self.open_link(link, state)
    }

    /// Presentation reports the warp view's current UI state.
    pub fn update_view_state(&mut self, state: UiState) {
        if let Some(timeline) = self.warp.as_mut() {
            timeline.update_view_state(state);
        }
    }

    // ── Event-loop plumbing ──────────────────────────────────────────────

    /// Route an availability change to the warp explorer, if any.
    pub fn handle_change(&mut self, change: revwarp_store::AvailabilityChange) {
        if let Some(timeline) = self.warp.as_mut() {
            timeline.handle_change(change);
        }
    }

    /// Run a due backlog tick.
    pub fn tick(&mut self) {
        if let Some(timeline) = self.warp.as_mut() {
            timeline.tick();
        }
    }

    /// When the warp explorer's next backlog tick is due.
    pub fn next_tick_deadline(&self) -> Option<tokio::time::Instant> {
        self.warp.as_ref().and_then(|t| t.next_tick_deadline())
    }

    fn leave_warp(&mut self) {
        if let Some(mut timeline) = self.warp.take() {
            if let Some(observer) = timeline.take_observer() {
                self.warp_observer = Some(observer);
            }
            info!("leaving time warp");
            // Dropping the timeline releases its watches.
        }
    }

    fn resolve_first(&self, link: &Link) -> Result<RevisionId, NavError> {
        self.store
            .resolve_link(link)
            .first()
            .copied()
            .ok_or(NavError::LinkResolution(*link))
    }

    fn resolve_meta(&self, link: &Link) -> Result<(RevisionId, RevisionMetadata), NavError> {
        let rev = self.resolve_first(link)?;
        let meta = self.store.stat(&rev)?;
        Ok((rev, meta))
    }
}

#[cfg(test)]
mod tests {
    use revwarp_store::MemStore;
    use revwarp_types::{DocumentId, RevisionMetadata};

    use super::*;

    fn container_meta(mtime: i64, parents: Vec<RevisionId>) -> RevisionMetadata {
        RevisionMetadata::new(mtime, parents, "org.revwarp.dict")
    }

    fn leaf_meta(mtime: i64) -> RevisionMetadata {
        RevisionMetadata::new(mtime, vec![], "public.text")
    }

    fn store_with_doc() -> (Arc<MemStore>, DocumentId, RevisionId) {
        let store = Arc::new(MemStore::new());
        let rev = store.insert_revision(b"folder", container_meta(100, vec![]));
        let doc = DocumentId::new();
        store.put_document(doc, rev);
        (store, doc, rev)
    }

    #[test]
    fn test_open_container_pushes_history() {
        let (store, doc, _) = store_with_doc();
        let mut browser = Browser::new(store);

        match browser.open_link(Link::doc(doc), UiState::new()) {
            Opened::Pushed(id) => assert_eq!(browser.history().current().unwrap().id(), id),
            other => panic!("expected push, got {other:?}"),
        }
    }

    #[test]
    fn test_open_leaf_is_external() {
        let store = Arc::new(MemStore::new());
        let rev = store.insert_revision(b"note", leaf_meta(10));
        let mut browser = Browser::new(store);

        match browser.open_link(Link::rev(rev), UiState::new()) {
            Opened::External { link, .. } => assert_eq!(link, Link::rev(rev)),
            other => panic!("expected external, got {other:?}"),
        }
        assert!(browser.history().is_empty(), "leaf opens leave history alone");
    }

    #[test]
    fn test_open_vanished_document_is_silent() {
        let (store, doc, _) = store_with_doc();
        store.remove_document(&doc);
        let mut browser = Browser::new(store);

        assert!(matches!(browser.open_link(Link::doc(doc), UiState::new()), Opened::Ignored));
        assert!(browser.history().is_empty());
    }

    #[test]
    fn test_open_unreachable_revision_is_silent() {
        let (store, doc, rev) = store_with_doc();
        store.set_available(&rev, false);
        let mut browser = Browser::new(store);

        assert!(matches!(browser.open_link(Link::doc(doc), UiState::new()), Opened::Ignored));
    }

    #[test]
    fn test_warp_requires_current_entry() {
        let (store, _, _) = store_with_doc();
        let mut browser = Browser::new(store);
        assert!(!browser.warp_on(UiState::new()));
        assert!(!browser.warp_active());
    }

    #[test]
    fn test_warp_explores_current_revision() {
        let (store, doc, rev) = store_with_doc();
        let mut browser = Browser::new(store);
        browser.push_link(Link::doc(doc), UiState::new());

        assert!(browser.warp_on(UiState::new()));
        let timeline = browser.warp().unwrap();
        assert_eq!(timeline.available(), &[rev]);

        browser.warp_off();
        assert!(!browser.warp_active());
    }

    #[test]
    fn test_failed_go_to_keeps_warp() {
        let (store, doc, _) = store_with_doc();
        let mut browser = Browser::new(store);
        let id = browser.push_link(Link::doc(doc), UiState::new());
        assert!(browser.warp_on(UiState::new()));

        // An id past the end of this history must not collapse the
        // explorer.
        let mut other = History::new();
        other.push(Link::doc(DocumentId::new()), UiState::new());
        let stray = other.push(Link::doc(DocumentId::new()), UiState::new());
        assert_eq!(browser.go_to(stray), Err(HistoryError::UnknownEntry(stray)));
        assert!(browser.warp_active(), "failed jump must leave warp untouched");

        browser.go_to(id).unwrap();
        assert!(!browser.warp_active());
    }

    #[test]
    fn test_history_navigation_collapses_warp() {
        let (store, doc, _) = store_with_doc();
        let other = store.insert_revision(b"folder2", container_meta(50, vec![]));
        let mut browser = Browser::new(Arc::clone(&store) as Arc<dyn StoreConnector>);
        browser.push_link(Link::doc(doc), UiState::new());
        browser.push_link(Link::rev(other), UiState::new());

        assert!(browser.warp_on(UiState::new()));
        browser.back();
        assert!(!browser.warp_active(), "navigating away leaves warp mode");
    }

    #[test]
    fn test_open_from_warp_collapses_into_history() {
        let store = Arc::new(MemStore::new());
        let parent = store.insert_revision(b"old folder", container_meta(10, vec![]));
        let head =
            store.insert_revision(b"new folder", container_meta(20, vec![parent]));
        let doc = DocumentId::new();
        store.put_document(doc, head);

        let mut browser = Browser::new(Arc::clone(&store) as Arc<dyn StoreConnector>);
        browser.push_link(Link::doc(doc), UiState::new());
        assert!(browser.warp_on(UiState::new()));

        // Walk back to the ancestor and open it.
        while browser.next_tick_deadline().is_some() {
            browser.tick();
        }
        browser.move_cursor(Direction::Past);
        match browser.open_current() {
            Opened::Pushed(_) => {}
            other => panic!("expected push, got {other:?}"),
        }
        assert!(!browser.warp_active(), "container open collapses the explorer");
        assert_eq!(browser.history().current().unwrap().link(), &Link::rev(parent));
    }

    #[test]
    fn test_open_leaf_from_warp_keeps_explorer() {
        // A container head whose ancestor is a plain leaf revision.
        let store = Arc::new(MemStore::new());
        let parent = store.insert_revision(b"leaf parent", leaf_meta(5));
        let folder =
            store.insert_revision(b"folder head", container_meta(30, vec![parent]));
        let doc = DocumentId::new();
        store.put_document(doc, folder);

        let mut browser = Browser::new(Arc::clone(&store) as Arc<dyn StoreConnector>);
        browser.push_link(Link::doc(doc), UiState::new());
        assert!(browser.warp_on(UiState::new()));
        while browser.next_tick_deadline().is_some() {
            browser.tick();
        }

        browser.move_cursor(Direction::Past);
        match browser.open_current() {
            Opened::External { link, .. } => assert_eq!(link, Link::rev(parent)),
            other => panic!("expected external, got {other:?}"),
        }
        assert!(browser.warp_active(), "leaf open keeps the explorer running");
    }

    #[test]
    fn test_warp_on_reports_initial_window() {
        #[derive(Default)]
        struct Capture {
            changes: Arc<std::sync::Mutex<Vec<crate::timeline::WindowChange>>>,
        }
        impl TimelineObserver for Capture {
            fn window_changed(&mut self, change: &crate::timeline::WindowChange) {
                self.changes.lock().unwrap().push(change.clone());
            }
        }

        let (store, doc, rev) = store_with_doc();
        let mut browser = Browser::new(store);
        browser.push_link(Link::doc(doc), UiState::new());

        let changes = Arc::new(std::sync::Mutex::new(Vec::new()));
        browser.set_warp_observer(Box::new(Capture { changes: changes.clone() }));
        assert!(browser.warp_on(UiState::new()));

        // A parentless root never arms the backlog, so the observer must
        // already have been told about the initial window.
        assert!(browser.next_tick_deadline().is_none());
        let recorded = changes.lock().unwrap();
        let first = recorded.first().expect("initial window reported");
        assert_eq!(first.entries.len(), 1);
        assert_eq!(first.entries[0].rev, rev);
    }

    #[test]
    fn test_warp_observer_survives_sessions() {
        struct Counter {
            seen: Arc<std::sync::Mutex<usize>>,
        }
        impl TimelineObserver for Counter {
            fn window_changed(&mut self, _change: &crate::timeline::WindowChange) {
                *self.seen.lock().unwrap() += 1;
            }
        }

        let store = Arc::new(MemStore::new());
        let parent = store.insert_revision(b"older", container_meta(10, vec![]));
        let head = store.insert_revision(b"head", container_meta(20, vec![parent]));
        let doc = DocumentId::new();
        store.put_document(doc, head);

        let mut browser = Browser::new(store);
        browser.push_link(Link::doc(doc), UiState::new());

        let seen = Arc::new(std::sync::Mutex::new(0));
        browser.set_warp_observer(Box::new(Counter { seen: seen.clone() }));

        assert!(browser.warp_on(UiState::new()));
        browser.warp_off();

        // Second session still reports through the same observer once a
        // reconciliation happens.
        assert!(browser.warp_on(UiState::new()));
        browser.tick();
        assert!(*seen.lock().unwrap() > 0);
        browser.warp_off();
    }
}
