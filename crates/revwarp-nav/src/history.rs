//! Linear back/forward navigation history.
//!
//! Classic browser-history semantics: a stack of visited links with a
//! cursor, where pushing truncates any forward entries past the cursor.
//! Each entry carries a UI-state snapshot and a display label for
//! navigation menus.
//!
//! Leaving an entry is a two-phase contract: the observer receives the
//! entry read-only and returns a [`LeaveUpdate`]; the history applies it
//! to the entry before it goes inactive. This replaces write-back through
//! shared mutable aliasing with an explicit hand-off.

use tracing::trace;

use revwarp_types::{Link, UiState};

use crate::error::HistoryError;

/// Stable identity of one history entry, usable as a menu key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntryId(u64);

/// One visited link with its presentation snapshot.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    id: EntryId,
    link: Link,
    display_text: String,
    ui_state: UiState,
}

impl HistoryEntry {
    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn link(&self) -> &Link {
        &self.link
    }

    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    pub fn ui_state(&self) -> &UiState {
        &self.ui_state
    }
}

/// Snapshot handed back by an observer when an entry is left.
///
/// `None` fields leave the entry untouched.
#[derive(Clone, Debug, Default)]
pub struct LeaveUpdate {
    pub ui_state: Option<UiState>,
    pub display_text: Option<String>,
}

/// Notifications around the current history entry.
pub trait HistoryObserver: Send {
    /// The cursor is about to leave this entry. The returned update is
    /// applied to the entry before it becomes inactive.
    fn leave(&mut self, entry: &HistoryEntry) -> LeaveUpdate {
        let _ = entry;
        LeaveUpdate::default()
    }

    /// The cursor arrived at this entry.
    fn enter(&mut self, entry: &HistoryEntry) {
        let _ = entry;
    }
}

/// Back/forward stack of visited links.
#[derive(Default)]
pub struct History {
    items: Vec<HistoryEntry>,
    /// Index of the current entry. `None` only while the stack is empty.
    current: Option<usize>,
    next_id: u64,
    observer: Option<Box<dyn HistoryObserver>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the sole leave/enter extension point.
    pub fn set_observer(&mut self, observer: Box<dyn HistoryObserver>) {
        self.observer = Some(observer);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.current.map(|i| &self.items[i])
    }

    pub fn can_go_back(&self) -> bool {
        self.current.is_some_and(|i| i > 0)
    }

    pub fn can_go_forward(&self) -> bool {
        self.current.is_some_and(|i| i + 1 < self.items.len())
    }

    /// All entries, oldest first.
    pub fn items(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.items.iter()
    }

    /// Visit a new link, truncating any forward history.
    pub fn push(&mut self, link: Link, state: UiState) -> EntryId {
        self.emit_leave();

        let id = EntryId(self.next_id);
        self.next_id += 1;
        let entry = HistoryEntry {
            id,
            link,
            display_text: String::new(),
            ui_state: state,
        };

        let insert_at = self.current.map_or(0, |i| i + 1);
        self.items.truncate(insert_at);
        self.items.push(entry);
        self.current = Some(insert_at);
        trace!(link = %link.short(), index = insert_at, "history push");

        self.emit_enter();
        id
    }

    /// Step to the previous entry; no-op at the start.
    pub fn back(&mut self) {
        if !self.can_go_back() {
            return;
        }
        self.emit_leave();
        self.current = self.current.map(|i| i - 1);
        self.emit_enter();
    }

    /// Step to the next entry; no-op at the end.
    pub fn forward(&mut self) {
        if !self.can_go_forward() {
            return;
        }
        self.emit_leave();
        self.current = self.current.map(|i| i + 1);
        self.emit_enter();
    }

    /// Jump straight to a menu-selected entry.
    pub fn go_to(&mut self, id: EntryId) -> Result<(), HistoryError> {
        let index = self
            .items
            .iter()
            .position(|e| e.id == id)
            .ok_or(HistoryError::UnknownEntry(id))?;
        self.emit_leave();
        self.current = Some(index);
        self.emit_enter();
        Ok(())
    }

    /// Up to `max` entries strictly before the cursor, oldest → newest,
    /// nearest the cursor. For back-navigation menus.
    pub fn back_items(&self, max: usize) -> Vec<&HistoryEntry> {
        let Some(current) = self.current else {
            return Vec::new();
        };
        let start = current.saturating_sub(max);
        self.items[start..current].iter().collect()
    }

    /// Up to `max` entries strictly after the cursor, next → furthest.
    /// For forward-navigation menus.
    pub fn forward_items(&self, max: usize) -> Vec<&HistoryEntry> {
        let Some(current) = self.current else {
            return Vec::new();
        };
        self.items[current + 1..].iter().take(max).collect()
    }

    /// Update the current entry's menu label (e.g. from fetched document
    /// metadata).
    pub fn set_display_text(&mut self, text: impl Into<String>) {
        if let Some(i) = self.current {
            self.items[i].display_text = text.into();
        }
    }

    /// Apply a leave-style update to any entry, for presentation layers
    /// that report snapshots asynchronously.
    pub fn update_entry(&mut self, id: EntryId, update: LeaveUpdate) -> Result<(), HistoryError> {
        let entry = self
            .items
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(HistoryError::UnknownEntry(id))?;
        apply_update(entry, update);
        Ok(())
    }

    fn emit_leave(&mut self) {
        let (Some(observer), Some(i)) = (self.observer.as_mut(), self.current) else {
            return;
        };
        let update = observer.leave(&self.items[i]);
        apply_update(&mut self.items[i], update);
    }

    fn emit_enter(&mut self) {
        if let (Some(observer), Some(i)) = (self.observer.as_mut(), self.current) {
            observer.enter(&self.items[i]);
        }
    }
}

fn apply_update(entry: &mut HistoryEntry, update: LeaveUpdate) {
    if let Some(state) = update.ui_state {
        entry.ui_state = state;
    }
    if let Some(text) = update.display_text {
        entry.display_text = text;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use revwarp_types::DocumentId;

    use super::*;

    fn link(n: u8) -> Link {
        Link::doc(DocumentId::from_bytes([n; 16]))
    }

    /// Records leave/enter links and stamps a label on every leave.
    struct Recorder {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl HistoryObserver for Recorder {
        fn leave(&mut self, entry: &HistoryEntry) -> LeaveUpdate {
            self.log.lock().unwrap().push(format!("leave {}", entry.link().short()));
            LeaveUpdate {
                display_text: Some(format!("was {}", entry.link().short())),
                ..Default::default()
            }
        }

        fn enter(&mut self, entry: &HistoryEntry) {
            self.log.lock().unwrap().push(format!("enter {}", entry.link().short()));
        }
    }

    #[test]
    fn test_empty_history() {
        let h = History::new();
        assert!(h.is_empty());
        assert!(h.current().is_none());
        assert!(!h.can_go_back());
        assert!(!h.can_go_forward());
        assert!(h.back_items(10).is_empty());
        assert!(h.forward_items(10).is_empty());
    }

    #[test]
    fn test_back_forward_restores_entry() {
        let mut h = History::new();
        let a = h.push(link(1), UiState::new());
        let b = h.push(link(2), UiState::new());

        assert!(h.can_go_back());
        assert!(!h.can_go_forward());

        h.back();
        assert_eq!(h.current().unwrap().id(), a);
        assert!(!h.can_go_back());
        assert!(h.can_go_forward());

        h.forward();
        assert_eq!(h.current().unwrap().id(), b);
    }

    #[test]
    fn test_guards_match_cursor_position() {
        let mut h = History::new();
        for n in 1..=4 {
            h.push(link(n), UiState::new());
        }
        // Walk the whole stack checking the guards at every position.
        for _ in 0..4 {
            let at_start = h.current().unwrap().id() == h.items().next().unwrap().id();
            assert_eq!(h.can_go_back(), !at_start);
            h.back();
        }
        assert!(!h.can_go_back());
        assert!(h.can_go_forward());
    }

    #[test]
    fn test_push_after_back_truncates_forward() {
        let mut h = History::new();
        let a = h.push(link(1), UiState::new());
        let _b = h.push(link(2), UiState::new());
        let _c = h.push(link(3), UiState::new());

        h.back();
        h.back();
        let d = h.push(link(4), UiState::new());

        let ids: Vec<_> = h.items().map(|e| e.id()).collect();
        assert_eq!(ids, vec![a, d]);
        assert_eq!(h.current().unwrap().id(), d);
        assert!(!h.can_go_forward());
    }

    #[test]
    fn test_no_op_at_boundaries() {
        let mut h = History::new();
        h.back(); // empty — nothing to do
        h.forward();

        let a = h.push(link(1), UiState::new());
        h.back();
        h.forward();
        assert_eq!(h.current().unwrap().id(), a);
    }

    #[test]
    fn test_go_to_absent_id_is_unknown_entry() {
        let mut h = History::new();
        let a = h.push(link(1), UiState::new());
        h.back(); // no-op, cursor at a
        let b = h.push(link(2), UiState::new());
        h.back();
        // Truncate b away, then try to jump to it.
        h.push(link(3), UiState::new());
        assert_eq!(h.go_to(b), Err(HistoryError::UnknownEntry(b)));
        assert!(h.go_to(a).is_ok());
        assert_eq!(h.current().unwrap().id(), a);
    }

    #[test]
    fn test_menu_items_order_and_bound() {
        let mut h = History::new();
        let ids: Vec<_> = (1..=5).map(|n| h.push(link(n), UiState::new())).collect();
        h.back(); // cursor at ids[3]

        let back: Vec<_> = h.back_items(2).iter().map(|e| e.id()).collect();
        assert_eq!(back, vec![ids[1], ids[2]]);
        let back_all: Vec<_> = h.back_items(10).iter().map(|e| e.id()).collect();
        assert_eq!(back_all, vec![ids[0], ids[1], ids[2]]);

        let fwd: Vec<_> = h.forward_items(10).iter().map(|e| e.id()).collect();
        assert_eq!(fwd, vec![ids[4]]);
    }

    #[test]
    fn test_observer_sequence_and_leave_update() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut h = History::new();
        h.set_observer(Box::new(Recorder { log: log.clone() }));

        h.push(link(1), UiState::new());
        h.push(link(2), UiState::new());
        h.back();

        let events = log.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                format!("enter {}", link(1).short()),
                format!("leave {}", link(1).short()),
                format!("enter {}", link(2).short()),
                format!("leave {}", link(2).short()),
                format!("enter {}", link(1).short()),
            ]
        );

        // The leave update was applied to the entry that was left.
        let labels: Vec<_> = h.items().map(|e| e.display_text().to_string()).collect();
        assert_eq!(labels[0], format!("was {}", link(1).short()));
        assert_eq!(labels[1], format!("was {}", link(2).short()));
    }

    #[test]
    fn test_update_entry_write_back() {
        let mut h = History::new();
        let a = h.push(link(1), UiState::new());

        let mut state = UiState::new();
        state.insert("scroll", serde_json::json!(7));
        h.update_entry(
            a,
            LeaveUpdate { ui_state: Some(state.clone()), display_text: Some("Home".into()) },
        )
        .unwrap();

        let entry = h.current().unwrap();
        assert_eq!(entry.ui_state(), &state);
        assert_eq!(entry.display_text(), "Home");
    }

    #[test]
    fn test_set_display_text_on_current() {
        let mut h = History::new();
        h.push(link(1), UiState::new());
        h.set_display_text("My Documents @ 2024");
        assert_eq!(h.current().unwrap().display_text(), "My Documents @ 2024");
    }
}
