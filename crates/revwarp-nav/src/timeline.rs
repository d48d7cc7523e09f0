//! The TimeWarp explorer: a time-ordered view over a revision's ancestry.
//!
//! The timeline owns every [`RevisionNode`] discovered so far (the set
//! only grows), keeps the currently *available* subset sorted newest
//! first, and moves a cursor through it. Presentation sees a bounded
//! window — the cursor plus its two nearest predecessors — and is told
//! which entries enter and leave it on each recomputation.
//!
//! All methods run on the single control thread; availability
//! notifications and backlog ticks are fed in by the embedding event
//! loop ([`crate::driver`] in the async case, tests directly).

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::time::Instant;
use tracing::{debug, trace};

use revwarp_store::{AvailabilityChange, StoreConnector};
use revwarp_types::{Link, RevisionId, UiState};

use crate::backlog::Backlog;
use crate::constants::WINDOW_SIZE;
use crate::node::RevisionNode;

/// Which way the cursor moves through time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Direction {
    /// Toward the next older revision.
    Past,
    /// Toward the next newer revision.
    Present,
}

/// One slot of the visible window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowEntry {
    pub rev: RevisionId,
    /// 0 = cursor, 1..= the predecessors behind it.
    pub position: usize,
    /// Entered the window in this recomputation (fade in at `position`).
    pub is_entering: bool,
}

/// Reconciliation notice sent after every recomputation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WindowChange {
    /// The window, cursor first.
    pub entries: Vec<WindowEntry>,
    /// Revisions that dropped out of the window (fade out).
    pub leaving: Vec<RevisionId>,
    /// Cursor motion that caused this change: -1 toward the past,
    /// +1 toward the present, 0 none.
    pub motion: i8,
    /// UI state the entry at position 0 should restore.
    pub state: UiState,
}

/// Presentation-side hooks of the timeline.
pub trait TimelineObserver: Send {
    /// Capture the live view's UI state before the cursor leaves it.
    /// `None` keeps the last reported snapshot.
    fn snapshot_state(&mut self) -> Option<UiState> {
        None
    }

    /// The visible window was reconciled.
    fn window_changed(&mut self, change: &WindowChange) {
        let _ = change;
    }
}

/// Ancestry explorer over one root revision.
pub struct Timeline {
    store: Arc<dyn StoreConnector>,
    /// Every discovered revision, in discovery order. Grows monotonically
    /// until teardown.
    nodes: IndexMap<RevisionId, RevisionNode>,
    backlog: Backlog,
    /// Available revisions, newest first. Derived by [`recompute`](Self::recompute).
    avail: Vec<RevisionId>,
    /// Current window, cursor first. Derived.
    visible: Vec<RevisionId>,
    /// The cursor's revision. `None` until anything is available.
    current: Option<RevisionId>,
    /// Last known UI state of the live view, carried across cursor moves.
    state: UiState,
    observer: Option<Box<dyn TimelineObserver>>,
}

impl Timeline {
    /// Start exploring from `root`, usually the revision the browser is
    /// currently showing.
    pub fn new(store: Arc<dyn StoreConnector>, root: RevisionId, state: UiState) -> Self {
        let mut timeline = Self {
            store,
            nodes: IndexMap::new(),
            backlog: Backlog::new(),
            avail: Vec::new(),
            visible: Vec::new(),
            current: None,
            state,
            observer: None,
        };
        timeline.insert_node(root);
        timeline.reconcile(0);
        timeline
    }

    pub fn set_observer(&mut self, observer: Box<dyn TimelineObserver>) {
        self.observer = Some(observer);
    }

    pub fn take_observer(&mut self) -> Option<Box<dyn TimelineObserver>> {
        self.observer.take()
    }

    /// Available revisions, newest first.
    pub fn available(&self) -> &[RevisionId] {
        &self.avail
    }

    /// The visible window, cursor first.
    pub fn visible_window(&self) -> &[RevisionId] {
        &self.visible
    }

    /// Cursor index into [`available`](Self::available), if anything is
    /// available.
    pub fn cursor(&self) -> Option<usize> {
        let current = self.current?;
        self.avail.iter().position(|r| *r == current)
    }

    pub fn current(&self) -> Option<RevisionId> {
        self.current
    }

    pub fn node(&self, rev: &RevisionId) -> Option<&RevisionNode> {
        self.nodes.get(rev)
    }

    /// Number of discovered revisions (available or not).
    pub fn discovered(&self) -> usize {
        self.nodes.len()
    }

    /// When the next backlog tick is due.
    pub fn next_tick_deadline(&self) -> Option<Instant> {
        self.backlog.deadline()
    }

    /// Presentation reports the live view's current UI state.
    pub fn update_view_state(&mut self, state: UiState) {
        self.state = state;
    }

    /// Route an availability notification to its node.
    pub fn handle_change(&mut self, change: AvailabilityChange) {
        let store = Arc::clone(&self.store);
        let Some(node) = self.nodes.get_mut(&change.rev) else {
            // Not ours (stale watch of a torn-down sibling, for instance).
            return;
        };
        let outcome = node.handle_event(change.event, &*store);
        if let Some(parents) = outcome.parents {
            self.backlog.extend(parents);
        }
        if outcome.changed {
            self.reconcile(0);
        }
    }

    /// Process one backlog batch: instantiate up to the batch limit of
    /// new nodes, then re-arm the cooldown if ids are still queued.
    pub fn tick(&mut self) {
        let batch = self.backlog.take_batch();
        let mut created = false;
        for rev in batch {
            created |= self.insert_node(rev);
        }
        self.backlog.rearm_if_pending();
        if created {
            self.reconcile(0);
        }
    }

    /// Move the cursor one step through time; guarded no-op at either
    /// boundary and while nothing is available.
    pub fn move_cursor(&mut self, direction: Direction) {
        match direction {
            Direction::Past => self.move_past(),
            Direction::Present => self.move_present(),
        }
    }

    /// Resolve the cursor to a pinned revision link plus the state the
    /// view should reopen with. `None` while nothing is available.
    pub fn open(&mut self) -> Option<(Link, UiState)> {
        let current = self.current?;
        self.capture_state();
        Some((Link::rev(current), self.state.clone()))
    }

    /// Re-derive the available sequence and reconcile the window.
    ///
    /// Normally driven by notifications and ticks; calling it again with
    /// no intervening change is harmless (same sequence, same cursor).
    pub fn recompute(&mut self) {
        self.reconcile(0);
    }

    fn move_past(&mut self) {
        // The next older entry is the window slot behind the cursor.
        if self.visible.len() < 2 {
            return;
        }
        self.capture_state();
        self.current = Some(self.visible[1]);
        self.reconcile(-1);
    }

    fn move_present(&mut self) {
        let Some(index) = self.cursor() else {
            return;
        };
        if index == 0 {
            return;
        }
        self.capture_state();
        self.current = Some(self.avail[index - 1]);
        self.reconcile(1);
    }

    /// Re-derive the available sequence, clamp the cursor, reconcile the
    /// window, and notify the observer. Idempotent when nothing changed
    /// in between.
    fn reconcile(&mut self, motion: i8) {
        // Sort newest first; ties broken by revision id so the order is a
        // deterministic total order across recomputations.
        let mut avail: Vec<(i64, RevisionId)> = self
            .nodes
            .values()
            .filter(|n| n.is_available())
            .filter_map(|n| n.mtime().map(|mtime| (mtime, n.rev())))
            .collect();
        avail.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        self.avail = avail.into_iter().map(|(_, rev)| rev).collect();

        // Keep the cursor on a member of the available set; if its node
        // dropped out, snap to the newest.
        let still_there = self.current.is_some_and(|c| self.avail.contains(&c));
        if !still_there {
            if self.current.is_some() {
                debug!("cursor revision became unavailable, snapping to newest");
                self.capture_state();
            }
            self.current = self.avail.first().copied();
        }

        let index = self.cursor().unwrap_or(0);
        let end = (index + WINDOW_SIZE).min(self.avail.len());
        let old = std::mem::take(&mut self.visible);
        self.visible = self.avail.get(index..end).unwrap_or(&[]).to_vec();

        let leaving: Vec<RevisionId> =
            old.iter().filter(|rev| !self.visible.contains(rev)).copied().collect();
        let entries: Vec<WindowEntry> = self
            .visible
            .iter()
            .enumerate()
            .map(|(position, rev)| WindowEntry {
                rev: *rev,
                position,
                is_entering: !old.contains(rev),
            })
            .collect();

        // Every window member restores the carried view state when it
        // reaches the front.
        for rev in &self.visible {
            if let Some(node) = self.nodes.get_mut(rev) {
                node.set_ui_state(self.state.clone());
            }
        }

        trace!(
            available = self.avail.len(),
            window = self.visible.len(),
            cursor = index,
            motion,
            "timeline recomputed"
        );

        if let Some(observer) = self.observer.as_mut() {
            let change =
                WindowChange { entries, leaving, motion, state: self.state.clone() };
            observer.window_changed(&change);
        }
    }

    /// Create the node for a newly-discovered revision; false if it was
    /// already known.
    fn insert_node(&mut self, rev: RevisionId) -> bool {
        if self.nodes.contains_key(&rev) {
            return false;
        }
        let store = Arc::clone(&self.store);
        let (node, outcome) = RevisionNode::new(rev, &*store);
        self.nodes.insert(rev, node);
        if let Some(parents) = outcome.parents {
            self.backlog.extend(parents);
        }
        true
    }

    fn capture_state(&mut self) {
        if let Some(observer) = self.observer.as_mut()
            && let Some(state) = observer.snapshot_state()
        {
            self.state = state;
        }
        // Remember it on the node being left as well, so a later return
        // finds its last state even without an observer round-trip.
        if let Some(current) = self.current
            && let Some(node) = self.nodes.get_mut(&current)
        {
            node.set_ui_state(self.state.clone());
        }
    }
}

impl Drop for Timeline {
    fn drop(&mut self) {
        // Release every watch so no notification fires into freed state.
        let store = Arc::clone(&self.store);
        for node in self.nodes.values_mut() {
            node.teardown(&*store);
        }
    }
}
