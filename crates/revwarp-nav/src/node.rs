//! Per-revision availability state machine.
//!
//! One `RevisionNode` exists per discovered revision id, owned by the
//! timeline. A node resolves its metadata once, reports the parents it
//! learned exactly once, and afterwards only tracks whether the store can
//! still serve the revision.
//!
//! Resolve failures are the normal case (the revision has not reached
//! this peer yet) and never escalate — they convert into a watch
//! subscription and drive the state machine, nothing more.

use tracing::{debug, trace};

use revwarp_store::{AvailabilityEvent, StoreConnector, WatchHandle};
use revwarp_types::{Availability, RevisionId, RevisionMetadata, UiState, UnixMillis};

/// What a resolve attempt or notification changed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct NodeOutcome {
    /// Availability flipped; the timeline must recompute its candidate
    /// set.
    pub changed: bool,
    /// Parents learned from first-time metadata, destined for the
    /// discovery backlog. Reported at most once per node, ever.
    pub parents: Option<Vec<RevisionId>>,
}

/// One revision as the timeline sees it.
pub struct RevisionNode {
    rev: RevisionId,
    availability: Availability,
    /// Present once the node has been `Available` at least once.
    meta: Option<RevisionMetadata>,
    ui_state: UiState,
    parents_reported: bool,
    watch: Option<WatchHandle>,
}

impl RevisionNode {
    /// Create a node and attempt an immediate resolve.
    ///
    /// Success lands in `Available` with the parents in the outcome;
    /// failure subscribes a watch and lands in `Watching`.
    pub fn new(rev: RevisionId, store: &dyn StoreConnector) -> (Self, NodeOutcome) {
        let mut node = Self {
            rev,
            availability: Availability::Unknown,
            meta: None,
            ui_state: UiState::new(),
            parents_reported: false,
            watch: None,
        };
        let outcome = node.resolve(store);
        (node, outcome)
    }

    pub fn rev(&self) -> RevisionId {
        self.rev
    }

    pub fn availability(&self) -> Availability {
        self.availability
    }

    pub fn is_available(&self) -> bool {
        self.availability.is_available()
    }

    /// Modification time, known once metadata has been fetched.
    pub fn mtime(&self) -> Option<UnixMillis> {
        self.meta.as_ref().map(|m| m.mtime)
    }

    pub fn meta(&self) -> Option<&RevisionMetadata> {
        self.meta.as_ref()
    }

    pub fn ui_state(&self) -> &UiState {
        &self.ui_state
    }

    pub fn set_ui_state(&mut self, state: UiState) {
        self.ui_state = state;
    }

    /// Apply an availability notification from the store.
    pub fn handle_event(
        &mut self,
        event: AvailabilityEvent,
        store: &dyn StoreConnector,
    ) -> NodeOutcome {
        match event {
            AvailabilityEvent::Appeared => self.resolve(store),
            AvailabilityEvent::Disappeared => {
                debug!(rev = %self.rev.short(), "revision disappeared");
                let changed = self.availability != Availability::Unavailable;
                self.availability = Availability::Unavailable;
                self.ensure_watch(store);
                NodeOutcome { changed, ..Default::default() }
            }
        }
    }

    /// Release the watch subscription. Must run before the owning
    /// timeline drops the node, so no dangling notification fires into
    /// freed state.
    pub fn teardown(&mut self, store: &dyn StoreConnector) {
        self.drop_watch(store);
    }

    /// Attempt to resolve against the store and step the state machine.
    fn resolve(&mut self, store: &dyn StoreConnector) -> NodeOutcome {
        if self.meta.is_some() {
            // Seen before: the content is immutable, only reachability is
            // in question.
            if store.lookup_rev(&self.rev) {
                let changed = self.availability != Availability::Available;
                self.availability = Availability::Available;
                self.drop_watch(store);
                NodeOutcome { changed, ..Default::default() }
            } else {
                let changed = self.availability != Availability::Unavailable;
                self.availability = Availability::Unavailable;
                self.ensure_watch(store);
                NodeOutcome { changed, ..Default::default() }
            }
        } else {
            match store.stat(&self.rev) {
                Ok(meta) => {
                    trace!(rev = %self.rev.short(), mtime = meta.mtime, "revision resolved");
                    let parents = if self.parents_reported {
                        None
                    } else {
                        self.parents_reported = true;
                        Some(meta.parents.clone())
                    };
                    self.meta = Some(meta);
                    self.availability = Availability::Available;
                    self.drop_watch(store);
                    NodeOutcome { changed: true, parents }
                }
                Err(err) => {
                    trace!(rev = %self.rev.short(), %err, "resolve failed, watching");
                    self.ensure_watch(store);
                    if self.availability == Availability::Unknown {
                        self.availability = Availability::Watching;
                    }
                    NodeOutcome::default()
                }
            }
        }
    }

    fn ensure_watch(&mut self, store: &dyn StoreConnector) {
        if self.watch.is_none() {
            self.watch = Some(store.watch(self.rev));
        }
    }

    fn drop_watch(&mut self, store: &dyn StoreConnector) {
        if let Some(handle) = self.watch.take() {
            store.unwatch(handle);
        }
    }
}
