//! The [`StoreConnector`] trait and availability change events.

use tokio::sync::broadcast;

use revwarp_types::{Link, RevisionId, RevisionMetadata};

use crate::error::StoreError;

/// What happened to a watched revision's availability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum AvailabilityEvent {
    /// The store can now serve the revision.
    Appeared,
    /// The store lost its last source for the revision.
    Disappeared,
}

/// An availability notification for one watched revision.
///
/// Delivery is asynchronous. Events for a single revision id arrive in
/// order; there is no ordering guarantee across different ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvailabilityChange {
    pub rev: RevisionId,
    pub event: AvailabilityEvent,
}

/// Token identifying one watch registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WatchHandle(pub(crate) u64);

/// Interface the navigation core consumes.
///
/// Implementations must be cheap to call from the single control thread:
/// `stat` answers from local knowledge or fails with
/// [`StoreError::NotFound`] immediately.
pub trait StoreConnector: Send + Sync {
    /// Fetch a revision's metadata.
    fn stat(&self, rev: &RevisionId) -> Result<RevisionMetadata, StoreError>;

    /// Whether any source can currently serve the revision.
    fn lookup_rev(&self, rev: &RevisionId) -> bool;

    /// Candidate revisions a link resolves to.
    ///
    /// Empty means the document is gone; callers abort the triggering
    /// navigation and nothing else.
    fn resolve_link(&self, link: &Link) -> Vec<RevisionId>;

    /// Start watching a revision's availability.
    ///
    /// Changes for watched revisions arrive on the stream returned by
    /// [`subscribe_changes`](Self::subscribe_changes). Each handle must be
    /// released with [`unwatch`](Self::unwatch); a dropped handle keeps
    /// the watch alive on the store side.
    fn watch(&self, rev: RevisionId) -> WatchHandle;

    /// Release one watch registration.
    fn unwatch(&self, handle: WatchHandle);

    /// Subscribe to availability changes of watched revisions.
    fn subscribe_changes(&self) -> broadcast::Receiver<AvailabilityChange>;
}
