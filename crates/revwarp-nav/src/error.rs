//! Error types for the navigation core.

use thiserror::Error;

use revwarp_store::StoreError;
use revwarp_types::Link;

use crate::history::EntryId;

/// Errors during navigation operations.
///
/// These never reach the presentation layer: the browser absorbs them
/// into "nothing happened" and logs at debug level.
#[derive(Error, Debug)]
pub enum NavError {
    /// A link resolved to no candidate revisions (document gone).
    #[error("link resolved to no candidates: {0}")]
    LinkResolution(Link),

    /// The store failed underneath a navigation step.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from history operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// `go_to` on an entry that is not in the stack — a programming
    /// error, loud in tests rather than silently ignored.
    #[error("history entry not found: {0:?}")]
    UnknownEntry(EntryId),
}
