//! Error types for store operations.

use thiserror::Error;

use revwarp_types::RevisionId;

/// Errors a store connector can report.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// The store cannot currently serve this revision.
    ///
    /// Expected whenever a revision has not yet propagated to this peer;
    /// callers convert it into a watch subscription, never into a user
    /// error.
    #[error("revision not found: {0:?}")]
    NotFound(RevisionId),

    /// Transport or local IO failure talking to the store.
    #[error("store IO error: {0}")]
    Io(String),
}

impl StoreError {
    /// Whether this is the expected "not reachable yet" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
