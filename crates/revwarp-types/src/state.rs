//! Presentation-owned UI-state snapshots and revision availability.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque key-value snapshot of presentation state (scroll position,
/// applied filters, column layout, ...).
///
/// The core never interprets the contents; it only carries snapshots
/// across navigation so a view can restore itself after a jump.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UiState(serde_json::Map<String, Value>);

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Where a revision stands with the store, from this peer's view.
///
/// ```text
/// Unknown ──▶ Watching ──▶ Available ◀──▶ Unavailable
///                (subscribed,     (metadata    (subscribed again,
///                 not resolved)    fetched)     store lost it)
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash,
    Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum Availability {
    /// Initial state, nothing attempted yet.
    #[default]
    Unknown,
    /// Subscribed to availability changes, never resolved so far.
    Watching,
    /// Metadata fetched, revision currently served by the store.
    Available,
    /// Was reachable (or watched) but the store cannot serve it now.
    Unavailable,
}

impl Availability {
    /// Whether the revision belongs in the time-ordered candidate set.
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}
