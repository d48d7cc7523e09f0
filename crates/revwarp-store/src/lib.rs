//! Store-connector interface for revwarp.
//!
//! The navigation core never talks to a concrete store; it talks to the
//! [`StoreConnector`] trait: synchronous metadata resolution plus
//! asynchronous availability notifications.
//!
//! ```text
//!   core                        connector                     store
//!   ┌──────────────┐  stat/lookup/resolve_link  ┌─────────────────┐
//!   │ RevisionNode │ ─────────────────────────▶ │ local cache or  │
//!   │ Timeline     │  watch/unwatch             │ network peers   │
//!   │              │ ◀──────────────────────────│                 │
//!   └──────────────┘   broadcast of             └─────────────────┘
//!                      AvailabilityChange
//! ```
//!
//! `stat` either answers from local knowledge or fails immediately with
//! [`StoreError::NotFound`] — a steady-state condition, not an exception.
//! There are no in-flight resolves to cancel.
//!
//! [`MemStore`] is the in-memory reference implementation used by unit
//! tests and demos.

mod connector;
mod error;
mod memory;

pub use connector::{AvailabilityChange, AvailabilityEvent, StoreConnector, WatchHandle};
pub use error::StoreError;
pub use memory::MemStore;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
