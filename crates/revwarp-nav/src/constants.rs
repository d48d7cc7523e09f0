//! Tuning constants for the navigation core.
//!
//! Centralizes hardcoded values for easier configuration and documentation.

use std::time::Duration;

/// Revisions discovered per backlog tick.
///
/// Bounds how many store queries a deep ancestor chain can trigger at
/// once.
pub const BACKLOG_BATCH: usize = 3;

/// Cooldown between backlog ticks. Single-shot and debounced: a pending
/// tick is never re-armed by further discoveries.
pub const BACKLOG_COOLDOWN: Duration = Duration::from_millis(100);

/// Entries in the visible window: the cursor plus its two nearest
/// predecessors.
pub const WINDOW_SIZE: usize = 3;

/// Buffered browser events per subscriber before lag kicks in.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;
