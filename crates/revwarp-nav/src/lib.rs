//! Navigation core for revwarp.
//!
//! Two engines live here, both synchronous and framework-free so they can
//! be unit-tested without a runtime:
//!
//! - [`History`] — a linear back/forward stack over visited links with
//!   per-entry UI-state snapshots and leave/enter notifications.
//! - [`Timeline`] — the TimeWarp explorer: discovers a revision's
//!   ancestor chain as availability notifications trickle in, keeps the
//!   reachable subset time-ordered, and moves a cursor through it with a
//!   bounded three-entry visible window.
//!
//! [`Browser`] wires the two over a shared [`StoreConnector`]
//! (container links push onto the history, leaf documents are handed to
//! an external viewer), and [`driver`] runs a `Browser` inside a tokio
//! task behind a clonable [`BrowserHandle`].
//!
//! ```text
//!   BrowserHandle ──mpsc──▶ driver task ──▶ Browser
//!                                            ├── History   (back/forward)
//!   BrowserEvent ◀─broadcast─┘               └── Timeline  (TimeWarp)
//!                                                  │ watch/stat
//!                                                  ▼
//!                                            StoreConnector
//! ```
//!
//! [`StoreConnector`]: revwarp_store::StoreConnector

pub mod backlog;
pub mod browser;
pub mod constants;
pub mod driver;
pub mod error;
pub mod history;
pub mod node;
pub mod timeline;

pub use browser::{Browser, Opened};
pub use driver::{BrowserEvent, BrowserHandle, DriverError, spawn_browser};
pub use error::{HistoryError, NavError};
pub use history::{EntryId, History, HistoryEntry, HistoryObserver, LeaveUpdate};
pub use node::RevisionNode;
pub use timeline::{Direction, Timeline, TimelineObserver, WindowChange, WindowEntry};
