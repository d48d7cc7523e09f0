//! Async driver: runs a [`Browser`] inside a tokio task.
//!
//! Provides a clonable [`BrowserHandle`] whose methods send commands over
//! an mpsc channel and await oneshot replies, while the task multiplexes
//! commands with store availability notifications and backlog ticks.
//! Outbound notifications (history enter/leave, window changes, external
//! opens) fan out over a broadcast channel.
//!
//! ```text
//!   BrowserHandle (Send+Sync)     mpsc      driver task
//!   ┌─────────────────────┐  ────────▶  ┌──────────────────────────┐
//!   │ .open_link()        │             │ Browser                  │
//!   │ .warp_on()          │  ◀────────  │  + store change stream   │
//!   │ .move_cursor()      │   oneshot   │  + backlog tick timer    │
//!   └─────────────────────┘             └───────────┬──────────────┘
//!              ▲                                    │
//!              └────────── BrowserEvent ◀─broadcast─┘
//! ```

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, warn};

use revwarp_store::{AvailabilityChange, StoreConnector};
use revwarp_types::{Link, UiState};

use crate::browser::{Browser, Opened};
use crate::constants::EVENT_CHANNEL_CAPACITY;
use crate::error::HistoryError;
use crate::history::{EntryId, HistoryEntry, HistoryObserver, LeaveUpdate};
use crate::timeline::{Direction, TimelineObserver, WindowChange};

// ============================================================================
// Error Type
// ============================================================================

/// Errors from the driver task.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("browser driver shut down")]
    Shutdown,
    #[error(transparent)]
    History(#[from] HistoryError),
}

// ============================================================================
// Outbound Events
// ============================================================================

/// Notifications fanned out to every subscriber of a [`BrowserHandle`].
#[derive(Clone, Debug)]
pub enum BrowserEvent {
    /// The history cursor arrived at this entry; show it.
    Entered {
        id: EntryId,
        link: Link,
        state: UiState,
    },
    /// The history cursor is about to leave this entry. Presentation
    /// should capture its view state and report it back via
    /// [`BrowserHandle::update_entry`].
    Left { id: EntryId },
    /// The TimeWarp window was reconciled.
    WindowChanged(WindowChange),
    /// A leaf document was opened; hand it to an external viewer.
    OpenExternal { link: Link, state: UiState },
}

// ============================================================================
// Commands (internal)
// ============================================================================

/// Internal command sent from BrowserHandle → driver task via mpsc.
enum BrowserCommand {
    PushLink {
        link: Link,
        state: UiState,
        reply: oneshot::Sender<EntryId>,
    },
    OpenLink {
        link: Link,
        state: UiState,
        reply: oneshot::Sender<Opened>,
    },
    Back {
        reply: oneshot::Sender<()>,
    },
    Forward {
        reply: oneshot::Sender<()>,
    },
    GoTo {
        id: EntryId,
        reply: oneshot::Sender<Result<(), HistoryError>>,
    },
    BackItems {
        max: usize,
        reply: oneshot::Sender<Vec<HistoryEntry>>,
    },
    ForwardItems {
        max: usize,
        reply: oneshot::Sender<Vec<HistoryEntry>>,
    },
    CurrentEntry {
        reply: oneshot::Sender<Option<HistoryEntry>>,
    },
    UpdateEntry {
        id: EntryId,
        update: LeaveUpdate,
        reply: oneshot::Sender<Result<(), HistoryError>>,
    },
    // Fire-and-forget: caption updates need no ordering guarantee.
    SetDisplayText {
        text: String,
    },
    WarpOn {
        state: UiState,
        reply: oneshot::Sender<bool>,
    },
    WarpOff {
        reply: oneshot::Sender<()>,
    },
    MoveCursor {
        direction: Direction,
        reply: oneshot::Sender<()>,
    },
    OpenCurrent {
        reply: oneshot::Sender<Opened>,
    },
    UpdateViewState {
        state: UiState,
    },
}

// ============================================================================
// BrowserHandle (Send + Sync public API)
// ============================================================================

/// Send+Sync handle to a browser driver task.
///
/// Each method sends a command via mpsc and awaits the oneshot reply.
/// The handle can be cloned and shared across threads; dropping the last
/// clone shuts the task down.
#[derive(Clone)]
pub struct BrowserHandle {
    tx: mpsc::UnboundedSender<BrowserCommand>,
    events: broadcast::Sender<BrowserEvent>,
}

impl BrowserHandle {
    /// Subscribe to outbound notifications. Slow subscribers lag rather
    /// than block the driver.
    pub fn subscribe(&self) -> broadcast::Receiver<BrowserEvent> {
        self.events.subscribe()
    }

    // ── History ──────────────────────────────────────────────────────────

    /// Visit a link unconditionally (initial navigation, command line).
    pub async fn push_link(&self, link: Link, state: UiState) -> Result<EntryId, DriverError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(BrowserCommand::PushLink { link, state, reply })
            .map_err(|_| DriverError::Shutdown)?;
        rx.await.map_err(|_| DriverError::Shutdown)
    }

    /// Open a link with container dispatch; see [`Opened`].
    pub async fn open_link(&self, link: Link, state: UiState) -> Result<Opened, DriverError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(BrowserCommand::OpenLink { link, state, reply })
            .map_err(|_| DriverError::Shutdown)?;
        rx.await.map_err(|_| DriverError::Shutdown)
    }

    pub async fn back(&self) -> Result<(), DriverError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(BrowserCommand::Back { reply }).map_err(|_| DriverError::Shutdown)?;
        rx.await.map_err(|_| DriverError::Shutdown)
    }

    pub async fn forward(&self) -> Result<(), DriverError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(BrowserCommand::Forward { reply }).map_err(|_| DriverError::Shutdown)?;
        rx.await.map_err(|_| DriverError::Shutdown)
    }

    /// Jump to a history entry picked from a navigation menu.
    pub async fn go_to(&self, id: EntryId) -> Result<(), DriverError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(BrowserCommand::GoTo { id, reply }).map_err(|_| DriverError::Shutdown)?;
        Ok(rx.await.map_err(|_| DriverError::Shutdown)??)
    }

    /// Entries behind the cursor, oldest first (back menu).
    pub async fn back_items(&self, max: usize) -> Result<Vec<HistoryEntry>, DriverError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(BrowserCommand::BackItems { max, reply })
            .map_err(|_| DriverError::Shutdown)?;
        rx.await.map_err(|_| DriverError::Shutdown)
    }

    /// Entries ahead of the cursor, next first (forward menu).
    pub async fn forward_items(&self, max: usize) -> Result<Vec<HistoryEntry>, DriverError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(BrowserCommand::ForwardItems { max, reply })
            .map_err(|_| DriverError::Shutdown)?;
        rx.await.map_err(|_| DriverError::Shutdown)
    }

    pub async fn current_entry(&self) -> Result<Option<HistoryEntry>, DriverError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(BrowserCommand::CurrentEntry { reply })
            .map_err(|_| DriverError::Shutdown)?;
        rx.await.map_err(|_| DriverError::Shutdown)
    }

    /// Report a snapshot into an entry after a [`BrowserEvent::Left`].
    pub async fn update_entry(
        &self,
        id: EntryId,
        update: LeaveUpdate,
    ) -> Result<(), DriverError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(BrowserCommand::UpdateEntry { id, update, reply })
            .map_err(|_| DriverError::Shutdown)?;
        Ok(rx.await.map_err(|_| DriverError::Shutdown)??)
    }

    /// Caption the current entry once its document metadata arrives.
    pub fn set_display_text(&self, text: impl Into<String>) -> Result<(), DriverError> {
        self.tx
            .send(BrowserCommand::SetDisplayText { text: text.into() })
            .map_err(|_| DriverError::Shutdown)
    }

    // ── TimeWarp ─────────────────────────────────────────────────────────

    /// Enter warp mode on the current entry; false if it cannot start.
    pub async fn warp_on(&self, state: UiState) -> Result<bool, DriverError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(BrowserCommand::WarpOn { state, reply })
            .map_err(|_| DriverError::Shutdown)?;
        rx.await.map_err(|_| DriverError::Shutdown)
    }

    pub async fn warp_off(&self) -> Result<(), DriverError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(BrowserCommand::WarpOff { reply }).map_err(|_| DriverError::Shutdown)?;
        rx.await.map_err(|_| DriverError::Shutdown)
    }

    pub async fn move_cursor(&self, direction: Direction) -> Result<(), DriverError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(BrowserCommand::MoveCursor { direction, reply })
            .map_err(|_| DriverError::Shutdown)?;
        rx.await.map_err(|_| DriverError::Shutdown)
    }

    /// Open the revision under the warp cursor.
    pub async fn open_current(&self) -> Result<Opened, DriverError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(BrowserCommand::OpenCurrent { reply })
            .map_err(|_| DriverError::Shutdown)?;
        rx.await.map_err(|_| DriverError::Shutdown)
    }

    /// Report the warp view's live UI state (scroll, selection).
    pub fn update_view_state(&self, state: UiState) -> Result<(), DriverError> {
        self.tx
            .send(BrowserCommand::UpdateViewState { state })
            .map_err(|_| DriverError::Shutdown)
    }
}

// ============================================================================
// Observer forwarders (internal)
// ============================================================================

/// Forwards history enter/leave onto the event channel. Snapshots come
/// back asynchronously via [`BrowserHandle::update_entry`], so `leave`
/// itself never blocks on presentation.
struct HistoryForwarder {
    events: broadcast::Sender<BrowserEvent>,
}

impl HistoryObserver for HistoryForwarder {
    fn leave(&mut self, entry: &HistoryEntry) -> LeaveUpdate {
        let _ = self.events.send(BrowserEvent::Left { id: entry.id() });
        LeaveUpdate::default()
    }

    fn enter(&mut self, entry: &HistoryEntry) {
        let _ = self.events.send(BrowserEvent::Entered {
            id: entry.id(),
            link: *entry.link(),
            state: entry.ui_state().clone(),
        });
    }
}

/// Forwards timeline window reconciliations onto the event channel.
/// View-state snapshots arrive via [`BrowserHandle::update_view_state`].
struct WindowForwarder {
    events: broadcast::Sender<BrowserEvent>,
}

impl TimelineObserver for WindowForwarder {
    fn window_changed(&mut self, change: &WindowChange) {
        let _ = self.events.send(BrowserEvent::WindowChanged(change.clone()));
    }
}

// ============================================================================
// Driver task (internal)
// ============================================================================

struct BrowserDriver {
    browser: Browser,
    changes: broadcast::Receiver<AvailabilityChange>,
    events: broadcast::Sender<BrowserEvent>,
    /// Set once the store's change stream closes.
    changes_closed: bool,
}

impl BrowserDriver {
    /// Multiplex commands, availability notifications, and backlog ticks
    /// until the last handle is dropped.
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<BrowserCommand>) {
        loop {
            let deadline = self.browser.next_tick_deadline();
            tokio::select! {
                cmd = rx.recv() => {
                    let Some(cmd) = cmd else { break };
                    self.handle_command(cmd);
                }
                change = self.changes.recv(), if !self.changes_closed => {
                    match change {
                        Ok(change) => self.browser.handle_change(change),
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            warn!(missed, "availability notifications lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            // Store connector gone; history commands still work.
                            warn!("store change stream closed");
                            self.changes_closed = true;
                        }
                    }
                }
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)),
                    if deadline.is_some() =>
                {
                    self.browser.tick();
                }
            }
        }
        debug!("browser driver shutting down: all handles dropped");
    }

    fn handle_command(&mut self, cmd: BrowserCommand) {
        match cmd {
            // ── History ──────────────────────────────────────────────
            BrowserCommand::PushLink { link, state, reply } => {
                let _ = reply.send(self.browser.push_link(link, state));
            }
            BrowserCommand::OpenLink { link, state, reply } => {
                let opened = self.browser.open_link(link, state);
                self.report_open(&opened);
                let _ = reply.send(opened);
            }
            BrowserCommand::Back { reply } => {
                self.browser.back();
                let _ = reply.send(());
            }
            BrowserCommand::Forward { reply } => {
                self.browser.forward();
                let _ = reply.send(());
            }
            BrowserCommand::GoTo { id, reply } => {
                let _ = reply.send(self.browser.go_to(id));
            }
            BrowserCommand::BackItems { max, reply } => {
                let items = self.browser.back_items(max).into_iter().cloned().collect();
                let _ = reply.send(items);
            }
            BrowserCommand::ForwardItems { max, reply } => {
                let items = self.browser.forward_items(max).into_iter().cloned().collect();
                let _ = reply.send(items);
            }
            BrowserCommand::CurrentEntry { reply } => {
                let _ = reply.send(self.browser.history().current().cloned());
            }
            BrowserCommand::UpdateEntry { id, update, reply } => {
                let _ = reply.send(self.browser.update_entry(id, update));
            }
            BrowserCommand::SetDisplayText { text } => {
                self.browser.set_display_text(text);
            }

            // ── TimeWarp ─────────────────────────────────────────────
            BrowserCommand::WarpOn { state, reply } => {
                let _ = reply.send(self.browser.warp_on(state));
            }
            BrowserCommand::WarpOff { reply } => {
                self.browser.warp_off();
                let _ = reply.send(());
            }
            BrowserCommand::MoveCursor { direction, reply } => {
                self.browser.move_cursor(direction);
                let _ = reply.send(());
            }
            BrowserCommand::OpenCurrent { reply } => {
                let opened = self.browser.open_current();
                self.report_open(&opened);
                let _ = reply.send(opened);
            }
            BrowserCommand::UpdateViewState { state } => {
                self.browser.update_view_state(state);
            }
        }
    }

    /// A leaf open is everyone's business, not just the caller's.
    fn report_open(&self, opened: &Opened) {
        if let Opened::External { link, state } = opened {
            let _ = self.events.send(BrowserEvent::OpenExternal {
                link: *link,
                state: state.clone(),
            });
        }
    }
}

// ============================================================================
// Public spawn function
// ============================================================================

/// Spawn a browser driver task over `store`.
///
/// Subscribes to the store's availability changes before the first
/// command runs, so no notification can slip past a warp session.
pub fn spawn_browser(store: Arc<dyn StoreConnector>) -> BrowserHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    let changes = store.subscribe_changes();

    let mut browser = Browser::new(store);
    browser.set_history_observer(Box::new(HistoryForwarder { events: events.clone() }));
    browser.set_warp_observer(Box::new(WindowForwarder { events: events.clone() }));

    let driver = BrowserDriver { browser, changes, events: events.clone(), changes_closed: false };
    tokio::spawn(driver.run(rx));
    BrowserHandle { tx, events }
}
