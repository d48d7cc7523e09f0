//! Walk a revision chain with the TimeWarp explorer.
//!
//! Builds an in-memory store with a short edit history, spawns a browser
//! driver, and steps the cursor into the past while printing window
//! reconciliations. Run with `RUST_LOG=revwarp_nav=trace` to watch the
//! backlog ticks.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use revwarp_nav::{BrowserEvent, Direction, spawn_browser};
use revwarp_store::{MemStore, StoreConnector};
use revwarp_types::{DocumentId, Link, RevisionMetadata, UiState};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let store = Arc::new(MemStore::new());
    let mut parents = Vec::new();
    let mut head = None;
    for (i, label) in ["created", "renamed", "reorganized", "current"].iter().enumerate() {
        let meta = RevisionMetadata::new(1_000 * (i as i64 + 1), parents.clone(), "org.revwarp.dict");
        let rev = store.insert_revision(label.as_bytes(), meta);
        parents = vec![rev];
        head = Some(rev);
    }
    let doc = DocumentId::new();
    store.put_document(doc, head.unwrap());

    let handle = spawn_browser(Arc::clone(&store) as Arc<dyn StoreConnector>);
    let mut events = handle.subscribe();

    handle.push_link(Link::doc(doc), UiState::new()).await?;
    handle.warp_on(UiState::new()).await?;

    // Let the explorer walk the ancestry, then step two revisions back.
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    handle.move_cursor(Direction::Past).await?;
    handle.move_cursor(Direction::Past).await?;
    let opened = handle.open_current().await?;
    println!("opened: {opened:?}");

    while let Ok(event) = events.try_recv() {
        match event {
            BrowserEvent::WindowChanged(change) => {
                let revs: Vec<String> =
                    change.entries.iter().map(|e| e.rev.short()).collect();
                println!("window {:?} (motion {})", revs, change.motion);
            }
            other => println!("{other:?}"),
        }
    }
    Ok(())
}
