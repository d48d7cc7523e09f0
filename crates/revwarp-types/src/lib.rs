//! Shared identity and metadata types for revwarp.
//!
//! This crate is the leaf of the workspace: revision/document ids, links,
//! revision metadata, and UI-state snapshots. It has **no internal revwarp
//! dependencies** — everything else builds on it.
//!
//! # Key Types
//!
//! |----------------------|--------------------------------------------------|
//! | Type                 | Purpose                                          |
//! |----------------------|--------------------------------------------------|
//! | [`RevisionId`]       | Content hash of one immutable revision           |
//! | [`DocumentId`]       | Stable id resolving to its current revision      |
//! | [`Link`]             | Reference to a document or a fixed revision      |
//! | [`RevisionMetadata`] | mtime + parents + type tag, fetched once         |
//! | [`UiState`]          | Opaque presentation snapshot carried across nav  |
//! | [`Availability`]     | Whether the store can currently serve a revision |
//! |----------------------|--------------------------------------------------|

pub mod ids;
pub mod link;
pub mod meta;
pub mod state;

pub use ids::{DocumentId, IdParseError, RevisionId};
pub use link::{DocLink, Link, LinkParseError, RevLink};
pub use meta::{CONTAINER_TYPES, RevisionMetadata, UnixMillis, is_container};
pub use state::{Availability, UiState};
