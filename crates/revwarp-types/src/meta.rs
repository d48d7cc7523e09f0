//! Revision metadata and container type tags.

use serde::{Deserialize, Serialize};

use crate::ids::RevisionId;

/// Milliseconds since the Unix epoch.
pub type UnixMillis = i64;

/// Metadata of one revision, fetched once and immutable afterwards.
///
/// `parents` is ordered; a merge revision has several parents, a root
/// revision has none.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionMetadata {
    /// Modification time of the revision.
    pub mtime: UnixMillis,
    /// Parent revisions, newest lineage first.
    pub parents: Vec<RevisionId>,
    /// Type tag used by the presentation layer to pick a view.
    pub type_tag: String,
}

impl RevisionMetadata {
    pub fn new(mtime: UnixMillis, parents: Vec<RevisionId>, type_tag: impl Into<String>) -> Self {
        Self { mtime, parents, type_tag: type_tag.into() }
    }

    /// Whether this revision is a navigable container rather than a leaf.
    pub fn is_container(&self) -> bool {
        is_container(&self.type_tag)
    }
}

/// Type tags representing navigable collections (dictionary/store/set).
///
/// Opening one of these pushes it onto the browser history; any other tag
/// is a leaf document handed to an external viewer.
pub const CONTAINER_TYPES: &[&str] =
    &["org.revwarp.dict", "org.revwarp.store", "org.revwarp.set"];

/// Whether a type tag names a container kind.
pub fn is_container(type_tag: &str) -> bool {
    CONTAINER_TYPES.contains(&type_tag)
}
