//! Links — references to either a document or a fixed revision.
//!
//! A [`DocLink`] always means "the current revision of this document" and
//! may change what it points at over time; a [`RevLink`] pins one immutable
//! revision forever. Both carry value equality and a stable hash so they
//! can key history entries.
//!
//! The text forms `doc:<32 hex>` and `rev:<64 hex>` round-trip through
//! `Display`/`FromStr` and match the browser's command-line link syntax.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{DocumentId, RevisionId};

/// Error parsing a link from its text form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkParseError {
    #[error("link must start with `doc:` or `rev:`")]
    UnknownScheme,
    #[error("invalid id in link: {0}")]
    BadId(#[from] crate::ids::IdParseError),
}

/// Reference to the current revision of a document.
///
/// `update` requests that navigating away commits/updates the document.
/// It is part of navigation behavior, not of the link's identity, so it
/// is excluded from equality and hashing.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DocLink {
    pub doc: DocumentId,
    pub update: bool,
}

impl DocLink {
    pub fn new(doc: DocumentId, update: bool) -> Self {
        Self { doc, update }
    }
}

impl PartialEq for DocLink {
    fn eq(&self, other: &Self) -> bool {
        self.doc == other.doc
    }
}

impl Eq for DocLink {}

impl std::hash::Hash for DocLink {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.doc.hash(state);
    }
}

/// Reference to one immutable, never-changing revision.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct RevLink {
    pub rev: RevisionId,
}

impl RevLink {
    pub fn new(rev: RevisionId) -> Self {
        Self { rev }
    }
}

/// A navigable reference: document (mutable target) or revision (pinned).
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Link {
    Doc(DocLink),
    Rev(RevLink),
}

impl Link {
    /// Shorthand for a non-updating document link.
    pub fn doc(doc: DocumentId) -> Self {
        Link::Doc(DocLink::new(doc, false))
    }

    /// Shorthand for a revision link.
    pub fn rev(rev: RevisionId) -> Self {
        Link::Rev(RevLink::new(rev))
    }

    /// Short hex form for logs.
    pub fn short(&self) -> String {
        match self {
            Link::Doc(l) => format!("doc:{}", l.doc.short()),
            Link::Rev(l) => format!("rev:{}", l.rev.short()),
        }
    }
}

impl From<DocLink> for Link {
    fn from(l: DocLink) -> Self {
        Link::Doc(l)
    }
}

impl From<RevLink> for Link {
    fn from(l: RevLink) -> Self {
        Link::Rev(l)
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Link::Doc(l) => write!(f, "doc:{}", l.doc.to_hex()),
            Link::Rev(l) => write!(f, "rev:{}", l.rev.to_hex()),
        }
    }
}

impl FromStr for Link {
    type Err = LinkParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(hex) = s.strip_prefix("doc:") {
            Ok(Link::doc(DocumentId::parse(hex)?))
        } else if let Some(hex) = s.strip_prefix("rev:") {
            Ok(Link::rev(RevisionId::parse(hex)?))
        } else {
            Err(LinkParseError::UnknownScheme)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_text_roundtrip() {
        let doc = Link::doc(DocumentId::new());
        let rev = Link::rev(RevisionId::hash(b"rev"));
        for link in [doc, rev] {
            let parsed: Link = link.to_string().parse().unwrap();
            assert_eq!(parsed, link);
        }
    }

    #[test]
    fn test_link_rejects_unknown_scheme() {
        let err = "path:/foo/bar".parse::<Link>();
        assert_eq!(err, Err(LinkParseError::UnknownScheme));
    }

    #[test]
    fn test_doc_link_identity_ignores_update_flag() {
        let id = DocumentId::new();
        let a = Link::Doc(DocLink::new(id, false));
        let b = Link::Doc(DocLink::new(id, true));
        assert_eq!(a, b);
    }
}
