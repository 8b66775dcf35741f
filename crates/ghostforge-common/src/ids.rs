//! Content-derived identifiers.
//!
//! Catalog IDs are not allocated; they are the SHA-1 of the title (or of the
//! parent title and item title joined by [`SCOPE_SEPARATOR`]). Re-ingesting the
//! same titled content therefore lands on the same rows and the same artifact
//! directories.

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// Separator placed between a parent title and an item title for scoped IDs.
pub const SCOPE_SEPARATOR: &str = "_";

/// Stable identifier derived from title strings.
///
/// Always 40 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// ID of an unscoped entity (standalone movie, collection).
    #[must_use]
    pub fn derive(title: &str) -> Self {
        Self(sha1_hex(title))
    }

    /// ID of an entity scoped under a parent (episode, collection member).
    #[must_use]
    pub fn scoped(parent_title: &str, item_title: &str) -> Self {
        Self(sha1_hex(&format!(
            "{parent_title}{SCOPE_SEPARATOR}{item_title}"
        )))
    }

    /// Wrap an already-computed identifier, e.g. one read back from storage or
    /// supplied explicitly by the operator.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn sha1_hex(input: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
