//! Ingestion requests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ghostforge_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// One unit of work handed to the ingestion pipeline.
///
/// Serialized with a `mode` tag, so a request file looks like:
///
/// ```toml
/// mode = "series"
/// source = "/media/incoming/Breaking Bad"
/// reference = "https://www.imdb.com/title/tt0903747/"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum IngestRequest {
    /// A single movie file.
    Standalone { source: PathBuf, reference: String },

    /// A series directory with one subdirectory per season.
    Series {
        source: PathBuf,
        reference: String,
        /// Per-episode references in discovery order; empty to inherit
        /// everything from the series record.
        #[serde(default)]
        episode_references: Vec<String>,
    },

    /// A directory of movies grouped under an operator-chosen title.
    Collection {
        source: PathBuf,
        /// Explicit collection ID; derived from `title` when absent.
        #[serde(default)]
        id: Option<String>,
        title: String,
        #[serde(default)]
        description: Option<String>,
        /// File name (relative to `source`) to movie reference.
        movies: BTreeMap<String, String>,
    },
}

impl IngestRequest {
    pub fn source(&self) -> &Path {
        match self {
            Self::Standalone { source, .. }
            | Self::Series { source, .. }
            | Self::Collection { source, .. } => source,
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Self::Standalone { .. } => "standalone",
            Self::Series { .. } => "series",
            Self::Collection { .. } => "collection",
        }
    }

    /// Parse a request document. `.json` files are JSON, anything else TOML.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_str(content)
                .map_err(|e| Error::validation(format!("{}: {}", path.display(), e)))
        } else {
            toml::from_str(content)
                .map_err(|e| Error::validation(format!("{}: {}", path.display(), e)))
        }
    }
}
