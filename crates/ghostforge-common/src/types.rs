//! Catalog record types.
//!
//! Records are tagged variants instead of one wide nullable row: a [`Movie`]
//! never carries season numbers and an [`Episode`] never carries its own genre
//! list. The persistence layer flattens them into table rows.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ids::ContentId;

/// Coarse resolution bucket derived from probed pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ResolutionCategory {
    /// 1280x720 and above.
    #[serde(rename = "HD")]
    Hd,
    /// 1920x1080 and above.
    #[serde(rename = "FullHD")]
    FullHd,
    /// 3840x2160 and above.
    #[serde(rename = "4K")]
    UltraHd,
    /// Below 1280x720 on both axes.
    #[serde(rename = "LowQuality")]
    LowQuality,
    /// Probe failed or dimensions straddle a tier boundary.
    #[default]
    #[serde(rename = "Undefined")]
    Undefined,
}

impl ResolutionCategory {
    /// Classify a video stream by its dimensions.
    ///
    /// A tier requires both axes to reach its threshold. Frames below 720p on
    /// both axes are `LowQuality`; anything else that fits no tier is
    /// `Undefined`.
    pub fn classify(width: u32, height: u32) -> Self {
        match (width, height) {
            (w, h) if w >= 3840 && h >= 2160 => Self::UltraHd,
            (w, h) if w >= 1920 && h >= 1080 => Self::FullHd,
            (w, h) if w >= 1280 && h >= 720 => Self::Hd,
            (w, h) if w < 1280 && h < 720 => Self::LowQuality,
            _ => Self::Undefined,
        }
    }

    /// Storage / wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hd => "HD",
            Self::FullHd => "FullHD",
            Self::UltraHd => "4K",
            Self::LowQuality => "LowQuality",
            Self::Undefined => "Undefined",
        }
    }
}

impl fmt::Display for ResolutionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionCategory {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HD" => Ok(Self::Hd),
            "FullHD" => Ok(Self::FullHd),
            "4K" => Ok(Self::UltraHd),
            "LowQuality" => Ok(Self::LowQuality),
            "Undefined" => Ok(Self::Undefined),
            other => Err(crate::Error::validation(format!(
                "unknown resolution category: {other}"
            ))),
        }
    }
}

/// Kind of collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionType {
    /// A hand-assembled set of movies.
    Movies,
    /// A TV series.
    Serie,
}

impl CollectionType {
    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movies => "movies",
            Self::Serie => "serie",
        }
    }
}

impl fmt::Display for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movies" => Ok(Self::Movies),
            "serie" => Ok(Self::Serie),
            other => Err(crate::Error::validation(format!(
                "unknown collection type: {other}"
            ))),
        }
    }
}

/// Kind of playable media row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Episode,
}

impl MediaKind {
    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Episode => "episode",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(Self::Movie),
            "episode" => Ok(Self::Episode),
            other => Err(crate::Error::validation(format!(
                "unknown media kind: {other}"
            ))),
        }
    }
}

/// A movie, either standalone or a member of a [`MovieCollection`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: ContentId,
    pub title: String,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub producer: Option<String>,
    pub rating: Option<f64>,
    pub genres: Vec<String>,
    pub resolution: ResolutionCategory,
    pub image_path: Option<PathBuf>,
    pub source_path: PathBuf,
}

/// One episode of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: ContentId,
    pub title: String,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub producer: Option<String>,
    pub rating: Option<f64>,
    pub season: u32,
    pub episode: u32,
    pub resolution: ResolutionCategory,
    pub image_path: Option<PathBuf>,
    pub source_path: PathBuf,
}

/// Collection record for a TV series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesCollection {
    pub id: ContentId,
    pub title: String,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub genres: Vec<String>,
    pub producer: Option<String>,
    pub image_path: Option<PathBuf>,
    pub episode_count: usize,
}

/// Collection record for a movie set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieCollection {
    pub id: ContentId,
    pub title: String,
    pub description: Option<String>,
    /// Arithmetic mean of the rated members.
    pub rating: Option<f64>,
    pub genres: Vec<String>,
    pub producer: Option<String>,
    pub image_path: Option<PathBuf>,
}

/// Everything one ingestion request produces for the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogEntry {
    Movie(Movie),
    Series {
        collection: SeriesCollection,
        episodes: Vec<Episode>,
    },
    MovieSet {
        collection: MovieCollection,
        movies: Vec<Movie>,
    },
}

/// A playable file together with the ID its artifacts are keyed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSource {
    pub id: ContentId,
    pub title: String,
    pub path: PathBuf,
}

impl MediaSource {
    fn new(id: &ContentId, title: &str, path: &Path) -> Self {
        Self {
            id: id.clone(),
            title: title.to_string(),
            path: path.to_path_buf(),
        }
    }
}

impl CatalogEntry {
    /// Title of the top-level record (collection or standalone movie).
    pub fn title(&self) -> &str {
        match self {
            Self::Movie(movie) => &movie.title,
            Self::Series { collection, .. } => &collection.title,
            Self::MovieSet { collection, .. } => &collection.title,
        }
    }

    /// ID of the top-level record.
    pub fn id(&self) -> &ContentId {
        match self {
            Self::Movie(movie) => &movie.id,
            Self::Series { collection, .. } => &collection.id,
            Self::MovieSet { collection, .. } => &collection.id,
        }
    }

    /// Playable files in catalog order.
    pub fn sources(&self) -> Vec<MediaSource> {
        match self {
            Self::Movie(movie) => vec![MediaSource::new(
                &movie.id,
                &movie.title,
                &movie.source_path,
            )],
            Self::Series { episodes, .. } => episodes
                .iter()
                .map(|e| MediaSource::new(&e.id, &e.title, &e.source_path))
                .collect(),
            Self::MovieSet { movies, .. } => movies
                .iter()
                .map(|m| MediaSource::new(&m.id, &m.title, &m.source_path))
                .collect(),
        }
    }
}
