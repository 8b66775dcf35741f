//! Row models matching the catalog schema.
//!
//! The catalog layer works with tagged records from `ghostforge-common`; these
//! structs are their flattened table shape. Conversions live here so the
//! genre-placement rule (genres on the collection, not on its members) is
//! applied in one spot.

use std::path::Path;

use ghostforge_common::{
    CollectionType, ContentId, Episode, Error, MediaKind, Movie, MovieCollection,
    ResolutionCategory, Result, SeriesCollection,
};
use serde::{Deserialize, Serialize};

/// One row of the `collection` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub collection_type: CollectionType,
    pub genres: Vec<String>,
    pub producer: Option<String>,
    pub image_path: Option<String>,
    pub episode_count: Option<u32>,
}

/// One row of the `media` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaRow {
    pub id: String,
    pub title: String,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub producer: Option<String>,
    pub rating: Option<f64>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub resolution: ResolutionCategory,
    pub image_path: Option<String>,
    /// Only populated for media that belong to no collection.
    pub genres: Option<Vec<String>>,
    pub kind: MediaKind,
    pub collection_id: Option<String>,
}

fn path_string(path: Option<&Path>) -> Option<String> {
    path.map(|p| p.to_string_lossy().into_owned())
}

impl CollectionRow {
    pub fn from_series(series: &SeriesCollection) -> Self {
        Self {
            id: series.id.to_string(),
            title: series.title.clone(),
            description: series.description.clone(),
            rating: series.rating,
            collection_type: CollectionType::Serie,
            genres: series.genres.clone(),
            producer: series.producer.clone(),
            image_path: path_string(series.image_path.as_deref()),
            episode_count: Some(series.episode_count as u32),
        }
    }

    pub fn from_movie_set(set: &MovieCollection) -> Self {
        Self {
            id: set.id.to_string(),
            title: set.title.clone(),
            description: set.description.clone(),
            rating: set.rating,
            collection_type: CollectionType::Movies,
            genres: set.genres.clone(),
            producer: set.producer.clone(),
            image_path: path_string(set.image_path.as_deref()),
            episode_count: None,
        }
    }

    /// Reject rows that must never reach storage.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::validation(format!(
                "collection {} has an empty title",
                self.id
            )));
        }
        Ok(())
    }
}

impl MediaRow {
    /// Flatten a movie. Members of a collection leave `genres` empty.
    pub fn from_movie(movie: &Movie, collection_id: Option<&ContentId>) -> Self {
        Self {
            id: movie.id.to_string(),
            title: movie.title.clone(),
            year: movie.year,
            description: movie.description.clone(),
            producer: movie.producer.clone(),
            rating: movie.rating,
            season: None,
            episode: None,
            resolution: movie.resolution,
            image_path: path_string(movie.image_path.as_deref()),
            genres: match collection_id {
                Some(_) => None,
                None => Some(movie.genres.clone()),
            },
            kind: MediaKind::Movie,
            collection_id: collection_id.map(ToString::to_string),
        }
    }

    pub fn from_episode(episode: &Episode, collection_id: &ContentId) -> Self {
        Self {
            id: episode.id.to_string(),
            title: episode.title.clone(),
            year: episode.year,
            description: episode.description.clone(),
            producer: episode.producer.clone(),
            rating: episode.rating,
            season: Some(episode.season),
            episode: Some(episode.episode),
            resolution: episode.resolution,
            image_path: path_string(episode.image_path.as_deref()),
            genres: None,
            kind: MediaKind::Episode,
            collection_id: Some(collection_id.to_string()),
        }
    }

    pub fn is_standalone(&self) -> bool {
        self.collection_id.is_none()
    }

    /// Reject rows that must never reach storage.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            let what = if self.is_standalone() {
                "standalone movie"
            } else {
                "media"
            };
            return Err(Error::validation(format!(
                "{what} {} has an empty title",
                self.id
            )));
        }
        if self.kind == MediaKind::Episode && self.collection_id.is_none() {
            return Err(Error::validation(format!(
                "episode {} is not attached to a collection",
                self.id
            )));
        }
        Ok(())
    }
}
