//! Trait definition and types for metadata providers.
//!
//! A provider resolves an external reference (an IMDb-style identifier) into a
//! [`MetadataRecord`]. Providers report "no such title" as
//! [`Error::NotFound`] and transport or decoding trouble as
//! [`Error::Provider`].

use async_trait::async_trait;
use ghostforge_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Normalized metadata for one movie, series, or episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub title: String,
    pub plot: Option<String>,
    /// Audience rating on a 0-10 scale.
    pub rating: Option<f64>,
    pub genres: Vec<String>,
    /// Director, stored as the catalog's producer.
    pub director: Option<String>,
    pub year: Option<i32>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub poster_url: Option<String>,
}

/// Async trait every metadata backend implements.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Short, lowercase identifier for this provider (e.g. `"omdb"`).
    fn name(&self) -> &'static str;

    /// Look up a single title by its provider reference.
    async fn lookup(&self, reference: &str) -> Result<MetadataRecord>;
}

/// Extract the provider reference from a title URL.
///
/// The reference is the last non-empty path segment; query strings and
/// fragments are ignored. A bare identifier is returned unchanged.
///
/// # Examples
///
/// ```
/// use ghostforge::metadata::reference_id;
///
/// assert_eq!(reference_id("https://www.imdb.com/title/tt0903747/").unwrap(), "tt0903747");
/// assert_eq!(reference_id("tt0903747").unwrap(), "tt0903747");
/// ```
pub fn reference_id(url: &str) -> Result<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or_default();
    without_query
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
        .ok_or_else(|| Error::validation(format!("no reference found in '{url}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_id_variants() {
        for url in [
            "https://www.imdb.com/title/tt0133093",
            "https://www.imdb.com/title/tt0133093/",
            "https://www.imdb.com/title/tt0133093/?ref_=nv_sr_1",
            "https://www.imdb.com/title/tt0133093//",
            "tt0133093",
        ] {
            assert_eq!(reference_id(url).unwrap(), "tt0133093", "{url}");
        }
    }

    #[test]
    fn test_reference_id_empty() {
        assert!(matches!(reference_id(""), Err(Error::Validation(_))));
        assert!(matches!(reference_id("///"), Err(Error::Validation(_))));
    }
}
