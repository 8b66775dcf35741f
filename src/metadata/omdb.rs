//! OMDb metadata provider.
//!
//! Implements [`MetadataProvider`] against the OMDb `?i={id}&apikey={key}`
//! endpoint. OMDb answers HTTP 200 for unknown titles and signals the miss
//! with `"Response": "False"`; that is mapped to [`Error::NotFound`].

use std::time::Duration;

use async_trait::async_trait;
use ghostforge_common::{Error, Result};
use serde::Deserialize;
use tracing::debug;

use super::provider::{MetadataProvider, MetadataRecord};

/// Marker OMDb uses for every absent field.
const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OmdbResponse {
    response: Option<String>,
    error: Option<String>,
    title: Option<String>,
    plot: Option<String>,
    #[serde(rename = "imdbRating")]
    imdb_rating: Option<String>,
    genre: Option<String>,
    director: Option<String>,
    year: Option<String>,
    season: Option<String>,
    episode: Option<String>,
    poster: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != NOT_AVAILABLE)
}

/// Leading four-digit year of values like `2008`, `2008–2013` or `2019–`.
fn parse_year(value: &str) -> Option<i32> {
    let digits: String = value.chars().take_while(char::is_ascii_digit).collect();
    if digits.len() == 4 {
        digits.parse().ok()
    } else {
        None
    }
}

fn parse_genres(value: Option<String>) -> Vec<String> {
    present(value)
        .map(|genres| {
            genres
                .split(',')
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl OmdbResponse {
    fn is_success(&self) -> bool {
        self.response
            .as_deref()
            .is_some_and(|r| r.eq_ignore_ascii_case("true"))
    }

    fn into_record(self) -> MetadataRecord {
        MetadataRecord {
            title: present(self.title).unwrap_or_default(),
            plot: present(self.plot),
            rating: present(self.imdb_rating).and_then(|r| r.parse().ok()),
            genres: parse_genres(self.genre),
            director: present(self.director),
            year: present(self.year).and_then(|y| parse_year(&y)),
            season: present(self.season).and_then(|s| s.parse().ok()),
            episode: present(self.episode).and_then(|e| e.parse().ok()),
            poster_url: present(self.poster),
        }
    }
}

/// OMDb metadata provider.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use ghostforge::metadata::OmdbProvider;
///
/// let provider = OmdbProvider::new(
///     "http://www.omdbapi.com/",
///     Some("your-api-key".into()),
///     Duration::from_secs(30),
/// )
/// .unwrap();
/// ```
pub struct OmdbProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OmdbProvider {
    /// Create a provider. A missing `api_key` is reported on the first lookup.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::provider(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }
}

#[async_trait]
impl MetadataProvider for OmdbProvider {
    fn name(&self) -> &'static str {
        "omdb"
    }

    async fn lookup(&self, reference: &str) -> Result<MetadataRecord> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::validation("metadata api_key is not configured"))?;

        debug!(reference, "OMDb lookup");
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("i", reference), ("apikey", api_key)])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| Error::provider(format!("lookup {reference}: {e}")))?;

        let body: OmdbResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(format!("lookup {reference}: invalid response: {e}")))?;

        if !body.is_success() {
            let reason = body.error.unwrap_or_else(|| "no result".to_string());
            return Err(Error::not_found(format!("{reference}: {reason}")));
        }

        Ok(body.into_record())
    }
}
