//! Turns an [`IngestRequest`] into catalog records.
//!
//! Metadata comes from the [`MetadataFetcher`], resolution categories from the
//! prober. Nothing here writes to the catalog; the result is a
//! [`CatalogEntry`] plus the warnings collected along the way.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use ghostforge_av::{resolve_resolution, Prober};
use ghostforge_common::{
    CatalogEntry, ContentId, Episode, Error, Movie, MovieCollection, ResolutionCategory, Result,
    SeriesCollection,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::layout::{discover_episodes, EpisodeFile};
use super::request::IngestRequest;
use crate::metadata::{FetchedMetadata, MetadataFetcher, MetadataRecord};

/// Records produced for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub entry: CatalogEntry,
    pub warnings: Vec<String>,
}

/// Builds catalog records for the three ingestion modes.
#[derive(Clone)]
pub struct CatalogNormalizer {
    fetcher: MetadataFetcher,
    prober: Arc<dyn Prober>,
    concurrency: usize,
}

impl CatalogNormalizer {
    /// `concurrency` bounds how many lookups and probes run at once.
    pub fn new(fetcher: MetadataFetcher, prober: Arc<dyn Prober>, concurrency: usize) -> Self {
        Self {
            fetcher,
            prober,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn normalize(
        &self,
        request: &IngestRequest,
        cancel: &CancellationToken,
    ) -> Result<Normalized> {
        let mut warnings = Vec::new();
        let entry = match request {
            IngestRequest::Standalone { source, reference } => {
                self.standalone(source, reference, &mut warnings, cancel)
                    .await?
            }
            IngestRequest::Series {
                source,
                reference,
                episode_references,
            } => {
                self.series(source, reference, episode_references, &mut warnings, cancel)
                    .await?
            }
            IngestRequest::Collection {
                source,
                id,
                title,
                description,
                movies,
            } => {
                let id = id
                    .as_deref()
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(ContentId::from_raw)
                    .unwrap_or_else(|| ContentId::derive(title));
                let files: Vec<(PathBuf, &str)> = movies
                    .iter()
                    .map(|(file, reference)| (source.join(file), reference.as_str()))
                    .collect();
                self.collection(id, title, description.clone(), &files, &mut warnings, cancel)
                    .await?
            }
        };

        flag_duplicate_ids(&entry, &mut warnings);
        info!(
            mode = request.mode(),
            title = %entry.title(),
            id = %entry.id(),
            items = entry.sources().len(),
            "Request normalized"
        );
        Ok(Normalized { entry, warnings })
    }

    async fn fetch(
        &self,
        reference: &str,
        parent_title: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<FetchedMetadata> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            fetched = self.fetcher.fetch(reference, parent_title) => fetched,
        }
    }

    async fn resolution(&self, path: &Path, cancel: &CancellationToken) -> Result<ResolutionCategory> {
        Ok(resolve_resolution(self.prober.as_ref(), path, cancel).await?)
    }

    async fn standalone(
        &self,
        source: &Path,
        reference: &str,
        warnings: &mut Vec<String>,
        cancel: &CancellationToken,
    ) -> Result<CatalogEntry> {
        require_file(source)?;

        let fetched = self.fetch(reference, None, cancel).await?;
        warnings.extend(fetched.warnings);
        let record = fetched.record;

        let resolution = self.resolution(source, cancel).await?;
        note_undefined(resolution, &record.title, warnings);

        Ok(CatalogEntry::Movie(Movie {
            id: ContentId::derive(&record.title),
            title: record.title,
            year: record.year,
            description: record.plot,
            producer: record.director,
            rating: record.rating,
            genres: record.genres,
            resolution,
            image_path: fetched.cover,
            source_path: source.to_path_buf(),
        }))
    }

    async fn series(
        &self,
        source: &Path,
        reference: &str,
        episode_references: &[String],
        warnings: &mut Vec<String>,
        cancel: &CancellationToken,
    ) -> Result<CatalogEntry> {
        let dir = source.to_path_buf();
        let files = tokio::task::spawn_blocking(move || discover_episodes(&dir))
            .await
            .map_err(|e| Error::internal(format!("episode discovery panicked: {e}")))??;

        if !episode_references.is_empty() && episode_references.len() != files.len() {
            return Err(Error::validation(format!(
                "{} episode references given for {} episodes in {}",
                episode_references.len(),
                files.len(),
                source.display()
            )));
        }

        let series = self.fetch(reference, None, cancel).await?;
        warnings.extend(series.warnings);
        let series_record = series.record;

        let per_episode: Vec<Option<FetchedMetadata>> = if episode_references.is_empty() {
            vec![None; files.len()]
        } else {
            let title = series_record.title.as_str();
            stream::iter(episode_references)
                .map(|reference| self.fetch(reference, Some(title), cancel))
                .buffered(self.concurrency)
                .map_ok(Some)
                .try_collect()
                .await?
        };

        let resolutions = self.resolutions(files.iter().map(|f| f.path.as_path()), cancel).await?;

        let mut episodes = Vec::with_capacity(files.len());
        for ((file, fetched), resolution) in files.into_iter().zip(per_episode).zip(resolutions) {
            let episode = match fetched {
                Some(fetched) => {
                    warnings.extend(fetched.warnings);
                    episode_from_lookup(
                        &series_record,
                        file,
                        fetched.record,
                        fetched.cover,
                        resolution,
                    )
                }
                None => inherited_episode(&series_record, file, resolution),
            };
            note_undefined(resolution, &episode.title, warnings);
            episodes.push(episode);
        }

        let collection = SeriesCollection {
            id: ContentId::derive(&series_record.title),
            title: series_record.title,
            description: series_record.plot,
            rating: series_record.rating,
            genres: series_record.genres,
            producer: series_record.director,
            image_path: series.cover,
            episode_count: episodes.len(),
        };

        Ok(CatalogEntry::Series {
            collection,
            episodes,
        })
    }

    async fn collection(
        &self,
        id: ContentId,
        title: &str,
        description: Option<String>,
        files: &[(PathBuf, &str)],
        warnings: &mut Vec<String>,
        cancel: &CancellationToken,
    ) -> Result<CatalogEntry> {
        if title.trim().is_empty() {
            return Err(Error::validation("movie collection title is required"));
        }
        if files.is_empty() {
            return Err(Error::validation(format!(
                "movie collection '{title}' has no movies"
            )));
        }
        for (path, _) in files {
            require_file(path)?;
        }

        let fetched: Vec<FetchedMetadata> = stream::iter(files)
            .map(|(_, reference)| self.fetch(reference, Some(title), cancel))
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let resolutions = self.resolutions(files.iter().map(|(p, _)| p.as_path()), cancel).await?;

        let mut movies = Vec::with_capacity(files.len());
        for (((path, _), fetched), resolution) in files.iter().zip(fetched).zip(resolutions) {
            warnings.extend(fetched.warnings);
            let record = fetched.record;
            note_undefined(resolution, &record.title, warnings);
            movies.push(Movie {
                id: ContentId::scoped(title, &record.title),
                title: record.title,
                year: record.year,
                description: record.plot,
                producer: record.director,
                rating: record.rating,
                genres: record.genres,
                resolution,
                image_path: fetched.cover,
                source_path: path.clone(),
            });
        }

        let collection = MovieCollection {
            id,
            title: title.to_string(),
            description,
            rating: mean_rating(&movies)?,
            genres: genre_union(&movies),
            producer: None,
            image_path: None,
        };

        Ok(CatalogEntry::MovieSet { collection, movies })
    }

    async fn resolutions<'a>(
        &self,
        paths: impl Iterator<Item = &'a Path>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResolutionCategory>> {
        stream::iter(paths)
            .map(|path| self.resolution(path, cancel))
            .buffered(self.concurrency)
            .try_collect()
            .await
    }
}

fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "source file {} does not exist",
            path.display()
        )))
    }
}

fn note_undefined(resolution: ResolutionCategory, title: &str, warnings: &mut Vec<String>) {
    if resolution == ResolutionCategory::Undefined {
        warnings.push(format!("{title}: resolution undefined"));
    }
}

/// Episode that takes its descriptive fields from the series record.
fn inherited_episode(
    series: &MetadataRecord,
    file: EpisodeFile,
    resolution: ResolutionCategory,
) -> Episode {
    Episode {
        id: ContentId::scoped(&series.title, &file.title),
        title: file.title,
        year: series.year,
        description: series.plot.clone(),
        producer: series.director.clone(),
        rating: series.rating,
        season: file.season,
        episode: file.episode,
        resolution,
        image_path: None,
        source_path: file.path,
    }
}

/// Episode described by its own lookup, falling back to the series record.
fn episode_from_lookup(
    series: &MetadataRecord,
    file: EpisodeFile,
    record: MetadataRecord,
    cover: Option<PathBuf>,
    resolution: ResolutionCategory,
) -> Episode {
    Episode {
        id: ContentId::scoped(&series.title, &record.title),
        title: record.title,
        year: record.year.or(series.year),
        description: record.plot.or_else(|| series.plot.clone()),
        producer: record.director.or_else(|| series.director.clone()),
        rating: record.rating.or(series.rating),
        season: record.season.unwrap_or(file.season),
        episode: record.episode.unwrap_or(file.episode),
        resolution,
        image_path: cover,
        source_path: file.path,
    }
}

/// Arithmetic mean of the rated members.
///
/// An empty member list is invalid; members without a rating are left out,
/// and a set with no rated member has no rating.
pub fn mean_rating(movies: &[Movie]) -> Result<Option<f64>> {
    if movies.is_empty() {
        return Err(Error::validation("cannot rate a movie collection with no movies"));
    }
    let rated: Vec<f64> = movies.iter().filter_map(|m| m.rating).collect();
    if rated.is_empty() {
        return Ok(None);
    }
    Ok(Some(rated.iter().sum::<f64>() / rated.len() as f64))
}

/// Member genres in first-seen order, without repeats.
fn genre_union(movies: &[Movie]) -> Vec<String> {
    let mut genres: Vec<String> = Vec::new();
    for genre in movies.iter().flat_map(|m| &m.genres) {
        if !genres.contains(genre) {
            genres.push(genre.clone());
        }
    }
    genres
}

/// Distinct items sharing a title get the same ID; the later write wins.
fn flag_duplicate_ids(entry: &CatalogEntry, warnings: &mut Vec<String>) {
    let sources = entry.sources();
    for (idx, source) in sources.iter().enumerate() {
        if let Some(first) = sources[..idx].iter().find(|s| s.id == source.id) {
            warn!(
                media_id = %source.id,
                first = %first.path.display(),
                second = %source.path.display(),
                "Title collision"
            );
            warnings.push(format!(
                "{} and {} share the title '{}' and collide on ID {}",
                first.path.display(),
                source.path.display(),
                source.title,
                source.id
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghostforge_common::ContentId;

    fn movie(title: &str, rating: Option<f64>, genres: &[&str]) -> Movie {
        Movie {
            id: ContentId::derive(title),
            title: title.into(),
            year: None,
            description: None,
            producer: None,
            rating,
            genres: genres.iter().map(|g| g.to_string()).collect(),
            resolution: ResolutionCategory::Undefined,
            image_path: None,
            source_path: PathBuf::from(format!("/m/{title}.mkv")),
        }
    }

    #[test]
    fn test_mean_rating() {
        let movies = [
            movie("a", Some(7.0), &[]),
            movie("b", Some(8.0), &[]),
            movie("c", Some(9.0), &[]),
        ];
        assert_eq!(mean_rating(&movies).unwrap(), Some(8.0));
    }

    #[test]
    fn test_mean_rating_skips_unrated() {
        let movies = [movie("a", Some(6.0), &[]), movie("b", None, &[])];
        assert_eq!(mean_rating(&movies).unwrap(), Some(6.0));
        assert_eq!(mean_rating(&[movie("c", None, &[])]).unwrap(), None);
    }

    #[test]
    fn test_mean_rating_empty_is_validation() {
        assert!(matches!(mean_rating(&[]), Err(Error::Validation(_))));
    }

    #[test]
    fn test_genre_union_keeps_order() {
        let movies = [
            movie("a", None, &["Action", "Sci-Fi"]),
            movie("b", None, &["Sci-Fi", "Thriller"]),
        ];
        assert_eq!(genre_union(&movies), vec!["Action", "Sci-Fi", "Thriller"]);
    }

    #[test]
    fn test_duplicate_titles_are_flagged() {
        let entry = CatalogEntry::MovieSet {
            collection: MovieCollection {
                id: ContentId::derive("set"),
                title: "set".into(),
                description: None,
                rating: None,
                genres: vec![],
                producer: None,
                image_path: None,
            },
            movies: vec![movie("same", None, &[]), movie("same", None, &[])],
        };
        let mut warnings = Vec::new();
        flag_duplicate_ids(&entry, &mut warnings);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("collide"));
    }
}
