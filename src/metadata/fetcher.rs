//! Metadata lookup plus best-effort cover download.

use std::path::PathBuf;
use std::sync::Arc;

use ghostforge_common::{ContentId, Error, Result};
use tracing::{debug, warn};

use super::covers::CoverStore;
use super::provider::{reference_id, MetadataProvider, MetadataRecord};

/// A looked-up record and whatever happened to its cover.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedMetadata {
    pub record: MetadataRecord,
    /// Stored cover, if the provider had one and the download worked.
    pub cover: Option<PathBuf>,
    /// Non-fatal problems (cover download failures).
    pub warnings: Vec<String>,
}

/// Resolves references into records and stores their covers.
#[derive(Clone)]
pub struct MetadataFetcher {
    provider: Arc<dyn MetadataProvider>,
    covers: Option<CoverStore>,
}

impl MetadataFetcher {
    /// Without a [`CoverStore`] posters are never downloaded.
    pub fn new(provider: Arc<dyn MetadataProvider>, covers: Option<CoverStore>) -> Self {
        Self { provider, covers }
    }

    /// Look up `url` (a title URL or bare reference).
    ///
    /// The cover is named after `ID(title)`, or `ID(parent_title + "_" + title)`
    /// when `parent_title` is given. Lookup failures, including
    /// [`ghostforge_common::Error::NotFound`], are returned; cover failures
    /// only add a warning. A record without a title is a validation error and
    /// nothing is downloaded for it.
    pub async fn fetch(&self, url: &str, parent_title: Option<&str>) -> Result<FetchedMetadata> {
        let reference = reference_id(url)?;
        let record = self.provider.lookup(&reference).await?;
        if record.title.trim().is_empty() {
            return Err(Error::validation(format!(
                "{} returned no title for {reference}",
                self.provider.name()
            )));
        }
        debug!(
            provider = self.provider.name(),
            reference = %reference,
            title = %record.title,
            "Metadata fetched"
        );

        let mut warnings = Vec::new();
        let cover = match (&self.covers, record.poster_url.as_deref()) {
            (Some(store), Some(poster)) => {
                let id = match parent_title {
                    Some(parent) => ContentId::scoped(parent, &record.title),
                    None => ContentId::derive(&record.title),
                };
                match store.download(poster, &id).await {
                    Ok(path) => Some(path),
                    Err(e) => {
                        warn!(reference = %reference, error = %e, "Cover download failed");
                        warnings.push(format!("{}: cover not stored: {}", record.title, e));
                        None
                    }
                }
            }
            _ => None,
        };

        Ok(FetchedMetadata {
            record,
            cover,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StaticProvider;

    #[async_trait]
    impl MetadataProvider for StaticProvider {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn lookup(&self, reference: &str) -> Result<MetadataRecord> {
            match reference {
                "tt0113277" => Ok(MetadataRecord {
                    title: "Heat".into(),
                    poster_url: Some("http://127.0.0.1:9/heat.jpg".into()),
                    ..Default::default()
                }),
                "tt0000000" => Ok(MetadataRecord {
                    poster_url: Some("http://127.0.0.1:9/untitled.jpg".into()),
                    ..Default::default()
                }),
                other => Err(Error::not_found(other.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_not_found_propagates() {
        let fetcher = MetadataFetcher::new(Arc::new(StaticProvider), None);
        let err = fetcher
            .fetch("https://www.imdb.com/title/tt9999999/", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(ref m) if m == "tt9999999"));
    }

    #[tokio::test]
    async fn test_without_cover_store() {
        let fetcher = MetadataFetcher::new(Arc::new(StaticProvider), None);
        let fetched = fetcher
            .fetch("https://www.imdb.com/title/tt0113277/", None)
            .await
            .unwrap();
        assert_eq!(fetched.record.title, "Heat");
        assert_eq!(fetched.cover, None);
        assert!(fetched.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_untitled_record_is_rejected_before_cover() {
        let covers = tempfile::tempdir().unwrap();
        let store = CoverStore::new(covers.path(), std::time::Duration::from_secs(1)).unwrap();
        let fetcher = MetadataFetcher::new(Arc::new(StaticProvider), Some(store));

        let err = fetcher.fetch("tt0000000", Some("Show")).await.unwrap_err();

        assert!(matches!(err, Error::Validation(ref m) if m.contains("tt0000000")));
        assert_eq!(std::fs::read_dir(covers.path()).unwrap().count(), 0);
    }
}
