//! Batch ingestion pipeline.
//!
//! One request runs as: normalize, write the catalog, then produce artifacts
//! for every media item on a bounded pool of workers. Catalog failures abort
//! the request before any artifact is produced; artifact failures are
//! recorded per item and the batch carries on.

pub mod report;

pub use report::{BatchReport, ItemOutcome, ItemReport};

use std::path::PathBuf;
use std::sync::Arc;

use ghostforge_av::dash::media_dir;
use ghostforge_av::{
    FfprobeProber, Prober, SubtitleExtractor, ToolRegistry, ToolRunner, TranscodeOutcome,
    Transcoder,
};
use ghostforge_common::{Error, MediaSource, Result};
use ghostforge_db::CatalogStore;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::catalog::{CatalogNormalizer, IngestRequest};
use crate::config::Config;
use crate::metadata::{CoverStore, MetadataFetcher, MetadataProvider};

/// Subdirectory of a media output directory that holds subtitles.
pub const SUBTITLES_DIR: &str = "subtitles";

const CANCELLED: &str = "cancelled";

/// Per-item artifact production: DASH encode then subtitles.
#[derive(Clone)]
struct ArtifactWorker {
    transcoder: Transcoder,
    subtitles: SubtitleExtractor,
    chunks_dir: PathBuf,
}

impl ArtifactWorker {
    async fn process(&self, source: MediaSource, cancel: CancellationToken) -> ItemReport {
        if cancel.is_cancelled() {
            return ItemReport::not_started(source.id, source.title, CANCELLED);
        }

        let mut warnings = Vec::new();

        let transcode = match self
            .transcoder
            .transcode(&source.id, &source.path, &self.chunks_dir, &cancel)
            .await
        {
            Ok(TranscodeOutcome::Encoded { manifest }) => {
                info!(media_id = %source.id, manifest = %manifest.display(), "Encode complete");
                ItemOutcome::Completed
            }
            Ok(TranscodeOutcome::AlreadyPresent {
                complete: true, ..
            }) => ItemOutcome::skipped("output already present"),
            Ok(TranscodeOutcome::AlreadyPresent {
                media_dir,
                complete: false,
            }) => {
                let message = format!(
                    "{}: {} has no manifest; remove it to re-encode",
                    source.title,
                    media_dir.display()
                );
                warn!(media_id = %source.id, "{message}");
                warnings.push(message);
                ItemOutcome::skipped("incomplete output from an earlier run")
            }
            Err(e) if e.is_cancelled() => ItemOutcome::skipped(CANCELLED),
            Err(e) => {
                warn!(media_id = %source.id, error = %e, "Encode failed; continuing with batch");
                warnings.push(format!("{}: encode failed: {}", source.title, e));
                ItemOutcome::failed(e)
            }
        };

        let output = media_dir(&self.chunks_dir, &source.id).join(SUBTITLES_DIR);
        let (subtitles, subtitle_details) = if cancel.is_cancelled() {
            (ItemOutcome::skipped(CANCELLED), None)
        } else {
            match self.subtitles.extract(&source.path, &output, &cancel).await {
                Ok(details) => {
                    for failure in &details.failures {
                        warnings.push(format!("{}: subtitle {}", source.title, failure));
                    }
                    if !details.missing.is_empty() {
                        let missing: Vec<_> = details.missing.iter().map(|l| l.code()).collect();
                        warnings.push(format!(
                            "{}: no subtitles for {}",
                            source.title,
                            missing.join(", ")
                        ));
                    }
                    (ItemOutcome::Completed, Some(details))
                }
                Err(e) if e.is_cancelled() => (ItemOutcome::skipped(CANCELLED), None),
                Err(e) => {
                    warn!(media_id = %source.id, error = %e, "Subtitle extraction failed");
                    warnings.push(format!("{}: subtitles failed: {}", source.title, e));
                    (ItemOutcome::failed(e), None)
                }
            }
        };

        ItemReport {
            media_id: source.id,
            title: source.title,
            transcode,
            subtitles,
            subtitle_details,
            warnings,
        }
    }
}

/// Runs ingestion requests end to end.
#[derive(Clone)]
pub struct IngestPipeline {
    normalizer: CatalogNormalizer,
    store: CatalogStore,
    worker: ArtifactWorker,
    workers: usize,
}

impl IngestPipeline {
    pub fn new(
        normalizer: CatalogNormalizer,
        store: CatalogStore,
        transcoder: Transcoder,
        subtitles: SubtitleExtractor,
        chunks_dir: impl Into<PathBuf>,
        workers: usize,
    ) -> Self {
        Self {
            normalizer,
            store,
            worker: ArtifactWorker {
                transcoder,
                subtitles,
                chunks_dir: chunks_dir.into(),
            },
            workers: workers.max(1),
        }
    }

    /// Assemble a pipeline from configuration.
    ///
    /// `runner` executes every ffmpeg / ffprobe invocation; `provider` answers
    /// metadata lookups.
    pub fn from_config(
        config: &Config,
        store: CatalogStore,
        provider: Arc<dyn MetadataProvider>,
        runner: Arc<dyn ToolRunner>,
        tools: &ToolRegistry,
    ) -> Result<Self> {
        let ffmpeg = tools.ffmpeg()?;
        let prober: Arc<dyn Prober> = Arc::new(FfprobeProber::new(
            tools.ffprobe()?,
            Arc::clone(&runner),
            config.tools.probe_timeout(),
        ));

        let covers = CoverStore::new(&config.paths.covers_dir, config.metadata.timeout())?;
        let normalizer = CatalogNormalizer::new(
            MetadataFetcher::new(provider, Some(covers)),
            Arc::clone(&prober),
            config.ingest.workers,
        );
        let transcoder = Transcoder::new(
            ffmpeg,
            Arc::clone(&prober),
            Arc::clone(&runner),
            config.dash_settings(),
        );
        let subtitles = SubtitleExtractor::new(
            ffmpeg,
            prober,
            runner,
            config.tools.subtitle_timeout(),
        );

        Ok(Self::new(
            normalizer,
            store,
            transcoder,
            subtitles,
            &config.paths.chunks_dir,
            config.ingest.workers,
        ))
    }

    /// Ingest one request.
    ///
    /// Returns an error for validation, provider, persistence and cancellation
    /// failures that happen before the catalog write commits. After that,
    /// every problem is reported inside the [`BatchReport`].
    pub async fn run(
        &self,
        request: &IngestRequest,
        cancel: &CancellationToken,
    ) -> Result<BatchReport> {
        info!(
            mode = request.mode(),
            source = %request.source().display(),
            "Ingesting"
        );

        let normalized = self.normalizer.normalize(request, cancel).await?;
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let entry = Arc::new(normalized.entry);
        let summary = {
            let store = self.store.clone();
            let entry = Arc::clone(&entry);
            tokio::task::spawn_blocking(move || store.persist(&entry))
                .await
                .map_err(|e| Error::internal(format!("catalog write panicked: {e}")))??
        };

        let items = self.produce_artifacts(entry.sources(), cancel).await;

        let mut warnings = normalized.warnings;
        for item in &items {
            warnings.extend(item.warnings.iter().cloned());
        }

        let report = BatchReport {
            catalog_id: entry.id().clone(),
            title: entry.title().to_string(),
            collections_written: summary.collections,
            media_written: summary.media,
            items,
            warnings,
        };
        info!(
            title = %report.title,
            completed = report.count(ItemOutcome::is_completed),
            failed = report.count(ItemOutcome::is_failed),
            warnings = report.warnings.len(),
            "Ingestion finished"
        );
        Ok(report)
    }

    async fn produce_artifacts(
        &self,
        sources: Vec<MediaSource>,
        cancel: &CancellationToken,
    ) -> Vec<ItemReport> {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut handles = Vec::with_capacity(sources.len());

        for source in sources {
            let sem = Arc::clone(&semaphore);
            let worker = self.worker.clone();
            let cancel = cancel.clone();
            let (id, title) = (source.id.clone(), source.title.clone());

            let handle = tokio::spawn(async move {
                let _permit = match sem.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => return ItemReport::not_started(source.id, source.title, CANCELLED),
                };
                worker.process(source, cancel).await
            });
            handles.push((id, title, handle));
        }

        let mut reports = Vec::with_capacity(handles.len());
        for (id, title, handle) in handles {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    warn!(media_id = %id, error = %e, "Artifact worker panicked");
                    let mut report = ItemReport::not_started(id, title, "worker panicked");
                    report.transcode = ItemOutcome::failed(e);
                    reports.push(report);
                }
            }
        }
        reports
    }
}
