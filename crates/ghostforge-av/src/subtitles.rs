//! Subtitle extraction into canonical WebVTT slots.
//!
//! Every source gets at most one `en.vtt` and one `es.vtt`. Streams are walked
//! in order; the first one that resolves to an unfilled language and converts
//! successfully fills that slot.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::{ToolCommand, ToolRunner};
use crate::probe::{Prober, SubtitleTrack};
use crate::{Error, Result};

/// An output subtitle slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum CanonicalLanguage {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "es")]
    Spanish,
}

impl CanonicalLanguage {
    pub const ALL: [CanonicalLanguage; 2] = [Self::English, Self::Spanish];

    /// Slot code, also the output file stem.
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Spanish => "es",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.vtt", self.code())
    }
}

impl fmt::Display for CanonicalLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

static ENGLISH_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(en|eng|english)\b").expect("english pattern is valid")
});

static SPANISH_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(es|spa|esp|spanish|español|castellano|latino)\b")
        .expect("spanish pattern is valid")
});

/// Map a stream language tag to a slot.
pub fn language_from_tag(tag: &str) -> Option<CanonicalLanguage> {
    match tag.trim().to_lowercase().as_str() {
        "en" | "eng" | "english" => Some(CanonicalLanguage::English),
        "es" | "spa" | "esp" | "spanish" | "español" | "castellano" => {
            Some(CanonicalLanguage::Spanish)
        }
        _ => None,
    }
}

/// Find a language name as a whole word in a free-text stream title.
///
/// When both languages appear, the earlier mention wins.
pub fn language_from_title(title: &str) -> Option<CanonicalLanguage> {
    let english = ENGLISH_WORDS.find(title).map(|m| m.start());
    let spanish = SPANISH_WORDS.find(title).map(|m| m.start());
    match (english, spanish) {
        (Some(en), Some(es)) if es < en => Some(CanonicalLanguage::Spanish),
        (Some(_), _) => Some(CanonicalLanguage::English),
        (None, Some(_)) => Some(CanonicalLanguage::Spanish),
        (None, None) => None,
    }
}

/// Resolve a stream's slot from its tag, falling back to its title.
pub fn resolve_language(track: &SubtitleTrack) -> Option<CanonicalLanguage> {
    track
        .language
        .as_deref()
        .and_then(language_from_tag)
        .or_else(|| track.title.as_deref().and_then(language_from_title))
}

/// Build the conversion of subtitle stream `index` into `output`.
pub fn subtitle_command(
    ffmpeg: &Path,
    source: &Path,
    index: u32,
    output: &Path,
    timeout: Duration,
) -> ToolCommand {
    ToolCommand::new(ffmpeg)
        .arg("-i")
        .path_arg(source)
        .arg("-map")
        .arg(format!("0:s:{index}"))
        .args(["-c:s", "webvtt"])
        .path_arg(output)
        .arg("-y")
        .timeout(timeout)
}

/// One written subtitle file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedSubtitle {
    pub language: CanonicalLanguage,
    pub stream_index: u32,
    pub path: PathBuf,
}

/// What subtitle extraction did for one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubtitleReport {
    pub extracted: Vec<ExtractedSubtitle>,
    /// Streams whose language could not be resolved.
    pub unresolved: Vec<u32>,
    /// Streams ignored because their slot was already filled.
    pub duplicates: Vec<u32>,
    /// Per-stream conversion failures.
    pub failures: Vec<String>,
    /// Slots nothing filled.
    pub missing: Vec<CanonicalLanguage>,
}

impl SubtitleReport {
    pub fn has(&self, language: CanonicalLanguage) -> bool {
        self.extracted.iter().any(|s| s.language == language)
    }
}

/// Converts embedded subtitle streams into the canonical slots.
#[derive(Clone)]
pub struct SubtitleExtractor {
    ffmpeg: PathBuf,
    prober: Arc<dyn Prober>,
    runner: Arc<dyn ToolRunner>,
    timeout: Duration,
}

impl SubtitleExtractor {
    pub fn new(
        ffmpeg: impl Into<PathBuf>,
        prober: Arc<dyn Prober>,
        runner: Arc<dyn ToolRunner>,
        timeout: Duration,
    ) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            prober,
            runner,
            timeout,
        }
    }

    /// Extract subtitles of `source` into `output_dir/{en,es}.vtt`.
    ///
    /// A failing probe fails the call. A failing stream conversion is recorded
    /// in the report and the next stream is tried.
    pub async fn extract(
        &self,
        source: &Path,
        output_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<SubtitleReport> {
        let info = self.prober.probe(source, cancel).await?;
        let mut report = SubtitleReport::default();

        for track in &info.subtitle_tracks {
            let Some(language) = resolve_language(track) else {
                debug!(stream = track.index, "Subtitle language unresolved; skipping");
                report.unresolved.push(track.index);
                continue;
            };
            if report.has(language) {
                report.duplicates.push(track.index);
                continue;
            }

            tokio::fs::create_dir_all(output_dir).await?;
            let output = output_dir.join(language.file_name());
            let command = subtitle_command(&self.ffmpeg, source, track.index, &output, self.timeout);

            match self.runner.run(&command, cancel).await {
                Ok(_) => {
                    info!(
                        source = %source.display(),
                        stream = track.index,
                        language = %language,
                        "Subtitle extracted"
                    );
                    report.extracted.push(ExtractedSubtitle {
                        language,
                        stream_index: track.index,
                        path: output,
                    });
                }
                Err(e @ Error::Cancelled { .. }) => return Err(e),
                Err(e) => {
                    warn!(
                        source = %source.display(),
                        stream = track.index,
                        error = %e,
                        "Subtitle conversion failed"
                    );
                    report
                        .failures
                        .push(format!("stream {} ({}): {}", track.index, language, e));
                }
            }
        }

        report.missing = CanonicalLanguage::ALL
            .into_iter()
            .filter(|l| !report.has(*l))
            .collect();
        if !report.missing.is_empty() {
            let missing: Vec<_> = report.missing.iter().map(|l| l.code()).collect();
            warn!(source = %source.display(), missing = ?missing, "Subtitle slots left unfilled");
        }

        Ok(report)
    }
}
