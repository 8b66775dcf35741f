//! Segmented DASH output for streaming.
//!
//! Each media item owns `{chunks_root}/{id}/`. The directory is claimed with a
//! non-recursive `create_dir`, so an existing directory means the item was
//! already encoded (or is being encoded by someone else) and is skipped. A
//! finished encode is one whose `{id}.mpd` manifest exists.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use ghostforge_common::ContentId;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::command::{ToolCommand, ToolRunner};
use crate::probe::{MediaInfo, Prober};
use crate::{Error, Result};

pub const INIT_SEGMENT_TEMPLATE: &str = "init-stream$RepresentationID$.m4s";
pub const MEDIA_SEGMENT_TEMPLATE: &str = "chunk-stream$RepresentationID$-$Number%05d$.m4s";
pub const MANIFEST_EXTENSION: &str = "mpd";

/// How the video stream is re-encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum EncodingStrategy {
    /// Fixed bitrate chosen from the source resolution tier.
    #[default]
    TieredBitrate,
    /// Constant-quality encode. A `crf` of 0 picks a value from the source height.
    ConstantQuality { crf: u32, preset: String },
}

/// Encoder settings shared by every item in a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct DashSettings {
    pub strategy: EncodingStrategy,
    pub audio_bitrate: String,
    pub segment_duration_secs: u32,
    pub timeout: Duration,
}

impl Default for DashSettings {
    fn default() -> Self {
        Self {
            strategy: EncodingStrategy::TieredBitrate,
            audio_bitrate: "192k".to_string(),
            segment_duration_secs: 4,
            timeout: Duration::from_secs(6 * 60 * 60),
        }
    }
}

/// Video bitrate for a source resolution.
///
/// Either axis reaching a tier selects it, so ultrawide and portrait sources
/// get the bitrate of their larger dimension.
///
/// # Examples
///
/// ```
/// use ghostforge_av::dash::recommended_bitrate;
///
/// assert_eq!(recommended_bitrate(3840, 2160), "45000k");
/// assert_eq!(recommended_bitrate(1920, 800), "10000k");
/// assert_eq!(recommended_bitrate(640, 480), "3000k");
/// ```
pub fn recommended_bitrate(width: u32, height: u32) -> &'static str {
    if width >= 3840 || height >= 2160 {
        "45000k"
    } else if width >= 2560 || height >= 1440 {
        "20000k"
    } else if width >= 1920 || height >= 1080 {
        "10000k"
    } else if width >= 1280 || height >= 720 {
        "6000k"
    } else {
        "3000k"
    }
}

/// CRF picked from the source height when no explicit value is configured.
///
/// Lower resolutions get a lower (higher quality) CRF.
pub fn adaptive_crf_from_resolution(height: u32) -> u32 {
    if height <= 480 {
        12
    } else if height <= 720 {
        14
    } else if height <= 1080 {
        15
    } else {
        18
    }
}

/// Output directory of a media item.
pub fn media_dir(chunks_root: &Path, id: &ContentId) -> PathBuf {
    chunks_root.join(id.as_str())
}

/// Manifest path of a media item.
pub fn manifest_path(chunks_root: &Path, id: &ContentId) -> PathBuf {
    media_dir(chunks_root, id).join(format!("{}.{}", id.as_str(), MANIFEST_EXTENSION))
}

/// Video group first, then one group per audio stream.
fn adaptation_sets(audio_streams: usize) -> String {
    (0..=audio_streams)
        .map(|i| format!("id={i},streams={i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the ffmpeg invocation for one item.
///
/// ffmpeg runs from `output_dir`, so `source` and `manifest` must be absolute.
/// Fails with [`Error::InvalidInput`] when the source has no video stream.
pub fn build_dash_command(
    ffmpeg: &Path,
    source: &Path,
    output_dir: &Path,
    manifest: &Path,
    info: &MediaInfo,
    settings: &DashSettings,
) -> Result<ToolCommand> {
    let video = info.primary_video().ok_or_else(|| {
        Error::InvalidInput(format!("no video stream in {}", source.display()))
    })?;
    let (width, height) = if video.has_dimensions() {
        (video.width, video.height)
    } else {
        (1920, 1080)
    };

    let mut cmd = ToolCommand::new(ffmpeg)
        .arg("-i")
        .path_arg(source)
        .args(["-map", "0:v:0", "-c:v", "libx264"]);

    cmd = match &settings.strategy {
        EncodingStrategy::TieredBitrate => {
            let bitrate = recommended_bitrate(width, height);
            debug!(width, height, bitrate, "Selected tiered bitrate");
            cmd.args(["-b:v:0", bitrate])
        }
        EncodingStrategy::ConstantQuality { crf, preset } => {
            let crf = if *crf == 0 {
                adaptive_crf_from_resolution(height)
            } else {
                *crf
            };
            debug!(height, crf, "Selected constant quality");
            cmd.arg("-crf")
                .arg(crf.to_string())
                .arg("-preset")
                .arg(preset.as_str())
        }
    };

    let audio_streams = info.audio_tracks.len();
    for i in 0..audio_streams {
        cmd = cmd
            .arg("-map")
            .arg(format!("0:a:{i}"))
            .arg(format!("-c:a:{i}"))
            .arg("aac")
            .arg(format!("-b:a:{i}"))
            .arg(settings.audio_bitrate.as_str());
    }

    Ok(cmd
        .args(["-f", "dash", "-use_template", "1", "-use_timeline", "1"])
        .arg("-adaptation_sets")
        .arg(adaptation_sets(audio_streams))
        .arg("-seg_duration")
        .arg(settings.segment_duration_secs.to_string())
        .args(["-init_seg_name", INIT_SEGMENT_TEMPLATE])
        .args(["-media_seg_name", MEDIA_SEGMENT_TEMPLATE])
        .arg("-y")
        .path_arg(manifest)
        .current_dir(output_dir)
        .timeout(settings.timeout))
}

/// Result of a transcode request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeOutcome {
    /// A new manifest was written.
    Encoded { manifest: PathBuf },
    /// The output directory already existed; nothing was encoded.
    ///
    /// `complete` tells whether that directory holds a manifest. An
    /// incomplete directory is left by an earlier failed or interrupted run.
    AlreadyPresent { media_dir: PathBuf, complete: bool },
}

/// Encodes media items into per-ID DASH directories.
#[derive(Clone)]
pub struct Transcoder {
    ffmpeg: PathBuf,
    prober: Arc<dyn Prober>,
    runner: Arc<dyn ToolRunner>,
    settings: DashSettings,
}

impl Transcoder {
    pub fn new(
        ffmpeg: impl Into<PathBuf>,
        prober: Arc<dyn Prober>,
        runner: Arc<dyn ToolRunner>,
        settings: DashSettings,
    ) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            prober,
            runner,
            settings,
        }
    }

    /// Encode `source` into `{chunks_root}/{id}/` unless that directory exists.
    ///
    /// A failed encode leaves its directory behind without a manifest.
    /// Relative paths are resolved against the working directory of this
    /// process, not the one ffmpeg runs in.
    pub async fn transcode(
        &self,
        id: &ContentId,
        source: &Path,
        chunks_root: &Path,
        cancel: &CancellationToken,
    ) -> Result<TranscodeOutcome> {
        let source = std::path::absolute(source)?;
        let chunks_root = std::path::absolute(chunks_root)?;
        tokio::fs::create_dir_all(&chunks_root).await?;

        let dir = media_dir(&chunks_root, id);
        let manifest = manifest_path(&chunks_root, id);
        match tokio::fs::create_dir(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let complete = tokio::fs::try_exists(&manifest).await.unwrap_or(false);
                debug!(media_id = %id, complete, "Output directory exists; skipping encode");
                return Ok(TranscodeOutcome::AlreadyPresent {
                    media_dir: dir,
                    complete,
                });
            }
            Err(e) => return Err(e.into()),
        }

        let info = self.prober.probe(&source, cancel).await?;
        let command = build_dash_command(&self.ffmpeg, &source, &dir, &manifest, &info, &self.settings)?;

        info!(
            media_id = %id,
            source = %source.display(),
            audio_streams = info.audio_tracks.len(),
            "Encoding DASH output"
        );
        self.runner.run(&command, cancel).await?;

        if !tokio::fs::try_exists(&manifest).await.unwrap_or(false) {
            return Err(Error::tool_failed(
                command.tool_name(),
                format!("finished without writing {}", manifest.display()),
            ));
        }

        Ok(TranscodeOutcome::Encoded { manifest })
    }
}
