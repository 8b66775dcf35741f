//! FFprobe-based media probing.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::types::*;
use super::Prober;
use crate::command::{ToolCommand, ToolRunner};
use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    channels: Option<u32>,
    #[serde(default)]
    disposition: FfprobeDisposition,
    #[serde(default)]
    tags: FfprobeTags,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeDisposition {
    #[serde(default)]
    default: u8,
    #[serde(default)]
    forced: u8,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeTags {
    language: Option<String>,
    title: Option<String>,
}

/// Build the ffprobe invocation that dumps format and streams as JSON.
pub fn probe_command(ffprobe: &Path, source: &Path, timeout: Duration) -> ToolCommand {
    ToolCommand::new(ffprobe)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .path_arg(source)
        .timeout(timeout)
}

/// Parse ffprobe's JSON output.
///
/// Stream indices are positions within each stream type, matching ffmpeg's
/// `0:v:N` / `0:a:N` / `0:s:N` selectors.
pub fn parse_ffprobe_json(path: &Path, json: &str) -> Result<MediaInfo> {
    let output: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| Error::parse_error("ffprobe", format!("{}: {}", path.display(), e)))?;

    let (container, duration) = match output.format {
        Some(format) => (
            format.format_name,
            format
                .duration
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .map(Duration::from_secs_f64),
        ),
        None => (None, None),
    };

    let mut info = MediaInfo {
        file_path: path.to_path_buf(),
        container,
        duration,
        ..Default::default()
    };

    for stream in output.streams {
        match stream.codec_type.as_deref() {
            Some("video") => {
                info.video_tracks.push(VideoTrack {
                    index: info.video_tracks.len() as u32,
                    codec: stream.codec_name.unwrap_or_default(),
                    width: stream.width.unwrap_or(0),
                    height: stream.height.unwrap_or(0),
                    frame_rate: stream.r_frame_rate.and_then(|s| parse_frame_rate(&s)),
                });
            }
            Some("audio") => {
                info.audio_tracks.push(AudioTrack {
                    index: info.audio_tracks.len() as u32,
                    codec: stream.codec_name.unwrap_or_default(),
                    channels: stream.channels.unwrap_or(2),
                    language: stream.tags.language,
                    title: stream.tags.title,
                    default: stream.disposition.default == 1,
                });
            }
            Some("subtitle") => {
                info.subtitle_tracks.push(SubtitleTrack {
                    index: info.subtitle_tracks.len() as u32,
                    codec: stream.codec_name.unwrap_or_default(),
                    language: stream.tags.language,
                    title: stream.tags.title,
                    default: stream.disposition.default == 1,
                    forced: stream.disposition.forced == 1,
                });
            }
            _ => {}
        }
    }

    Ok(info)
}

fn parse_frame_rate(rate_str: &str) -> Option<f64> {
    let parts: Vec<&str> = rate_str.split('/').collect();
    if parts.len() == 2 {
        let num: f64 = parts[0].parse().ok()?;
        let den: f64 = parts[1].parse().ok()?;
        if den != 0.0 {
            return Some(num / den);
        }
    }
    rate_str.parse().ok()
}

/// [`Prober`] that shells out to ffprobe through a [`ToolRunner`].
#[derive(Clone)]
pub struct FfprobeProber {
    ffprobe: PathBuf,
    runner: Arc<dyn ToolRunner>,
    timeout: Duration,
}

impl FfprobeProber {
    pub fn new(ffprobe: impl Into<PathBuf>, runner: Arc<dyn ToolRunner>, timeout: Duration) -> Self {
        Self {
            ffprobe: ffprobe.into(),
            runner,
            timeout,
        }
    }
}

#[async_trait]
impl Prober for FfprobeProber {
    async fn probe(&self, path: &Path, cancel: &CancellationToken) -> Result<MediaInfo> {
        let command = probe_command(&self.ffprobe, path, self.timeout);
        let output = self.runner.run(&command, cancel).await?;
        parse_ffprobe_json(path, &output.stdout)
    }
}
