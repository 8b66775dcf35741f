//! Media information types.

use std::path::PathBuf;
use std::time::Duration;

use ghostforge_common::ResolutionCategory;
use serde::{Deserialize, Serialize};

/// Stream layout of a media file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Path to the media file.
    pub file_path: PathBuf,
    /// Container format name as reported by the prober (e.g. "matroska,webm").
    pub container: Option<String>,
    /// Duration of the media.
    pub duration: Option<Duration>,
    /// Video tracks in the file.
    pub video_tracks: Vec<VideoTrack>,
    /// Audio tracks in the file.
    pub audio_tracks: Vec<AudioTrack>,
    /// Subtitle tracks in the file.
    pub subtitle_tracks: Vec<SubtitleTrack>,
}

/// Information about a video track.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoTrack {
    /// Position among the file's video streams (`0:v:{index}`).
    pub index: u32,
    /// Video codec (e.g. "hevc", "h264").
    pub codec: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Frame rate in FPS.
    pub frame_rate: Option<f64>,
}

/// Information about an audio track.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioTrack {
    /// Position among the file's audio streams (`0:a:{index}`).
    pub index: u32,
    /// Audio codec (e.g. "aac", "truehd").
    pub codec: String,
    /// Number of channels.
    pub channels: u32,
    /// Language tag (e.g. "eng", "spa").
    pub language: Option<String>,
    /// Track title.
    pub title: Option<String>,
    /// Whether this is the default track.
    pub default: bool,
}

/// Information about a subtitle track.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubtitleTrack {
    /// Position among the file's subtitle streams (`0:s:{index}`).
    pub index: u32,
    /// Subtitle format (e.g. "subrip", "ass", "hdmv_pgs_subtitle").
    pub codec: String,
    /// Language tag (e.g. "eng", "spa").
    pub language: Option<String>,
    /// Track title.
    pub title: Option<String>,
    /// Whether this is the default track.
    pub default: bool,
    /// Whether this is a forced track.
    pub forced: bool,
}

impl MediaInfo {
    /// Get the primary (first) video track.
    pub fn primary_video(&self) -> Option<&VideoTrack> {
        self.video_tracks.first()
    }

    /// Resolution bucket of the primary video track.
    ///
    /// A missing video track or unreported dimensions give `Undefined`.
    pub fn resolution_category(&self) -> ResolutionCategory {
        match self.primary_video() {
            Some(v) if v.has_dimensions() => ResolutionCategory::classify(v.width, v.height),
            _ => ResolutionCategory::Undefined,
        }
    }
}

impl VideoTrack {
    /// Whether the prober reported both width and height.
    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}
