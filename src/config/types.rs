use std::path::PathBuf;
use std::time::Duration;

use ghostforge_av::{DashSettings, EncodingStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub metadata: MetadataConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub transcode: TranscodeConfig,

    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Where the catalog and its artifacts live.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// SQLite database file
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Cover art root (`{covers_dir}/{ID}.png`)
    #[serde(default = "default_covers_dir")]
    pub covers_dir: PathBuf,

    /// Streaming output root (`{chunks_dir}/{ID}/...`)
    #[serde(default = "default_chunks_dir")]
    pub chunks_dir: PathBuf,
}

fn default_database() -> PathBuf {
    PathBuf::from("ghost.db")
}

fn default_covers_dir() -> PathBuf {
    PathBuf::from("covers")
}

fn default_chunks_dir() -> PathBuf {
    PathBuf::from("chunks")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            covers_dir: default_covers_dir(),
            chunks_dir: default_chunks_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetadataConfig {
    /// Provider credential. `GHOSTFORGE_API_KEY` takes precedence when set.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout for lookups and cover downloads (default: 30)
    #[serde(default = "default_metadata_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://www.omdbapi.com/".to_string()
}

fn default_metadata_timeout() -> u64 {
    30
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            timeout_secs: default_metadata_timeout(),
        }
    }
}

impl MetadataConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    #[serde(default = "default_transcode_timeout")]
    pub transcode_timeout_secs: u64,

    #[serde(default = "default_subtitle_timeout")]
    pub subtitle_timeout_secs: u64,
}

fn default_probe_timeout() -> u64 {
    60
}

fn default_transcode_timeout() -> u64 {
    6 * 60 * 60
}

fn default_subtitle_timeout() -> u64 {
    600
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            probe_timeout_secs: default_probe_timeout(),
            transcode_timeout_secs: default_transcode_timeout(),
            subtitle_timeout_secs: default_subtitle_timeout(),
        }
    }
}

impl ToolsConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn subtitle_timeout(&self) -> Duration {
        Duration::from_secs(self.subtitle_timeout_secs)
    }
}

/// Which encoder profile [`TranscodeConfig`] selects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    TieredBitrate,
    ConstantQuality,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscodeConfig {
    #[serde(default)]
    pub strategy: StrategyKind,

    /// CRF for `constant_quality` (0 = pick from source height)
    #[serde(default = "default_crf")]
    pub crf: u32,

    #[serde(default = "default_preset")]
    pub preset: String,

    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    #[serde(default = "default_segment_duration")]
    pub segment_duration_secs: u32,
}

fn default_crf() -> u32 {
    20
}

fn default_preset() -> String {
    "medium".to_string()
}

fn default_audio_bitrate() -> String {
    "192k".to_string()
}

fn default_segment_duration() -> u32 {
    4
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            crf: default_crf(),
            preset: default_preset(),
            audio_bitrate: default_audio_bitrate(),
            segment_duration_secs: default_segment_duration(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Media items processed concurrently (default: 2)
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    2
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

impl Config {
    /// Encoder settings for the transcode stage.
    pub fn dash_settings(&self) -> DashSettings {
        let strategy = match self.transcode.strategy {
            StrategyKind::TieredBitrate => EncodingStrategy::TieredBitrate,
            StrategyKind::ConstantQuality => EncodingStrategy::ConstantQuality {
                crf: self.transcode.crf,
                preset: self.transcode.preset.clone(),
            },
        };
        DashSettings {
            strategy,
            audio_bitrate: self.transcode.audio_bitrate.clone(),
            segment_duration_secs: self.transcode.segment_duration_secs,
            timeout: Duration::from_secs(self.tools.transcode_timeout_secs),
        }
    }
}
