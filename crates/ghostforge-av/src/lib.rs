//! # ghostforge-av
//!
//! External media tooling for ghostforge.
//!
//! This crate provides:
//! - [`ToolCommand`] / [`ToolRunner`]: command construction and execution with
//!   timeouts and cooperative cancellation
//! - [`ToolRegistry`]: ffmpeg / ffprobe discovery
//! - [`probe`]: ffprobe stream layout parsing behind the [`Prober`] trait
//! - [`resolution`]: resolution classification that never fails the caller
//! - [`dash`]: segmented DASH encoding into per-ID output directories
//! - [`subtitles`]: extraction into canonical `en` / `es` WebVTT files
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use ghostforge_av::{FfprobeProber, Prober, SystemRunner, ToolRegistry};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> ghostforge_av::Result<()> {
//! let tools = ToolRegistry::discover(None, None);
//! let prober = FfprobeProber::new(tools.ffprobe()?, Arc::new(SystemRunner), Duration::from_secs(60));
//! let info = prober.probe("/media/movie.mkv".as_ref(), &CancellationToken::new()).await?;
//! println!("{} audio streams", info.audio_tracks.len());
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod dash;
mod error;
pub mod probe;
pub mod resolution;
pub mod subtitles;
pub mod tools;

pub use command::{SystemRunner, ToolCommand, ToolOutput, ToolRunner};
pub use dash::{DashSettings, EncodingStrategy, TranscodeOutcome, Transcoder};
pub use error::{Error, Result};
pub use probe::{AudioTrack, FfprobeProber, MediaInfo, Prober, SubtitleTrack, VideoTrack};
pub use resolution::resolve_resolution;
pub use subtitles::{CanonicalLanguage, SubtitleExtractor, SubtitleReport};
pub use tools::{ToolInfo, ToolRegistry};
