//! Media file probing module.
//!
//! [`Prober`] is the seam the rest of the crate probes through; the shipped
//! implementation is [`FfprobeProber`].

mod ffprobe;
mod types;

pub use ffprobe::{parse_ffprobe_json, probe_command, FfprobeProber};
pub use types::*;

use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::Result;

/// Extracts the stream layout of a media file.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, path: &Path, cancel: &CancellationToken) -> Result<MediaInfo>;
}
