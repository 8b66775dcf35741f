//! Cover art storage.
//!
//! Covers are written as `{covers_dir}/{ID}.png`, keyed by the ID of the
//! record they illustrate. The bytes are stored as served.

use std::path::PathBuf;
use std::time::Duration;

use ghostforge_common::{ContentId, Error, Result};
use tracing::debug;

/// Downloads poster images into the covers directory.
#[derive(Clone)]
pub struct CoverStore {
    client: reqwest::Client,
    dir: PathBuf,
}

impl CoverStore {
    pub fn new(dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::provider(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            dir: dir.into(),
        })
    }

    /// Where the cover for `id` lives.
    pub fn cover_path(&self, id: &ContentId) -> PathBuf {
        self.dir.join(format!("{id}.png"))
    }

    /// Download `url` and store it as the cover of `id`.
    pub async fn download(&self, url: &str, id: &ContentId) -> Result<PathBuf> {
        let data = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| Error::provider(format!("cover download {url}: {e}")))?
            .bytes()
            .await
            .map_err(|e| Error::provider(format!("cover download {url}: {e}")))?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.cover_path(id);
        tokio::fs::write(&path, &data).await?;
        debug!(path = %path.display(), bytes = data.len(), "Cover stored");
        Ok(path)
    }
}
