//! Resolution classification of source files.

use std::path::Path;

use ghostforge_common::ResolutionCategory;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::probe::Prober;
use crate::{Error, Result};

/// Probe `path` and bucket its primary video stream.
///
/// Probe failures (tool error, malformed output, no video stream) degrade to
/// [`ResolutionCategory::Undefined`]. Only cancellation is returned as an
/// error.
pub async fn resolve_resolution(
    prober: &dyn Prober,
    path: &Path,
    cancel: &CancellationToken,
) -> Result<ResolutionCategory> {
    match prober.probe(path, cancel).await {
        Ok(info) => {
            let category = info.resolution_category();
            if category == ResolutionCategory::Undefined {
                warn!(path = %path.display(), "No usable video stream; resolution undefined");
            }
            Ok(category)
        }
        Err(e @ Error::Cancelled { .. }) => Err(e),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Probe failed; resolution undefined");
            Ok(ResolutionCategory::Undefined)
        }
    }
}
