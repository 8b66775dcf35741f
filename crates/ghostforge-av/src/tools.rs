//! External tool detection and management.
//!
//! The [`ToolRegistry`] resolves where ffmpeg and ffprobe live, preferring a
//! configured path over a `PATH` lookup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;

use crate::{Error, Result};

pub const FFMPEG: &str = "ffmpeg";
pub const FFPROBE: &str = "ffprobe";

/// Tools the ingestion pipeline invokes.
const KNOWN_TOOLS: &[&str] = &[FFMPEG, FFPROBE];

/// Information about an external tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Registry holding resolved tool locations.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, PathBuf>,
}

impl ToolRegistry {
    /// Resolve every known tool.
    ///
    /// An override is used when it exists on disk; otherwise [`which::which`]
    /// searches `PATH`. Tools that cannot be found are left out, and
    /// [`ToolRegistry::require`] reports them when first needed.
    pub fn discover(ffmpeg_override: Option<&Path>, ffprobe_override: Option<&Path>) -> Self {
        let mut tools = BTreeMap::new();

        for &name in KNOWN_TOOLS {
            let custom = match name {
                FFMPEG => ffmpeg_override,
                FFPROBE => ffprobe_override,
                _ => None,
            };
            if let Ok(path) = get_tool_path(name, custom) {
                tools.insert(name.to_string(), path);
            }
        }

        Self { tools }
    }

    /// Registry with fixed paths and no filesystem checks.
    pub fn with_paths(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        let mut tools = BTreeMap::new();
        tools.insert(FFMPEG.to_string(), ffmpeg.into());
        tools.insert(FFPROBE.to_string(), ffprobe.into());
        Self { tools }
    }

    /// Path of a registered tool, or [`Error::ToolNotFound`].
    pub fn require(&self, name: &str) -> Result<&Path> {
        self.tools
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| Error::tool_not_found(name))
    }

    pub fn ffmpeg(&self) -> Result<&Path> {
        self.require(FFMPEG)
    }

    pub fn ffprobe(&self) -> Result<&Path> {
        self.require(FFPROBE)
    }

    /// Check all known tools and return availability information.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        KNOWN_TOOLS
            .iter()
            .map(|&name| match self.tools.get(name) {
                Some(path) => {
                    let version = detect_version(path);
                    ToolInfo {
                        name: name.to_string(),
                        available: version.is_some(),
                        version,
                        path: Some(path.clone()),
                    }
                }
                None => ToolInfo {
                    name: name.to_string(),
                    available: false,
                    version: None,
                    path: None,
                },
            })
            .collect()
    }
}

/// Require that a tool is available on `PATH`, returning its path.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| Error::tool_not_found(name))
}

/// Get the path to a tool, preferring a configured path over PATH lookup.
pub fn get_tool_path(name: &str, config_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = config_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!(tool = name, path = %path.display(), "Configured tool path does not exist, searching PATH");
    }

    require_tool(name)
}

/// Run `<tool> -version` and return the first line of stdout.
fn detect_version(path: &Path) -> Option<String> {
    let output = Command::new(path).arg("-version").output().ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_does_not_panic() {
        let registry = ToolRegistry::discover(None, None);
        let infos = registry.check_all();
        let names: Vec<&str> = infos.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["ffmpeg", "ffprobe"]);
    }

    #[test]
    fn missing_override_falls_back_to_path_lookup() {
        let registry = ToolRegistry::discover(
            Some(Path::new("/definitely/not/here/ffmpeg")),
            None,
        );
        if let Ok(path) = registry.ffmpeg() {
            assert_ne!(path, Path::new("/definitely/not/here/ffmpeg"));
        }
    }

    #[test]
    fn require_missing_tool_returns_error() {
        let registry = ToolRegistry::default();
        assert!(matches!(
            registry.require("ffmpeg"),
            Err(Error::ToolNotFound { .. })
        ));
    }

    #[test]
    fn fixed_paths_are_returned_verbatim() {
        let registry = ToolRegistry::with_paths("/opt/ff/ffmpeg", "/opt/ff/ffprobe");
        assert_eq!(registry.ffmpeg().unwrap(), Path::new("/opt/ff/ffmpeg"));
        assert_eq!(registry.ffprobe().unwrap(), Path::new("/opt/ff/ffprobe"));
    }

    #[test]
    fn unrunnable_tool_reported_unavailable() {
        let registry = ToolRegistry::with_paths("/opt/ff/ffmpeg", "/opt/ff/ffprobe");
        for info in registry.check_all() {
            assert!(!info.available);
            assert!(info.path.is_some());
        }
    }
}
