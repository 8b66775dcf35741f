//! Path utilities for classifying files in a source tree.
//!
//! Series discovery treats every regular file as an episode candidate unless
//! it is hidden or a known sidecar (subtitles, artwork, metadata dumps).

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// Extensions of files that sit next to media but are never episodes.
const SIDECAR_EXTENSIONS: &[&str] = &[
    "srt", "ass", "ssa", "sub", "vtt", "idx", "jpg", "jpeg", "png", "gif", "webp", "bmp",
    "json", "nfo", "txt",
];

static BRACKETED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[^\]]*\]").expect("bracket pattern is valid")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Check if a path is a sidecar file (subtitle, artwork, metadata).
pub fn is_sidecar_file(path: &Path) -> bool {
    lowercase_extension(path)
        .map(|ext| SIDECAR_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Check if the final path component starts with a dot.
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

/// Whether a file found in a season directory should become an episode.
pub fn is_episode_candidate(path: &Path) -> bool {
    !is_hidden(path) && !is_sidecar_file(path)
}

/// Derive an episode display title from its file name.
///
/// Square-bracketed tokens (release tags, group names, checksums) are removed,
/// the extension is dropped, and runs of whitespace collapse to one space.
/// Returns `None` when nothing is left.
///
/// # Examples
///
/// ```
/// use ghostforge_common::paths::episode_title_from_file_name;
///
/// assert_eq!(
///     episode_title_from_file_name("[Group] Pilot [1080p].mkv").as_deref(),
///     Some("Pilot")
/// );
/// ```
pub fn episode_title_from_file_name(file_name: &str) -> Option<String> {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    let stripped = BRACKETED.replace_all(stem, " ");
    let title = WHITESPACE.replace_all(stripped.trim(), " ").to_string();
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}
