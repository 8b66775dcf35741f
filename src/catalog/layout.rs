//! Season and episode discovery in a series directory.
//!
//! Subdirectories are seasons, numbered from 1 in lexicographic order of their
//! names. Files inside a season are episodes, numbered from 1 in
//! lexicographic order and restarting for every season. A series directory
//! without subdirectories is a single season made of its own files.

use std::path::{Path, PathBuf};

use ghostforge_common::paths::{episode_title_from_file_name, is_episode_candidate, is_hidden};
use ghostforge_common::{Error, Result};
use tracing::{debug, warn};

/// One discovered episode file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeFile {
    pub season: u32,
    pub episode: u32,
    /// Display title derived from the file name.
    pub title: String,
    pub path: PathBuf,
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(entries)
}

fn season_episodes(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(sorted_entries(dir)?
        .into_iter()
        .filter(|p| p.is_file() && is_episode_candidate(p))
        .collect())
}

/// Discover every episode under `series_dir`.
///
/// Season directories that hold no episodes are skipped and do not consume a
/// season number. Fails with a validation error when nothing is found.
pub fn discover_episodes(series_dir: &Path) -> Result<Vec<EpisodeFile>> {
    if !series_dir.is_dir() {
        return Err(Error::validation(format!(
            "series source {} is not a directory",
            series_dir.display()
        )));
    }

    let season_dirs: Vec<PathBuf> = sorted_entries(series_dir)?
        .into_iter()
        .filter(|p| p.is_dir() && !is_hidden(p))
        .collect();

    let seasons: Vec<Vec<PathBuf>> = if season_dirs.is_empty() {
        vec![season_episodes(series_dir)?]
    } else {
        let mut seasons = Vec::with_capacity(season_dirs.len());
        for dir in &season_dirs {
            let files = season_episodes(dir)?;
            if files.is_empty() {
                warn!(dir = %dir.display(), "Season directory has no episodes; skipping");
                continue;
            }
            seasons.push(files);
        }
        seasons
    };

    let mut episodes = Vec::new();
    for (season_idx, files) in seasons.into_iter().enumerate() {
        let season = season_idx as u32 + 1;
        for (episode_idx, path) in files.into_iter().enumerate() {
            let episode = episode_idx as u32 + 1;
            let title = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(episode_title_from_file_name)
                .unwrap_or_else(|| format!("S{season:02}E{episode:02}"));
            debug!(season, episode, title = %title, "Discovered episode");
            episodes.push(EpisodeFile {
                season,
                episode,
                title,
                path,
            });
        }
    }

    if episodes.is_empty() {
        return Err(Error::validation(format!(
            "series source {} contains no episodes",
            series_dir.display()
        )));
    }

    Ok(episodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    fn numbering(episodes: &[EpisodeFile]) -> Vec<(u32, u32, &str)> {
        episodes
            .iter()
            .map(|e| (e.season, e.episode, e.title.as_str()))
            .collect()
    }

    #[test]
    fn test_lexicographic_numbering() {
        let dir = tempdir().unwrap();
        for name in ["b", "a", "c"] {
            touch(&dir.path().join("Season 1").join(name));
        }

        let episodes = discover_episodes(dir.path()).unwrap();
        assert_eq!(numbering(&episodes), vec![(1, 1, "a"), (1, 2, "b"), (1, 3, "c")]);
    }

    #[test]
    fn test_numbering_restarts_per_season() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("S02/[HQ] Finale [1080p].mkv"));
        touch(&dir.path().join("S01/02 Second.mkv"));
        touch(&dir.path().join("S01/01 First.mkv"));

        let episodes = discover_episodes(dir.path()).unwrap();
        assert_eq!(
            numbering(&episodes),
            vec![(1, 1, "01 First"), (1, 2, "02 Second"), (2, 1, "Finale")]
        );
    }

    #[test]
    fn test_sidecars_and_hidden_files_are_ignored() {
        let dir = tempdir().unwrap();
        let season = dir.path().join("S01");
        touch(&season.join("ep1.mkv"));
        touch(&season.join("ep1.srt"));
        touch(&season.join("metadata.json"));
        touch(&season.join(".DS_Store"));
        touch(&dir.path().join(".hidden/ep.mkv"));

        let episodes = discover_episodes(dir.path()).unwrap();
        assert_eq!(numbering(&episodes), vec![(1, 1, "ep1")]);
    }

    #[test]
    fn test_root_files_form_season_one() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("pilot.mkv"));
        touch(&dir.path().join("[Group].mkv"));

        let episodes = discover_episodes(dir.path()).unwrap();
        assert_eq!(
            numbering(&episodes),
            vec![(1, 1, "S01E01"), (1, 2, "pilot")]
        );
    }

    #[test]
    fn test_untitled_episodes_stay_distinct_across_seasons() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("S01/[1080p].mkv"));
        touch(&dir.path().join("S02/[1080p].mkv"));

        let episodes = discover_episodes(dir.path()).unwrap();
        assert_eq!(
            numbering(&episodes),
            vec![(1, 1, "S01E01"), (2, 1, "S02E01")]
        );
    }

    #[test]
    fn test_empty_season_does_not_take_a_number() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("S00 Extras")).unwrap();
        touch(&dir.path().join("S01/x.mkv"));

        let episodes = discover_episodes(dir.path()).unwrap();
        assert_eq!(episodes[0].season, 1);
    }

    #[test]
    fn test_empty_series_is_validation_error() {
        let dir = tempdir().unwrap();
        let err = discover_episodes(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = discover_episodes(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
