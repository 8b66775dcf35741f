//! Batch reports.
//!
//! Every artifact step for every media item ends in an [`ItemOutcome`]. Fatal
//! errors never reach a report; they abort the request instead.

use std::fmt;

use ghostforge_av::SubtitleReport;
use ghostforge_common::ContentId;
use serde::Serialize;

/// Result of one artifact step for one media item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    Completed,
    Skipped { reason: String },
    Failed { error: String },
}

impl ItemOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(error: impl fmt::Display) -> Self {
        Self::Failed {
            error: error.to_string(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Skipped { reason } => write!(f, "skipped ({reason})"),
            Self::Failed { error } => write!(f, "failed ({error})"),
        }
    }
}

/// Artifact production for one media item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemReport {
    pub media_id: ContentId,
    pub title: String,
    pub transcode: ItemOutcome,
    pub subtitles: ItemOutcome,
    /// Present when subtitle extraction ran.
    pub subtitle_details: Option<SubtitleReport>,
    pub warnings: Vec<String>,
}

impl ItemReport {
    /// Report for an item that never started.
    pub fn not_started(media_id: ContentId, title: String, reason: &str) -> Self {
        Self {
            media_id,
            title,
            transcode: ItemOutcome::skipped(reason),
            subtitles: ItemOutcome::skipped(reason),
            subtitle_details: None,
            warnings: Vec::new(),
        }
    }
}

/// Everything one ingestion request did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub catalog_id: ContentId,
    pub title: String,
    pub collections_written: usize,
    pub media_written: usize,
    pub items: Vec<ItemReport>,
    /// Non-fatal problems from normalization and every item.
    pub warnings: Vec<String>,
}

impl BatchReport {
    pub fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.items
            .iter()
            .flat_map(|i| [&i.transcode, &i.subtitles])
            .filter(|o| pred(*o))
            .count()
    }

    /// Whether any artifact step failed.
    pub fn has_failures(&self) -> bool {
        self.count(ItemOutcome::is_failed) > 0
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.title, self.catalog_id)?;
        writeln!(
            f,
            "  catalog: {} collection(s), {} media row(s) written",
            self.collections_written, self.media_written
        )?;
        for item in &self.items {
            writeln!(f, "  {} [{}]", item.title, item.media_id)?;
            writeln!(f, "    transcode: {}", item.transcode)?;
            write!(f, "    subtitles: {}", item.subtitles)?;
            if let Some(details) = &item.subtitle_details {
                let langs: Vec<_> = details.extracted.iter().map(|s| s.language.code()).collect();
                if !langs.is_empty() {
                    write!(f, " [{}]", langs.join(", "))?;
                }
            }
            writeln!(f)?;
        }
        if !self.warnings.is_empty() {
            writeln!(f, "  warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {warning}")?;
            }
        }
        Ok(())
    }
}
