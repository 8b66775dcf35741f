use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ghostforge")]
#[command(author, version, about = "Media catalog ingestion tool")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest a standalone movie file
    Movie {
        /// Movie file
        #[arg(required = true)]
        file: PathBuf,

        /// Title URL (or bare reference) of the movie
        #[arg(long)]
        url: String,
    },

    /// Ingest a series directory (one subdirectory per season)
    Series {
        /// Series directory
        #[arg(required = true)]
        dir: PathBuf,

        /// Title URL (or bare reference) of the series
        #[arg(long)]
        url: String,

        /// Per-episode URL, in episode discovery order (repeatable)
        #[arg(long = "episode-url")]
        episode_urls: Vec<String>,
    },

    /// Ingest a directory of movies as one collection
    Collection {
        /// Directory holding the movie files
        #[arg(required = true)]
        dir: PathBuf,

        /// Collection title
        #[arg(long)]
        title: String,

        /// Explicit collection ID (derived from the title if omitted)
        #[arg(long)]
        id: Option<String>,

        /// Collection description
        #[arg(long)]
        description: Option<String>,

        /// Member movie as FILE=URL, FILE relative to DIR (repeatable)
        #[arg(long = "movie", value_parser = parse_movie_pair, required = true)]
        movies: Vec<(String, String)>,
    },

    /// Ingest a request described in a TOML or JSON file
    Request {
        /// Request file (`.json` for JSON, TOML otherwise)
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Probe a media file and display information
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a persisted collection or media row
    Show {
        /// Collection or media ID
        #[arg(required = true)]
        id: String,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate,

    /// Display version information
    Version,
}

/// Parse `FILE=URL`.
fn parse_movie_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((file, url)) if !file.trim().is_empty() && !url.trim().is_empty() => {
            Ok((file.trim().to_string(), url.trim().to_string()))
        }
        _ => Err(format!("expected FILE=URL, got '{s}'")),
    }
}
