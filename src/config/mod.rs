mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Environment variable that overrides `[metadata] api_key`.
pub const API_KEY_ENV: &str = "GHOSTFORGE_API_KEY";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config = parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    apply_api_key_override(&mut config, std::env::var(API_KEY_ENV).ok());
    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./ghostforge.toml",
        "./config.toml",
        "~/.config/ghostforge/config.toml",
        "/etc/ghostforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    let mut config = Config::default();
    apply_api_key_override(&mut config, std::env::var(API_KEY_ENV).ok());
    Ok(config)
}

/// Parse and validate a TOML document, expanding `~` in configured paths.
pub fn parse_config(content: &str) -> Result<Config> {
    let mut config: Config = toml::from_str(content)?;
    expand_paths(&mut config);
    validate_config(&config)?;
    Ok(config)
}

fn apply_api_key_override(config: &mut Config, env_value: Option<String>) {
    if let Some(key) = env_value.filter(|k| !k.trim().is_empty()) {
        config.metadata.api_key = Some(key);
    }
}

fn expand(path: &Path) -> std::path::PathBuf {
    let raw = path.to_string_lossy();
    std::path::PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}

fn expand_paths(config: &mut Config) {
    config.paths.database = expand(&config.paths.database);
    config.paths.covers_dir = expand(&config.paths.covers_dir);
    config.paths.chunks_dir = expand(&config.paths.chunks_dir);
    if let Some(p) = config.tools.ffmpeg_path.as_mut() {
        *p = expand(p);
    }
    if let Some(p) = config.tools.ffprobe_path.as_mut() {
        *p = expand(p);
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.ingest.workers == 0 {
        anyhow::bail!("ingest.workers must be at least 1");
    }

    if config.transcode.segment_duration_secs == 0 {
        anyhow::bail!("transcode.segment_duration_secs must be at least 1");
    }

    if config.transcode.crf > 51 {
        anyhow::bail!("transcode.crf must be between 0 and 51");
    }

    let timeouts = [
        ("metadata.timeout_secs", config.metadata.timeout_secs),
        ("tools.probe_timeout_secs", config.tools.probe_timeout_secs),
        ("tools.transcode_timeout_secs", config.tools.transcode_timeout_secs),
        ("tools.subtitle_timeout_secs", config.tools.subtitle_timeout_secs),
    ];
    for (name, value) in timeouts {
        if value == 0 {
            anyhow::bail!("{name} must be greater than 0");
        }
    }

    if config.metadata.base_url.trim().is_empty() {
        anyhow::bail!("metadata.base_url cannot be empty");
    }

    Ok(())
}
