mod cli;

use ghostforge::{
    catalog::IngestRequest,
    config::{self, Config},
    metadata::OmdbProvider,
    IngestPipeline,
};
use ghostforge_av::{FfprobeProber, Prober, SystemRunner, ToolRegistry};
use ghostforge_db::{pool::init_pool, CatalogStore};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn tool_registry(config: &Config) -> ToolRegistry {
    ToolRegistry::discover(
        config.tools.ffmpeg_path.as_deref(),
        config.tools.ffprobe_path.as_deref(),
    )
}

fn open_store(config: &Config) -> Result<CatalogStore> {
    let db_path = config.paths.database.to_string_lossy();
    tracing::debug!("Opening catalog database at {}", db_path);
    let pool = init_pool(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path))?;
    Ok(CatalogStore::new(pool))
}

async fn ingest(config: Config, request: IngestRequest) -> Result<()> {
    let store = open_store(&config)?;
    let tools = tool_registry(&config);
    let provider = Arc::new(OmdbProvider::new(
        config.metadata.base_url.clone(),
        config.metadata.api_key.clone(),
        config.metadata.timeout(),
    )?);

    let pipeline =
        IngestPipeline::from_config(&config, store, provider, Arc::new(SystemRunner), &tools)?;

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, cancelling batch");
                cancel.cancel();
            }
        })
    };

    let result = pipeline.run(&request, &cancel).await;
    ctrl_c.abort();

    let report = result.with_context(|| {
        format!(
            "Ingestion of {} ({}) failed",
            request.source().display(),
            request.mode()
        )
    })?;

    print!("{}", report);
    if report.has_failures() {
        tracing::warn!("Some artifacts failed; see the report above");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the --verbose default
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "ghostforge=trace,ghostforge_av=debug,ghostforge_db=debug,ghostforge_common=debug"
                .to_string()
        } else {
            "ghostforge=info,ghostforge_av=info,ghostforge_db=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Movie { file, url } => run_ingest(
            config_path,
            IngestRequest::Standalone {
                source: file,
                reference: url,
            },
        )?,
        Commands::Series {
            dir,
            url,
            episode_urls,
        } => run_ingest(
            config_path,
            IngestRequest::Series {
                source: dir,
                reference: url,
                episode_references: episode_urls,
            },
        )?,
        Commands::Collection {
            dir,
            title,
            id,
            description,
            movies,
        } => run_ingest(
            config_path,
            IngestRequest::Collection {
                source: dir,
                id,
                title,
                description,
                movies: movies.into_iter().collect(),
            },
        )?,
        Commands::Request { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read request file: {:?}", file))?;
            let request = IngestRequest::parse(&content, &file)?;
            run_ingest(config_path, request)?;
        }
        Commands::Probe { file, json } => {
            let config = config::load_config_or_default(config_path)?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(probe_file(&config, &file, json))?;
        }
        Commands::Show { id } => {
            let config = config::load_config_or_default(config_path)?;
            show(&config, &id)?;
        }
        Commands::CheckTools => {
            let config = config::load_config_or_default(config_path)?;
            check_tools(&config);
        }
        Commands::Validate => {
            validate_config(config_path)?;
        }
        Commands::Version => {
            println!("ghostforge {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn run_ingest(config_path: Option<&Path>, request: IngestRequest) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(ingest(config, request))
}

async fn probe_file(config: &Config, path: &Path, json: bool) -> Result<()> {
    let tools = tool_registry(config);
    let prober = FfprobeProber::new(
        tools.ffprobe()?,
        Arc::new(SystemRunner),
        config.tools.probe_timeout(),
    );
    let media_info = prober
        .probe(path, &CancellationToken::new())
        .await
        .with_context(|| format!("Failed to probe {:?}", path))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&media_info)?);
        return Ok(());
    }

    println!("File: {}", media_info.file_path.display());
    if let Some(ref container) = media_info.container {
        println!("Container: {}", container);
    }
    if let Some(ref duration) = media_info.duration {
        let secs = duration.as_secs();
        let mins = secs / 60;
        let hours = mins / 60;
        println!("Duration: {:02}:{:02}:{:02}", hours, mins % 60, secs % 60);
    }
    println!("Resolution: {}", media_info.resolution_category());

    println!("\nVideo Tracks: {}", media_info.video_tracks.len());
    for track in &media_info.video_tracks {
        print!("  [{}] {} {}x{}", track.index, track.codec, track.width, track.height);
        if let Some(fps) = track.frame_rate {
            print!(", {:.3} fps", fps);
        }
        println!();
    }

    println!("\nAudio Tracks: {}", media_info.audio_tracks.len());
    for track in &media_info.audio_tracks {
        print!("  [{}] {} {}ch", track.index, track.codec, track.channels);
        if let Some(ref lang) = track.language {
            print!(" ({})", lang);
        }
        if track.default {
            print!(" [default]");
        }
        println!();
    }

    println!("\nSubtitle Tracks: {}", media_info.subtitle_tracks.len());
    for track in &media_info.subtitle_tracks {
        print!("  [{}] {}", track.index, track.codec);
        if let Some(ref lang) = track.language {
            print!(" ({})", lang);
        }
        if let Some(language) = ghostforge_av::subtitles::resolve_language(track) {
            print!(" -> {}.vtt", language.code());
        }
        if track.forced {
            print!(" [forced]");
        }
        println!();
    }

    Ok(())
}

fn show(config: &Config, id: &str) -> Result<()> {
    let store = open_store(config)?;

    if let Some(collection) = store.get_collection(id)? {
        let members = store.list_media_for_collection(id)?;
        let value = serde_json::json!({
            "collection": collection,
            "media": members,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match store.get_media(id)? {
        Some(media) => {
            println!("{}", serde_json::to_string_pretty(&media)?);
            Ok(())
        }
        None => anyhow::bail!("No collection or media with ID {}", id),
    }
}

fn check_tools(config: &Config) {
    println!("Checking external tools...\n");

    let tools = tool_registry(config).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to transcode and extract subtitles.");
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, using default locations");
            config::load_config_or_default(None)?
        }
    };

    println!("✓ Configuration is valid");
    println!("  Database: {}", config.paths.database.display());
    println!("  Covers: {}", config.paths.covers_dir.display());
    println!("  Chunks: {}", config.paths.chunks_dir.display());
    println!("  Metadata provider: {}", config.metadata.base_url);
    println!(
        "  API key: {}",
        if config.metadata.api_key.is_some() {
            "configured"
        } else {
            "missing"
        }
    );
    println!("  Transcode strategy: {:?}", config.dash_settings().strategy);
    println!("  Workers: {}", config.ingest.workers);

    Ok(())
}
