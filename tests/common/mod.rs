//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which wires a real [`IngestPipeline`] to an
//! in-memory catalog, temporary source/output trees, a wiremock server
//! standing in for the metadata provider, and [`FakeRunner`] standing in for
//! ffmpeg and ffprobe.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ghostforge::config::Config;
use ghostforge::metadata::OmdbProvider;
use ghostforge::IngestPipeline;
use ghostforge_av::{Error as AvError, Result as AvResult, ToolCommand, ToolOutput, ToolRegistry, ToolRunner};
use ghostforge_db::pool::init_memory_pool;
use ghostforge_db::CatalogStore;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// ffprobe JSON for a file with one video stream, `audio` audio streams and
/// the given `(language, title)` subtitle streams.
pub fn probe_json(width: u32, height: u32, audio: usize, subs: &[(Option<&str>, Option<&str>)]) -> String {
    let mut streams = vec![json!({
        "codec_type": "video", "codec_name": "h264", "width": width, "height": height,
        "r_frame_rate": "24/1"
    })];
    for _ in 0..audio {
        streams.push(json!({"codec_type": "audio", "codec_name": "aac", "channels": 2}));
    }
    for (language, title) in subs {
        let mut tags = serde_json::Map::new();
        if let Some(l) = language {
            tags.insert("language".into(), json!(l));
        }
        if let Some(t) = title {
            tags.insert("title".into(), json!(t));
        }
        streams.push(json!({"codec_type": "subtitle", "codec_name": "subrip", "tags": tags}));
    }
    json!({"streams": streams, "format": {"format_name": "matroska,webm", "duration": "60.0"}})
        .to_string()
}

fn arg_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Records every invocation and answers like ffmpeg / ffprobe would.
///
/// ffprobe answers come from [`FakeRunner::set_probe`] keyed by file name,
/// falling back to a 1080p file with one audio stream and no subtitles. DASH
/// encodes write the manifest; subtitle conversions write the `.vtt` file.
#[derive(Default)]
pub struct FakeRunner {
    probes: Mutex<HashMap<String, String>>,
    failing_probes: Mutex<HashSet<String>>,
    failing_encodes: Mutex<HashSet<String>>,
    failing_subtitle_streams: Mutex<HashSet<String>>,
    calls: Mutex<Vec<ToolCommand>>,
}

impl FakeRunner {
    pub fn set_probe(&self, file: &str, json: String) {
        self.probes.lock().unwrap().insert(file.to_string(), json);
    }

    pub fn fail_probe(&self, file: &str) {
        self.failing_probes.lock().unwrap().insert(file.to_string());
    }

    pub fn fail_encode(&self, file: &str) {
        self.failing_encodes.lock().unwrap().insert(file.to_string());
    }

    /// Fail conversion of subtitle stream `0:s:{index}` of every file.
    pub fn fail_subtitle_stream(&self, index: u32) {
        self.failing_subtitle_streams
            .lock()
            .unwrap()
            .insert(format!("0:s:{index}"));
    }

    pub fn calls(&self) -> Vec<ToolCommand> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of DASH encodes attempted.
    pub fn encode_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.tool_name() == "ffmpeg" && c.get_args().iter().any(|a| a == "dash"))
            .count()
    }

    /// Subtitle stream selectors (`0:s:N`) converted into `lang`.
    pub fn subtitle_maps(&self) -> Vec<(String, String)> {
        self.calls()
            .iter()
            .filter(|c| c.get_args().iter().any(|a| a == "webvtt"))
            .filter_map(|c| {
                let args = c.get_args();
                let map = arg_after(args, "-map")?.to_string();
                let output = args.get(args.len().checked_sub(2)?)?;
                Some((map, file_name(output)))
            })
            .collect()
    }
}

#[async_trait]
impl ToolRunner for FakeRunner {
    async fn run(
        &self,
        command: &ToolCommand,
        _cancel: &tokio_util::sync::CancellationToken,
    ) -> AvResult<ToolOutput> {
        self.calls.lock().unwrap().push(command.clone());
        let args = command.get_args();

        match command.tool_name().as_str() {
            "ffprobe" => {
                let source = file_name(args.last().map(String::as_str).unwrap_or_default());
                if self.failing_probes.lock().unwrap().contains(&source) {
                    return Err(AvError::tool_failed("ffprobe", "Invalid data found"));
                }
                let json = self
                    .probes
                    .lock()
                    .unwrap()
                    .get(&source)
                    .cloned()
                    .unwrap_or_else(|| probe_json(1920, 1080, 1, &[]));
                Ok(ToolOutput::success(json))
            }
            "ffmpeg" if args.iter().any(|a| a == "webvtt") => {
                let map = arg_after(args, "-map").unwrap_or_default().to_string();
                if self.failing_subtitle_streams.lock().unwrap().contains(&map) {
                    return Err(AvError::tool_failed("ffmpeg", "conversion failed"));
                }
                let output = &args[args.len() - 2];
                std::fs::write(output, "WEBVTT\n\n")?;
                Ok(ToolOutput::success(""))
            }
            "ffmpeg" => {
                let source = file_name(arg_after(args, "-i").unwrap_or_default());
                if self.failing_encodes.lock().unwrap().contains(&source) {
                    return Err(AvError::tool_failed("ffmpeg", "exited with status 1"));
                }
                let manifest = args.last().map(String::as_str).unwrap_or_default();
                std::fs::write(manifest, "<MPD/>")?;
                Ok(ToolOutput::success(""))
            }
            other => Err(AvError::tool_not_found(other)),
        }
    }
}

/// OMDb success envelope.
pub fn omdb_title(title: &str, rating: &str, genre: &str, poster: Option<&str>) -> Value {
    json!({
        "Title": title,
        "Year": "2008",
        "Plot": format!("{title} plot."),
        "imdbRating": rating,
        "Genre": genre,
        "Director": "Vince Gilligan",
        "Poster": poster.unwrap_or("N/A"),
        "Response": "True"
    })
}

/// Test harness wrapping an [`IngestPipeline`] with fake collaborators.
pub struct TestHarness {
    pub media: TempDir,
    pub output: TempDir,
    pub server: MockServer,
    pub runner: Arc<FakeRunner>,
    pub store: CatalogStore,
    pub config: Config,
}

impl TestHarness {
    pub async fn new() -> Self {
        let media = tempfile::tempdir().expect("media dir");
        let output = tempfile::tempdir().expect("output dir");
        let server = MockServer::start().await;

        let mut config = Config::default();
        config.paths.covers_dir = output.path().join("covers");
        config.paths.chunks_dir = output.path().join("chunks");
        config.metadata.base_url = format!("{}/", server.uri());
        config.metadata.api_key = Some("test-key".into());

        let store = CatalogStore::new(init_memory_pool().expect("failed to create in-memory pool"));

        Self {
            media,
            output,
            server,
            runner: Arc::new(FakeRunner::default()),
            store,
            config,
        }
    }

    pub fn pipeline(&self) -> IngestPipeline {
        let provider = OmdbProvider::new(
            self.config.metadata.base_url.clone(),
            self.config.metadata.api_key.clone(),
            self.config.metadata.timeout(),
        )
        .expect("provider");
        IngestPipeline::from_config(
            &self.config,
            self.store.clone(),
            Arc::new(provider),
            self.runner.clone(),
            &ToolRegistry::with_paths("ffmpeg", "ffprobe"),
        )
        .expect("pipeline")
    }

    /// Create an empty file under the media root.
    pub fn touch(&self, relative: &str) -> PathBuf {
        let path = self.media.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, b"").unwrap();
        path
    }

    pub fn chunks(&self) -> PathBuf {
        self.config.paths.chunks_dir.clone()
    }

    pub fn covers(&self) -> PathBuf {
        self.config.paths.covers_dir.clone()
    }

    /// Answer lookups of `reference` with `body`.
    pub async fn mount_title(&self, reference: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("i", reference))
            .and(query_param("apikey", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Serve `bytes` at `url_path` and return its absolute URL.
    pub async fn mount_poster(&self, url_path: &str, bytes: &[u8]) -> String {
        Mock::given(method("GET"))
            .and(path(url_path))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes.to_vec()))
            .mount(&self.server)
            .await;
        format!("{}{}", self.server.uri(), url_path)
    }

    pub fn poster_url(&self, url_path: &str) -> String {
        format!("{}{}", self.server.uri(), url_path)
    }
}
