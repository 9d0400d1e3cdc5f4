use anyhow::Result;
use async_trait::async_trait;
use narrator_backend::domain::tts::{
    AudioFormat, CircuitBreaker, OrchestratorSettings, ProviderError, SynthesisOrchestrator,
    TranscodeError, VoiceHint,
};
use narrator_backend::infrastructure::config::{Config, TtsConfig, WorkerConfig};
use narrator_backend::infrastructure::transcode::Transcoder;
use narrator_backend::infrastructure::tts::{ProviderRegistry, SynthesisEngine};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use test_context::AsyncTestContext;
use tokio::net::TcpListener;
use uuid::Uuid;

pub mod api_client;

use api_client::TestClient;

/// Text marker that makes the primary fake provider fail
pub const PRIMARY_FAILS: &str = "[primary-fails]";

/// Text marker that makes every fake provider fail
pub const ALL_FAIL: &str = "[all-fail]";

/// Bytes the fake transcoder writes for every delivery file
pub const ENCODED_AUDIO: &[u8] = b"ID3-encoded-audio";

pub const MAX_UPLOAD_BYTES: usize = 64 * 1024;

/// Writes a small WAV-like master and counts calls
pub struct FakeEngine {
    name: String,
    fail_marker: Option<&'static str>,
    scratch_dir: PathBuf,
    calls: AtomicUsize,
}

impl FakeEngine {
    fn new(name: &str, fail_marker: Option<&'static str>, scratch_dir: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            fail_marker,
            scratch_dir,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SynthesisEngine for FakeEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn synthesize(
        &self,
        text: &str,
        _voice: &VoiceHint,
        _rate: Option<u32>,
        format: AudioFormat,
    ) -> Result<PathBuf, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let fails = text.contains(ALL_FAIL) || self.fail_marker.map_or(false, |m| text.contains(m));
        if fails {
            return Err(ProviderError::Request {
                provider: self.name.clone(),
                message: "engine unavailable".to_string(),
            });
        }

        let path = self
            .scratch_dir
            .join(format!("{}_{}.{}", self.name, Uuid::new_v4().simple(), format.extension()));
        tokio::fs::write(&path, b"RIFF-fake-master")
            .await
            .map_err(|e| ProviderError::io(&self.name, e))?;
        Ok(path)
    }
}

/// Stands in for ffmpeg
pub struct FakeTranscoder;

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn transcode(&self, _input: &Path, output: &Path, _format: AudioFormat) -> Result<(), TranscodeError> {
        tokio::fs::write(output, ENCODED_AUDIO)
            .await
            .map_err(|e| TranscodeError::Spawn(e.to_string()))
    }
}

/// Fails every PDF that is not `%PDF-fake`
pub struct FakePdfExtractor;

#[async_trait]
impl narrator_backend::infrastructure::pdf::PdfTextExtractor for FakePdfExtractor {
    async fn extract_text(&self, pdf: &[u8]) -> anyhow::Result<String> {
        if pdf.starts_with(b"%PDF-fake") {
            Ok("Quarterly Report\n\nRevenue grew.\nCosts fell.".to_string())
        } else {
            anyhow::bail!("file is not a PDF document")
        }
    }
}

pub struct TestContext {
    pub client: TestClient,
    #[allow(dead_code)]
    pub config: Config,
    pub primary: Arc<FakeEngine>,
    pub backup: Arc<FakeEngine>,
    _dir: TempDir,
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let scratch_dir = dir.path().join("scratch");
            std::fs::create_dir_all(&scratch_dir).expect("Failed to create scratch dir");

            // Create test configuration
            let config = Config {
                host: "127.0.0.1".to_string(),
                port: 0, // Will be assigned by the OS
                audio_out_dir: dir.path().join("static"),
                cleaned_dir: dir.path().join("cleaned"),
                max_upload_bytes: MAX_UPLOAD_BYTES,
                tts: TtsConfig {
                    provider: "piper".to_string(),
                    provider_order: vec!["piper".to_string(), "openai".to_string()],
                    format: AudioFormat::Mp3,
                    ..TtsConfig::default()
                },
                worker: WorkerConfig {
                    concurrency: 2,
                    queue_capacity: 64,
                    job_time_limit_sec: 30,
                    status_ttl_hours: 1,
                },
                ..Config::default()
            };
            std::fs::create_dir_all(&config.audio_out_dir).expect("Failed to create audio dir");

            let primary = Arc::new(FakeEngine::new("piper", Some(PRIMARY_FAILS), scratch_dir.clone()));
            let backup = Arc::new(FakeEngine::new("openai", None, scratch_dir));

            let app = create_app_with_fake_engines(&config, primary.clone(), backup.clone());

            // Start server
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind listener");
            let addr = listener.local_addr().expect("Failed to get local addr");
            let base_url = format!("http://{}", addr);

            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            // Wait for server to be ready
            tokio::time::sleep(Duration::from_millis(50)).await;

            Self {
                client: TestClient::new(&base_url),
                config,
                primary,
                backup,
                _dir: dir,
            }
        }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async {
            // Temp directories are removed on drop
        }
    }
}

fn create_app_with_fake_engines(
    config: &Config,
    primary: Arc<FakeEngine>,
    backup: Arc<FakeEngine>,
) -> axum::Router {
    use narrator_backend::{
        controllers::{article::ArticleController, health::HealthController, task::TaskController},
        domain::article::{ArticleService, IntakeSettings},
        infrastructure::{
            http::build_router, queue::JobQueue, repositories::FileArticleRepository,
        },
    };

    let registry = Arc::new(ProviderRegistry::new());
    registry.register("piper", primary);
    registry.register("openai", backup);

    let breaker = Arc::new(CircuitBreaker::default());
    let orchestrator = Arc::new(SynthesisOrchestrator::new(
        registry.clone(),
        breaker.clone(),
        Arc::new(FakeTranscoder),
        OrchestratorSettings {
            primary_provider: config.tts.provider.clone(),
            provider_order: config.tts.provider_order.clone(),
            default_voice: None,
            language_voices: Default::default(),
            voices: Default::default(),
            rate: None,
            delivery_format: config.tts.format,
            keep_intermediate_master: false,
            output_dir: config.audio_out_dir.clone(),
        },
    ));
    let job_queue = Arc::new(JobQueue::start(orchestrator, &config.worker));

    let article_service = Arc::new(ArticleService::new(
        Arc::new(FileArticleRepository::new(config.cleaned_dir.clone())),
        job_queue.clone(),
        Arc::new(FakePdfExtractor),
        None,
        IntakeSettings {
            max_upload_bytes: config.max_upload_bytes,
            chunk_char_limit: config.chunk_char_limit,
            delivery_format: config.tts.format,
            clean_by_default: false,
            extract_title: false,
            audio_dir: config.audio_out_dir.clone(),
        },
    ));

    build_router(
        config,
        Arc::new(HealthController::new(registry, breaker, job_queue)),
        Arc::new(ArticleController::new(article_service.clone())),
        Arc::new(TaskController::new(article_service)),
    )
}

impl TestContext {
    /// Poll the task status endpoint until the job finishes
    pub async fn wait_for_task(&self, task_id: &str) -> Result<Value> {
        for _ in 0..300 {
            let response = self.client.get(&format!("/task_status/{}", task_id)).await?;
            if let Some(body) = response.body {
                let status = body.get("status").and_then(|s| s.as_str()).unwrap_or_default();
                if status == "succeeded" || status == "failed" {
                    return Ok(body);
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        anyhow::bail!("task {} did not finish in time", task_id)
    }

    /// Poll article progress until nothing is pending
    pub async fn wait_for_article(&self, article_id: &str) -> Result<Value> {
        for _ in 0..300 {
            let response = self
                .client
                .get(&format!("/api/article/{}/progress", article_id))
                .await?;
            if let Some(body) = response.body {
                if body.get("pending").and_then(|p| p.as_u64()) == Some(0) {
                    return Ok(body);
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        anyhow::bail!("article {} did not finish in time", article_id)
    }

    /// Upload a text document and return the created article
    pub async fn upload_text(&self, filename: &str, text: &str) -> Result<Value> {
        let response = self
            .client
            .post_file("/upload", filename, text.as_bytes())
            .await?;
        response.body.ok_or_else(|| anyhow::anyhow!("upload returned no body"))
    }
}
