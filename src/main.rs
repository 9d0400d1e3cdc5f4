use async_openai::{config::OpenAIConfig, Client};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use narrator_backend::controllers::{article::ArticleController, health::HealthController, task::TaskController};
use narrator_backend::domain::article::{ArticleService, IntakeSettings};
use narrator_backend::domain::text::TextAssistant;
use narrator_backend::domain::tts::{CircuitBreaker, OrchestratorSettings, SynthesisOrchestrator, VoiceCatalog};
use narrator_backend::infrastructure::config::{Config, LogFormat};
use narrator_backend::infrastructure::http::{build_router, start_http_server};
use narrator_backend::infrastructure::llm::OpenAiTextAssistant;
use narrator_backend::infrastructure::pdf::PdfToTextExtractor;
use narrator_backend::infrastructure::queue::JobQueue;
use narrator_backend::infrastructure::repositories::FileArticleRepository;
use narrator_backend::infrastructure::transcode::FfmpegTranscoder;
use narrator_backend::infrastructure::tts::build_registry;

/// Upper bound for one ffmpeg or pdftotext run
const SUBPROCESS_TIMEOUT: Duration = Duration::from_secs(120);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting Narrator Backend on {}:{}",
        config.host,
        config.port
    );

    tokio::fs::create_dir_all(&config.audio_out_dir).await?;
    tokio::fs::create_dir_all(&config.cleaned_dir).await?;
    tracing::info!(
        audio_out_dir = %config.audio_out_dir.display(),
        cleaned_dir = %config.cleaned_dir.display(),
        "Storage directories ready"
    );

    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Speech synthesis: engines, breaker, transcoder, orchestrator
    tracing::info!("Instantiating TTS providers...");
    let catalog = Arc::new(VoiceCatalog::default());
    let registry = Arc::new(
        build_registry(
            &config.tts,
            config.llm.openai_api_key.as_deref(),
            &config.audio_out_dir,
            catalog.clone(),
        )
        .await,
    );
    if !registry.contains(&config.tts.provider) {
        tracing::warn!(
            provider = %config.tts.provider,
            "Primary TTS provider is not available, jobs will use the fallback order"
        );
    }

    let breaker = Arc::new(CircuitBreaker::default());
    let transcoder = Arc::new(FfmpegTranscoder::new(
        config.tts.ffmpeg_path.clone(),
        config.tts.mp3_bitrate.clone(),
        config.tts.transcode_sample_rate,
        SUBPROCESS_TIMEOUT,
    ));
    let orchestrator = Arc::new(SynthesisOrchestrator::new(
        registry.clone(),
        breaker.clone(),
        transcoder,
        OrchestratorSettings {
            primary_provider: config.tts.provider.clone(),
            provider_order: config.tts.provider_order.clone(),
            default_voice: config.tts.voice.clone(),
            language_voices: config.tts.language_voices.clone(),
            voices: catalog,
            rate: config.tts.rate,
            delivery_format: config.tts.format,
            keep_intermediate_master: config.tts.keep_intermediate_master,
            output_dir: config.audio_out_dir.clone(),
        },
    ));

    // 2. Job queue and its workers
    let job_queue = Arc::new(JobQueue::start(orchestrator, &config.worker));

    // 3. Intake collaborators
    tracing::info!("Instantiating repositories...");
    let article_repo = Arc::new(FileArticleRepository::new(config.cleaned_dir.clone()));
    let pdf_extractor = Arc::new(PdfToTextExtractor::new(
        config.pdftotext_path.clone(),
        SUBPROCESS_TIMEOUT,
    ));
    let text_assistant: Option<Arc<dyn TextAssistant>> =
        match (config.llm.is_active(), config.llm.openai_api_key.as_deref()) {
            (true, Some(api_key)) => {
                tracing::info!(model = %config.llm.model, "LLM text assistant enabled");
                let client = Client::with_config(OpenAIConfig::new().with_api_key(api_key));
                Some(Arc::new(OpenAiTextAssistant::new(
                    Arc::new(client),
                    config.llm.model.clone(),
                )))
            }
            _ => None,
        };

    // 4. Services
    tracing::info!("Instantiating services...");
    let article_service = Arc::new(ArticleService::new(
        article_repo,
        job_queue.clone(),
        pdf_extractor,
        text_assistant,
        IntakeSettings {
            max_upload_bytes: config.max_upload_bytes,
            chunk_char_limit: config.chunk_char_limit,
            delivery_format: config.tts.format,
            clean_by_default: config.llm.cleaning_enabled,
            extract_title: config.llm.title_enabled,
            audio_dir: config.audio_out_dir.clone(),
        },
    ));

    // 5. Controllers
    tracing::info!("Instantiating controllers...");
    let health_controller = Arc::new(HealthController::new(registry, breaker, job_queue));
    let article_controller = Arc::new(ArticleController::new(article_service.clone()));
    let task_controller = Arc::new(TaskController::new(article_service));

    let app = build_router(&config, health_controller, article_controller, task_controller);

    // Start HTTP server with all routes
    start_http_server(config, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "narrator_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "narrator_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
