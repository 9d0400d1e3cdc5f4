pub mod cache;
pub mod openai_tts_provider;
pub mod piper_cli_provider;
pub mod piper_http_provider;
pub mod polly_tts_provider;
pub mod registry;

use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::tts::{AudioFormat, ProviderError, VoiceCatalog, VoiceHint};
use crate::infrastructure::config::{PiperMode, TtsConfig};

pub use cache::AudioCache;
pub use openai_tts_provider::OpenAiTtsProvider;
pub use piper_cli_provider::PiperCliProvider;
pub use piper_http_provider::PiperHttpProvider;
pub use polly_tts_provider::PollyTtsProvider;
pub use registry::ProviderRegistry;

/// A speech synthesis backend.
///
/// Implementations cache their own output: calling `synthesize` again with
/// the same arguments after a success returns the cached file without
/// invoking the engine.
#[async_trait]
pub trait SynthesisEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Synthesize `text` and return the path of the produced audio file
    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceHint,
        rate: Option<u32>,
        format: AudioFormat,
    ) -> Result<PathBuf, ProviderError>;
}

/// Register every engine the configuration can support.
///
/// Piper is always available. OpenAI needs an API key, Polly is only set up
/// when it is named as the primary provider or in the fallback order.
pub async fn build_registry(
    config: &TtsConfig,
    openai_api_key: Option<&str>,
    audio_root: &Path,
    catalog: Arc<VoiceCatalog>,
) -> ProviderRegistry {
    let registry = ProviderRegistry::new();
    let piper_timeout = Duration::from_secs(config.piper_timeout_sec);

    let piper: Arc<dyn SynthesisEngine> = match config.piper_mode {
        PiperMode::Http => Arc::new(PiperHttpProvider::new(
            config.piper_url.clone(),
            catalog.clone(),
            AudioCache::new(audio_root, piper_http_provider::PROVIDER_NAME),
            piper_timeout,
        )),
        PiperMode::Cli => Arc::new(PiperCliProvider::new(
            config.piper_bin.clone(),
            config.piper_model_path.clone(),
            catalog.clone(),
            AudioCache::new(audio_root, piper_cli_provider::PROVIDER_NAME),
            piper_timeout,
        )),
    };
    registry.register("piper", piper);

    match openai_api_key {
        Some(api_key) => {
            let client = Client::with_config(OpenAIConfig::new().with_api_key(api_key));
            registry.register(
                openai_tts_provider::PROVIDER_NAME,
                Arc::new(OpenAiTtsProvider::new(
                    Arc::new(client),
                    config.openai_model.clone(),
                    catalog.clone(),
                    AudioCache::new(audio_root, openai_tts_provider::PROVIDER_NAME),
                    Duration::from_secs(config.openai_timeout_sec),
                )),
            );
        }
        None => tracing::info!("OPENAI_API_KEY not set, openai TTS provider disabled"),
    }

    let wants_polly = config.provider == polly_tts_provider::PROVIDER_NAME
        || config
            .provider_order
            .iter()
            .any(|p| p == polly_tts_provider::PROVIDER_NAME);
    if wants_polly {
        tracing::info!(region = %config.polly_region, "Initializing AWS Polly client");
        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.polly_region.clone()))
            .load()
            .await;
        let polly_client = aws_sdk_polly::Client::new(&aws_config);

        registry.register(
            polly_tts_provider::PROVIDER_NAME,
            Arc::new(PollyTtsProvider::new(
                Arc::new(polly_client),
                catalog,
                AudioCache::new(audio_root, polly_tts_provider::PROVIDER_NAME),
                Duration::from_secs(config.polly_timeout_sec),
            )),
        );
    }

    tracing::info!(providers = ?registry.names(), "TTS provider registry ready");
    registry
}
