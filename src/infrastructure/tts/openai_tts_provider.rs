use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{CreateSpeechRequest, SpeechModel, SpeechResponseFormat, Voice},
    Client,
};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::cache::AudioCache;
use super::SynthesisEngine;
use crate::domain::tts::{AudioFormat, CacheKey, Gender, ProviderError, VoiceCatalog, VoiceHint};

pub const PROVIDER_NAME: &str = "openai";
const ENGINE_VERSION: &str = "openai-v1";

/// Tried in order after the configured model
const FALLBACK_MODELS: [&str; 2] = ["gpt-4o-mini-tts", "tts-1"];

/// OpenAI speech API engine
pub struct OpenAiTtsProvider {
    client: Arc<Client<OpenAIConfig>>,
    model: Option<String>,
    catalog: Arc<VoiceCatalog>,
    cache: AudioCache,
    timeout: Duration,
}

impl OpenAiTtsProvider {
    pub fn new(
        client: Arc<Client<OpenAIConfig>>,
        model: Option<String>,
        catalog: Arc<VoiceCatalog>,
        cache: AudioCache,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            model,
            catalog,
            cache,
            timeout,
        }
    }

    /// Call the speech endpoint once for a single model
    async fn call_openai(
        &self,
        text: &str,
        model: &str,
        voice: Voice,
        rate: Option<u32>,
        format: AudioFormat,
    ) -> Result<Vec<u8>, OpenAIError> {
        tracing::info!(
            model = %model,
            voice = ?voice,
            text_length = text.len(),
            text_preview = %text.chars().take(200).collect::<String>(),
            "Calling OpenAI TTS API"
        );

        let speech_model = match model {
            "tts-1" => SpeechModel::Tts1,
            "tts-1-hd" => SpeechModel::Tts1Hd,
            other => SpeechModel::Other(other.to_string()),
        };

        let request = CreateSpeechRequest {
            model: speech_model,
            input: text.to_string(),
            voice,
            response_format: Some(response_format(format)),
            speed: rate.map(speed_from_rate),
        };

        let response = self.client.audio().speech(request).await?;
        let audio_bytes = response.bytes.to_vec();

        tracing::debug!(
            audio_size = audio_bytes.len(),
            "OpenAI TTS audio received successfully"
        );

        Ok(audio_bytes)
    }

    /// Walk the model candidates until one accepts the request
    async fn synthesize_to(
        &self,
        staging: PathBuf,
        text: &str,
        gender: Option<Gender>,
        rate: Option<u32>,
        format: AudioFormat,
    ) -> Result<(), ProviderError> {
        let mut tried = Vec::new();

        for model in model_candidates(self.model.as_deref()) {
            let voice = voice_for_model(&model, gender);
            tried.push(model.clone());

            let result = tokio::time::timeout(
                self.timeout,
                self.call_openai(text, &model, voice, rate, format),
            )
            .await
            .map_err(|_| ProviderError::Timeout {
                provider: PROVIDER_NAME.to_string(),
                seconds: self.timeout.as_secs(),
            })?;

            match result {
                Ok(audio) if audio.is_empty() => {
                    return Err(ProviderError::EmptyOutput {
                        provider: PROVIDER_NAME.to_string(),
                    })
                }
                Ok(audio) => {
                    return tokio::fs::write(&staging, audio)
                        .await
                        .map_err(|e| ProviderError::io(PROVIDER_NAME, e));
                }
                Err(err) if is_invalid_model(&err) => {
                    tracing::warn!(model = %model, error = %err, "OpenAI rejected TTS model, trying next");
                }
                Err(err) => {
                    tracing::error!(error = %err, model = %model, "OpenAI TTS API call failed");
                    return Err(ProviderError::Request {
                        provider: PROVIDER_NAME.to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }

        Err(ProviderError::NoModelAvailable {
            provider: PROVIDER_NAME.to_string(),
            tried,
        })
    }
}

#[async_trait]
impl SynthesisEngine for OpenAiTtsProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceHint,
        rate: Option<u32>,
        format: AudioFormat,
    ) -> Result<PathBuf, ProviderError> {
        let start_time = std::time::Instant::now();
        let gender = voice.gender(&self.catalog);
        let key = CacheKey::new(
            text,
            PROVIDER_NAME,
            voice.preferred.as_deref(),
            rate,
            format,
            ENGINE_VERSION,
        );

        let path = self
            .cache
            .get_or_produce(&key, format, |staging| {
                self.synthesize_to(staging, text, gender, rate, format)
            })
            .await?;

        tracing::info!(
            provider = PROVIDER_NAME,
            latency_ms = start_time.elapsed().as_millis(),
            characters_count = text.len(),
            path = %path.display(),
            "TTS synthesis completed"
        );

        Ok(path)
    }
}

/// Configured model first, then the fixed fallbacks, without duplicates
pub fn model_candidates(configured: Option<&str>) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    let configured = configured.map(str::trim).filter(|m| !m.is_empty());

    for model in configured.into_iter().chain(FALLBACK_MODELS) {
        if !candidates.iter().any(|c| c == model) {
            candidates.push(model.to_string());
        }
    }
    candidates
}

/// Voice for a model family and gender hint
pub fn voice_for_model(model: &str, gender: Option<Gender>) -> Voice {
    let male = gender == Some(Gender::Male);
    if model.starts_with("gpt-4o-mini-tts") {
        if male {
            Voice::Alloy
        } else {
            Voice::Nova
        }
    } else if male {
        Voice::Onyx
    } else {
        Voice::Shimmer
    }
}

fn is_invalid_model(err: &OpenAIError) -> bool {
    err.to_string().to_lowercase().contains("invalid model")
}

fn response_format(format: AudioFormat) -> SpeechResponseFormat {
    match format {
        AudioFormat::Wav => SpeechResponseFormat::Wav,
        AudioFormat::Mp3 => SpeechResponseFormat::Mp3,
        AudioFormat::Ogg => SpeechResponseFormat::Opus,
    }
}

/// `rate` is a percentage of normal speed; OpenAI accepts 0.25 to 4.0
fn speed_from_rate(rate: u32) -> f32 {
    (rate as f32 / 100.0).clamp(0.25, 4.0)
}
