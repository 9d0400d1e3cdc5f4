use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::cache::AudioCache;
use super::SynthesisEngine;
use crate::domain::tts::{AudioFormat, CacheKey, ProviderError, Voice, VoiceCatalog, VoiceHint};

pub const PROVIDER_NAME: &str = "piper";
const ENGINE_VERSION: &str = "piper-v1";

#[derive(Debug, Serialize)]
struct SidecarRequest<'a> {
    text: &'a str,
    model_path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    speaker_id: Option<u32>,
}

/// Piper running as an HTTP sidecar that returns WAV bytes
pub struct PiperHttpProvider {
    http_client: reqwest::Client,
    base_url: String,
    catalog: Arc<VoiceCatalog>,
    cache: AudioCache,
    timeout: Duration,
}

impl PiperHttpProvider {
    pub fn new(
        base_url: String,
        catalog: Arc<VoiceCatalog>,
        cache: AudioCache,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            catalog,
            cache,
            timeout,
        }
    }

    async fn call_sidecar(&self, staging: PathBuf, text: &str, voice: &Voice) -> Result<(), ProviderError> {
        let url = format!("{}/synthesize", self.base_url);
        let payload = SidecarRequest {
            text,
            model_path: &voice.model_ref,
            speaker_id: voice.speaker_id,
        };

        tracing::debug!(
            url = %url,
            voice = %voice.id,
            text_length = text.len(),
            "Calling piper sidecar"
        );

        let response = self
            .http_client
            .post(&url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %message, "Piper sidecar returned an error");
            return Err(ProviderError::Status {
                provider: PROVIDER_NAME.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let audio = response.bytes().await.map_err(|e| self.request_error(e))?;
        tokio::fs::write(&staging, &audio)
            .await
            .map_err(|e| ProviderError::io(PROVIDER_NAME, e))
    }

    fn request_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout {
                provider: PROVIDER_NAME.to_string(),
                seconds: self.timeout.as_secs(),
            }
        } else {
            ProviderError::Request {
                provider: PROVIDER_NAME.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl SynthesisEngine for PiperHttpProvider {
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
        if format != AudioFormat::Wav {
            return Err(ProviderError::NotConfigured {
                provider: PROVIDER_NAME.to_string(),
                reason: format!("the sidecar only produces wav, not {}", format),
            });
        }

        let resolved = self
            .catalog
            .resolve_hint(voice)
            .ok_or_else(|| ProviderError::NotConfigured {
                provider: PROVIDER_NAME.to_string(),
                reason: "voice catalog is empty".to_string(),
            })?;

        let start_time = std::time::Instant::now();
        let key = CacheKey::new(text, PROVIDER_NAME, Some(&resolved.id), rate, format, ENGINE_VERSION);
        let path = self
            .cache
            .get_or_produce(&key, format, |staging| self.call_sidecar(staging, text, resolved))
            .await?;

        tracing::info!(
            provider = PROVIDER_NAME,
            voice = %resolved.id,
            latency_ms = start_time.elapsed().as_millis(),
            characters_count = text.len(),
            "TTS synthesis completed"
        );

        Ok(path)
    }
}
