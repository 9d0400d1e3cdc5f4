use async_trait::async_trait;
use aws_sdk_polly::{
    types::{Engine, OutputFormat, VoiceId},
    Client as PollyClient,
};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::cache::AudioCache;
use super::SynthesisEngine;
use crate::domain::tts::{
    AudioFormat, CacheKey, Gender, LanguageCode, ProviderError, VoiceCatalog, VoiceHint,
};

pub const PROVIDER_NAME: &str = "polly";
const ENGINE_VERSION: &str = "polly-neural-v1";

/// Polly returns signed 16-bit little-endian mono PCM at this rate
const PCM_SAMPLE_RATE: u32 = 16_000;

/// AWS Polly engine (neural voices)
pub struct PollyTtsProvider {
    polly_client: Arc<PollyClient>,
    catalog: Arc<VoiceCatalog>,
    cache: AudioCache,
    timeout: Duration,
}

impl PollyTtsProvider {
    pub fn new(
        polly_client: Arc<PollyClient>,
        catalog: Arc<VoiceCatalog>,
        cache: AudioCache,
        timeout: Duration,
    ) -> Self {
        Self {
            polly_client,
            catalog,
            cache,
            timeout,
        }
    }

    /// Call AWS Polly to synthesize a single chunk
    async fn call_polly(
        &self,
        text: &str,
        voice_name: &str,
        output_format: OutputFormat,
    ) -> Result<Vec<u8>, ProviderError> {
        let voice_id = VoiceId::from(voice_name);
        let engine = Engine::Neural;

        tracing::info!(
            voice = voice_name,
            engine = ?engine,
            output_format = ?output_format,
            text_length = text.len(),
            "Calling AWS Polly synthesize_speech"
        );

        let mut request = self
            .polly_client
            .synthesize_speech()
            .text(text)
            .voice_id(voice_id)
            .output_format(output_format.clone())
            .engine(engine);
        if output_format == OutputFormat::Pcm {
            request = request.sample_rate(PCM_SAMPLE_RATE.to_string());
        }

        let result = request.send().await.map_err(|e| {
            tracing::error!(
                error = ?e,
                error_display = %e,
                voice = voice_name,
                text_length = text.len(),
                "AWS Polly synthesize_speech failed"
            );
            ProviderError::Request {
                provider: PROVIDER_NAME.to_string(),
                message: format!("AWS Polly error: {}", e),
            }
        })?;

        let audio_stream = result.audio_stream.collect().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to collect audio stream from Polly response");
            ProviderError::Request {
                provider: PROVIDER_NAME.to_string(),
                message: format!("Failed to read audio stream: {}", e),
            }
        })?;

        Ok(audio_stream.into_bytes().to_vec())
    }

    async fn synthesize_to(
        &self,
        staging: PathBuf,
        text: &str,
        voice_name: &'static str,
        format: AudioFormat,
    ) -> Result<(), ProviderError> {
        let output_format = match format {
            AudioFormat::Wav => OutputFormat::Pcm,
            AudioFormat::Mp3 => OutputFormat::Mp3,
            AudioFormat::Ogg => OutputFormat::OggVorbis,
        };

        let audio = tokio::time::timeout(self.timeout, self.call_polly(text, voice_name, output_format))
            .await
            .map_err(|_| ProviderError::Timeout {
                provider: PROVIDER_NAME.to_string(),
                seconds: self.timeout.as_secs(),
            })??;

        if audio.is_empty() {
            return Err(ProviderError::EmptyOutput {
                provider: PROVIDER_NAME.to_string(),
            });
        }

        let bytes = match format {
            AudioFormat::Wav => pcm_to_wav(&audio, PCM_SAMPLE_RATE)?,
            _ => audio,
        };

        tokio::fs::write(&staging, bytes)
            .await
            .map_err(|e| ProviderError::io(PROVIDER_NAME, e))
    }
}

#[async_trait]
impl SynthesisEngine for PollyTtsProvider {
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
        let voice_name = voice_for_language(voice.language, voice.gender(&self.catalog));
        let key = CacheKey::new(text, PROVIDER_NAME, Some(voice_name), rate, format, ENGINE_VERSION);

        let path = self
            .cache
            .get_or_produce(&key, format, |staging| {
                self.synthesize_to(staging, text, voice_name, format)
            })
            .await?;

        tracing::info!(
            provider = PROVIDER_NAME,
            voice = voice_name,
            latency_ms = start_time.elapsed().as_millis(),
            characters_count = text.len(),
            "TTS synthesis completed"
        );

        Ok(path)
    }
}

/// Neural voice for a language, male or female
pub fn voice_for_language(language: LanguageCode, gender: Option<Gender>) -> &'static str {
    let male = gender == Some(Gender::Male);
    match (language, male) {
        (LanguageCode::English, false) => "Joanna",
        (LanguageCode::English, true) => "Matthew",
        (LanguageCode::Spanish, false) => "Lupe",
        (LanguageCode::Spanish, true) => "Sergio",
        (LanguageCode::French, false) => "Lea",
        (LanguageCode::French, true) => "Remi",
        (LanguageCode::German, false) => "Vicki",
        (LanguageCode::German, true) => "Daniel",
        (LanguageCode::Italian, false) => "Bianca",
        (LanguageCode::Italian, true) => "Adriano",
        (LanguageCode::Portuguese, false) => "Ines",
        (LanguageCode::Portuguese, true) => "Thiago",
    }
}

/// Wrap raw 16-bit mono PCM in a WAV container
pub fn pcm_to_wav(pcm: &[u8], sample_rate: u32) -> Result<Vec<u8>, ProviderError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut buffer = Cursor::new(Vec::new());
    let mut writer =
        hound::WavWriter::new(&mut buffer, spec).map_err(|e| ProviderError::io(PROVIDER_NAME, e))?;
    for sample in pcm.chunks_exact(2) {
        writer
            .write_sample(i16::from_le_bytes([sample[0], sample[1]]))
            .map_err(|e| ProviderError::io(PROVIDER_NAME, e))?;
    }
    writer
        .finalize()
        .map_err(|e| ProviderError::io(PROVIDER_NAME, e))?;

    Ok(buffer.into_inner())
}
