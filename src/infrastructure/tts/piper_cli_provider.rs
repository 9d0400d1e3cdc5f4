use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::cache::{is_non_empty_file, AudioCache};
use super::SynthesisEngine;
use crate::domain::tts::{AudioFormat, CacheKey, ProviderError, VoiceCatalog, VoiceHint};

pub const PROVIDER_NAME: &str = "piper";
const ENGINE_VERSION: &str = "piper-v1";

/// Piper invoked as a local subprocess, text on stdin
pub struct PiperCliProvider {
    bin: String,
    model_override: Option<PathBuf>,
    catalog: Arc<VoiceCatalog>,
    cache: AudioCache,
    timeout: Duration,
}

impl PiperCliProvider {
    pub fn new(
        bin: String,
        model_override: Option<PathBuf>,
        catalog: Arc<VoiceCatalog>,
        cache: AudioCache,
        timeout: Duration,
    ) -> Self {
        Self {
            bin,
            model_override,
            catalog,
            cache,
            timeout,
        }
    }

    async fn run_piper(
        &self,
        staging: PathBuf,
        text: &str,
        model: &Path,
        speaker_id: Option<u32>,
        rate: Option<u32>,
    ) -> Result<(), ProviderError> {
        let args = piper_args(model, &staging, speaker_id, rate, paired_config(model).await);
        tracing::debug!(bin = %self.bin, args = ?args, "Spawning piper");

        let mut child = Command::new(&self.bin)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ProviderError::Process {
                provider: PROVIDER_NAME.to_string(),
                message: format!("failed to start {}: {}", self.bin, e),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| ProviderError::io(PROVIDER_NAME, e))?;
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ProviderError::Timeout {
                provider: PROVIDER_NAME.to_string(),
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|e| ProviderError::io(PROVIDER_NAME, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!(status = ?output.status.code(), stderr = %stderr, "piper exited with an error");
            return Err(ProviderError::Process {
                provider: PROVIDER_NAME.to_string(),
                message: stderr,
            });
        }

        if !is_non_empty_file(&staging).await {
            return Err(ProviderError::EmptyOutput {
                provider: PROVIDER_NAME.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SynthesisEngine for PiperCliProvider {
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
                reason: format!("piper only produces wav, not {}", format),
            });
        }

        let resolved = self.catalog.resolve_hint(voice);
        let (model, speaker_id, voice_id) = match (&self.model_override, resolved) {
            (Some(model), _) => (model.clone(), None, model.display().to_string()),
            (None, Some(v)) => (PathBuf::from(&v.model_ref), v.speaker_id, v.id.clone()),
            (None, None) => {
                return Err(ProviderError::NotConfigured {
                    provider: PROVIDER_NAME.to_string(),
                    reason: "PIPER_MODEL_PATH is required when no voice is known".to_string(),
                })
            }
        };

        let start_time = std::time::Instant::now();
        let key = CacheKey::new(text, PROVIDER_NAME, Some(&voice_id), rate, format, ENGINE_VERSION);
        let path = self
            .cache
            .get_or_produce(&key, format, |staging| {
                self.run_piper(staging, text, &model, speaker_id, rate)
            })
            .await?;

        tracing::info!(
            provider = PROVIDER_NAME,
            voice = %voice_id,
            latency_ms = start_time.elapsed().as_millis(),
            characters_count = text.len(),
            "TTS synthesis completed"
        );

        Ok(path)
    }
}

/// `<model>.json` next to the model, if present
async fn paired_config(model: &Path) -> Option<PathBuf> {
    let mut config = model.as_os_str().to_owned();
    config.push(".json");
    let config = PathBuf::from(config);
    tokio::fs::try_exists(&config)
        .await
        .unwrap_or(false)
        .then_some(config)
}

fn piper_args(
    model: &Path,
    output: &Path,
    speaker_id: Option<u32>,
    rate: Option<u32>,
    config: Option<PathBuf>,
) -> Vec<String> {
    let mut args = vec![
        "--model".to_string(),
        model.display().to_string(),
        "--output_raw".to_string(),
        "false".to_string(),
        "--output_file".to_string(),
        output.display().to_string(),
    ];
    if let Some(config) = config {
        args.push("--json_config".to_string());
        args.push(config.display().to_string());
    }
    if let Some(speaker) = speaker_id {
        args.push("--speaker".to_string());
        args.push(speaker.to_string());
    }
    // piper's length scale is inverse to speed: 200% rate halves it
    if let Some(rate) = rate.filter(|r| *r > 0) {
        args.push("--length_scale".to_string());
        args.push(format!("{:.2}", 100.0 / rate as f32));
    }
    args
}
