//! Per-chunk synthesis job
//!
//! Providers are tried in order. Each one gets at most two attempts, a
//! circuit-broken provider is skipped, and the first success is transcoded to
//! the delivery format and published under `<stem>.<ext>` in the output
//! directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use uuid::Uuid;

use super::{AudioFormat, CircuitBreaker, JobError, LanguageCode, ProviderError, VoiceCatalog, VoiceHint};
use crate::infrastructure::transcode::Transcoder;
use crate::infrastructure::tts::ProviderRegistry;

/// Attempts per provider before moving on
pub const MAX_ATTEMPTS_PER_PROVIDER: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisJob {
    pub chunk_text: String,
    /// Destination name; only its stem is used
    pub target_filename: String,
    pub article_id: Option<String>,
    pub article_title: Option<String>,
    pub voice_hint: Option<String>,
    pub provider_override: Option<String>,
}

/// Result of one synthesis attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success(PathBuf),
    Retryable(ProviderError),
    Fatal(ProviderError),
}

impl From<Result<PathBuf, ProviderError>> for AttemptOutcome {
    fn from(result: Result<PathBuf, ProviderError>) -> Self {
        match result {
            Ok(path) => AttemptOutcome::Success(path),
            Err(err) if err.is_retryable() => AttemptOutcome::Retryable(err),
            Err(err) => AttemptOutcome::Fatal(err),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    Accept,
    RetrySameProvider,
    AdvanceProvider,
}

/// Transition table for one provider; `attempt` is 1-based
pub fn next_step(outcome: &AttemptOutcome, attempt: u32) -> NextStep {
    match outcome {
        AttemptOutcome::Success(_) => NextStep::Accept,
        AttemptOutcome::Retryable(_) if attempt < MAX_ATTEMPTS_PER_PROVIDER => NextStep::RetrySameProvider,
        AttemptOutcome::Retryable(_) | AttemptOutcome::Fatal(_) => NextStep::AdvanceProvider,
    }
}

/// Providers to try, in order.
///
/// An override is used alone. Otherwise the configured order is used with the
/// primary provider put in front when the order does not mention it.
pub fn provider_candidates(provider_override: Option<&str>, primary: &str, order: &[String]) -> Vec<String> {
    let clean = |name: &str| name.trim().to_lowercase();

    if let Some(name) = provider_override.map(clean).filter(|n| !n.is_empty()) {
        return vec![name];
    }

    let mut candidates: Vec<String> = Vec::new();
    for name in order.iter().map(|n| clean(n)) {
        if !name.is_empty() && !candidates.contains(&name) {
            candidates.push(name);
        }
    }

    let primary = clean(primary);
    if !primary.is_empty() && !candidates.contains(&primary) {
        candidates.insert(0, primary);
    }
    candidates
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub primary_provider: String,
    pub provider_order: Vec<String>,
    pub default_voice: Option<String>,
    pub language_voices: HashMap<LanguageCode, String>,
    pub voices: Arc<VoiceCatalog>,
    pub rate: Option<u32>,
    pub delivery_format: AudioFormat,
    pub keep_intermediate_master: bool,
    /// Directory the published artifacts are served from
    pub output_dir: PathBuf,
}

pub struct SynthesisOrchestrator {
    registry: Arc<ProviderRegistry>,
    breaker: Arc<CircuitBreaker>,
    transcoder: Arc<dyn Transcoder>,
    settings: OrchestratorSettings,
}

impl SynthesisOrchestrator {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        breaker: Arc<CircuitBreaker>,
        transcoder: Arc<dyn Transcoder>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            registry,
            breaker,
            transcoder,
            settings,
        }
    }

    /// Published path for a target filename in a given format
    pub fn destination(&self, target_filename: &str, format: AudioFormat) -> PathBuf {
        self.settings
            .output_dir
            .join(format!("{}.{}", file_stem(target_filename), format.extension()))
    }

    /// Voice preference: job voice, then the title language override, then the default
    pub fn voice_hint(&self, job: &SynthesisJob) -> VoiceHint {
        let prefixed = job
            .article_title
            .as_deref()
            .and_then(LanguageCode::from_title_prefix);
        let language = prefixed.unwrap_or_default();

        let preferred = match (job.voice_hint.clone(), prefixed) {
            (Some(voice), _) => Some(voice),
            (None, Some(lang)) => self
                .settings
                .language_voices
                .get(&lang)
                .cloned()
                .or_else(|| self.default_voice_for(lang)),
            (None, None) => self.settings.default_voice.clone(),
        };

        VoiceHint::new(preferred, language)
    }

    /// The default voice, reduced to its gender when it speaks another language
    fn default_voice_for(&self, language: LanguageCode) -> Option<String> {
        let default = self.settings.default_voice.clone()?;
        match self.settings.voices.get(&default) {
            Some(voice) if voice.language != language => voice.gender.map(|g| g.as_str().to_string()),
            _ => Some(default),
        }
    }

    /// Run the job to completion, returning the published artifact path
    pub async fn run(&self, job: &SynthesisJob) -> Result<PathBuf, JobError> {
        if let Some(existing) = self.existing_artifact(&job.target_filename).await {
            tracing::info!(
                article_id = ?job.article_id,
                path = %existing.display(),
                "Artifact already exists, skipping synthesis"
            );
            return Ok(existing);
        }

        let voice = self.voice_hint(job);
        let candidates = provider_candidates(
            job.provider_override.as_deref(),
            &self.settings.primary_provider,
            &self.settings.provider_order,
        );
        let mut last_error: Option<ProviderError> = None;

        for provider in &candidates {
            if self.breaker.is_open(provider) {
                tracing::warn!(
                    provider = %provider,
                    failures = self.breaker.failure_count(provider),
                    "Circuit open, skipping provider"
                );
                continue;
            }

            let Some(engine) = self.registry.get(provider) else {
                tracing::warn!(provider = %provider, "Provider not registered, skipping");
                continue;
            };

            let mut attempt = 1;
            loop {
                let outcome: AttemptOutcome = engine
                    .synthesize(&job.chunk_text, &voice, self.settings.rate, AudioFormat::INTERMEDIATE)
                    .await
                    .into();

                let step = next_step(&outcome, attempt);
                match outcome {
                    AttemptOutcome::Success(master) => {
                        self.breaker.record_success(provider);
                        let published = self.publish(&master, &job.target_filename).await?;
                        tracing::info!(
                            provider = %provider,
                            article_id = ?job.article_id,
                            attempt,
                            path = %published.display(),
                            "Chunk synthesized"
                        );
                        return Ok(published);
                    }
                    AttemptOutcome::Retryable(err) if step == NextStep::RetrySameProvider => {
                        tracing::warn!(provider = %provider, attempt, error = %err, "Synthesis failed, retrying");
                        attempt += 1;
                    }
                    AttemptOutcome::Retryable(err) | AttemptOutcome::Fatal(err) => {
                        let failures = self.breaker.record_failure(provider);
                        tracing::error!(
                            provider = %provider,
                            attempt,
                            failures,
                            error = %err,
                            "Provider failed, trying next"
                        );
                        last_error = Some(err);
                        break;
                    }
                }
            }
        }

        Err(match last_error {
            Some(err) => JobError::AllProvidersFailed(err),
            None => JobError::NoProviderAvailable,
        })
    }

    async fn existing_artifact(&self, target_filename: &str) -> Option<PathBuf> {
        let delivered = self.destination(target_filename, self.settings.delivery_format);
        let fallback = self.destination(target_filename, AudioFormat::INTERMEDIATE);

        for path in [delivered, fallback] {
            let present = fs::metadata(&path)
                .await
                .map(|m| m.is_file() && m.len() > 0)
                .unwrap_or(false);
            if present {
                return Some(path);
            }
        }
        None
    }

    /// Transcode if needed and move the artifact to its stable path
    async fn publish(&self, master: &Path, target_filename: &str) -> Result<PathBuf, JobError> {
        let format = self.settings.delivery_format;
        fs::create_dir_all(&self.settings.output_dir)
            .await
            .map_err(|e| JobError::Artifact(e.to_string()))?;

        if format == AudioFormat::INTERMEDIATE {
            let destination = self.destination(target_filename, format);
            copy_atomic(master, &destination).await?;
            return Ok(destination);
        }

        let destination = self.destination(target_filename, format);
        let staging = self.staging_path(format);
        match self.transcoder.transcode(master, &staging, format).await {
            Ok(()) => {
                fs::rename(&staging, &destination)
                    .await
                    .map_err(|e| JobError::Artifact(e.to_string()))?;
                if self.settings.keep_intermediate_master {
                    self.keep_master(master, target_filename).await;
                }
                Ok(destination)
            }
            Err(err) => {
                let _ = fs::remove_file(&staging).await;
                let fallback = self.destination(target_filename, AudioFormat::INTERMEDIATE);
                tracing::warn!(
                    error = %err,
                    format = %format,
                    path = %fallback.display(),
                    "Transcode failed, serving the intermediate audio"
                );
                copy_atomic(master, &fallback).await?;
                Ok(fallback)
            }
        }
    }

    async fn keep_master(&self, master: &Path, target_filename: &str) {
        let masters = self.settings.output_dir.join("masters");
        let destination = masters.join(format!(
            "{}.{}",
            file_stem(target_filename),
            AudioFormat::INTERMEDIATE.extension()
        ));

        let result = async {
            fs::create_dir_all(&masters)
                .await
                .map_err(|e| JobError::Artifact(e.to_string()))?;
            copy_atomic(master, &destination).await
        }
        .await;

        if let Err(err) = result {
            tracing::warn!(error = %err, "Could not keep intermediate master");
        }
    }

    fn staging_path(&self, format: AudioFormat) -> PathBuf {
        self.settings
            .output_dir
            .join(format!(".{}.partial.{}", Uuid::new_v4().simple(), format.extension()))
    }
}

/// Copy through a temporary sibling file so readers never see a partial file
async fn copy_atomic(source: &Path, destination: &Path) -> Result<(), JobError> {
    let parent = destination.parent().unwrap_or_else(|| Path::new("."));
    let temp = parent.join(format!(".{}.tmp", Uuid::new_v4().simple()));

    if let Err(err) = fs::copy(source, &temp).await {
        let _ = fs::remove_file(&temp).await;
        return Err(JobError::Artifact(err.to_string()));
    }
    fs::rename(&temp, destination)
        .await
        .map_err(|e| JobError::Artifact(e.to_string()))
}

/// File stem of a target name, without any directory part
fn file_stem(target_filename: &str) -> String {
    Path::new(target_filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "audio".to_string())
}
