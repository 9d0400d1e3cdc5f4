use super::audio_format::AudioFormat;

/// A TTS engine failed to produce audio
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} is not configured: {reason}")]
    NotConfigured { provider: String, reason: String },
    #[error("{provider} request failed: {message}")]
    Request { provider: String, message: String },
    #[error("{provider} returned HTTP {status}: {message}")]
    Status {
        provider: String,
        status: u16,
        message: String,
    },
    #[error("{provider} timed out after {seconds}s")]
    Timeout { provider: String, seconds: u64 },
    #[error("{provider} process failed: {message}")]
    Process { provider: String, message: String },
    #[error("{provider} produced no audio")]
    EmptyOutput { provider: String },
    #[error("no supported {provider} model available, tried: {tried:?}")]
    NoModelAvailable { provider: String, tried: Vec<String> },
    #[error("{provider} cache error: {message}")]
    Io { provider: String, message: String },
}

impl ProviderError {
    pub fn provider(&self) -> &str {
        match self {
            Self::NotConfigured { provider, .. }
            | Self::Request { provider, .. }
            | Self::Status { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::Process { provider, .. }
            | Self::EmptyOutput { provider }
            | Self::NoModelAvailable { provider, .. }
            | Self::Io { provider, .. } => provider,
        }
    }

    /// Whether trying the same provider again could help
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::NotConfigured { .. } | Self::NoModelAvailable { .. }
        )
    }

    pub fn io(provider: &str, err: impl std::fmt::Display) -> Self {
        Self::Io {
            provider: provider.to_string(),
            message: err.to_string(),
        }
    }
}

/// Converting the intermediate master to the delivery format failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscodeError {
    #[error("no transcoding needed or possible into {0}")]
    Unsupported(AudioFormat),
    #[error("could not start encoder: {0}")]
    Spawn(String),
    #[error("encoder exited with {status:?}: {stderr}")]
    Failed { status: Option<i32>, stderr: String },
    #[error("encoder timed out after {0}s")]
    Timeout(u64),
    #[error("encoder produced no output")]
    EmptyOutput,
}

/// Terminal failure of one chunk's synthesis job
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    #[error("no provider available")]
    NoProviderAvailable,
    #[error("all providers failed, last error: {0}")]
    AllProvidersFailed(#[source] ProviderError),
    #[error("could not write artifact: {0}")]
    Artifact(String),
    #[error("job exceeded its time limit of {0}s")]
    TimedOut(u64),
}
