pub mod audio_format;
pub mod cache_key;
pub mod circuit_breaker;
pub mod error;
pub mod language;
pub mod orchestrator;
pub mod voice;

pub use audio_format::AudioFormat;
pub use cache_key::CacheKey;
pub use circuit_breaker::{CircuitBreaker, CIRCUIT_BREAKER_THRESHOLD};
pub use error::{JobError, ProviderError, TranscodeError};
pub use language::LanguageCode;
pub use orchestrator::{
    provider_candidates, AttemptOutcome, NextStep, OrchestratorSettings, SynthesisJob,
    SynthesisOrchestrator,
};
pub use voice::{Gender, Voice, VoiceCatalog, VoiceHint};
