use sha2::{Digest, Sha256};

use super::audio_format::AudioFormat;

/// Deterministic fingerprint of everything that shapes a synthesized clip.
///
/// Hex-encoded SHA-256 (64 characters). Identical inputs always produce the
/// same key; it names the cached file and de-duplicates concurrent work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(
        text: &str,
        provider: &str,
        voice: Option<&str>,
        rate: Option<u32>,
        format: AudioFormat,
        engine_version: &str,
    ) -> Self {
        let normalized_text = text.replace("\r\n", "\n");
        let rate = rate.unwrap_or(0).to_string();
        let fields = [
            normalized_text.trim(),
            provider,
            voice.unwrap_or(""),
            rate.as_str(),
            format.extension(),
            engine_version,
        ];

        let mut hasher = Sha256::new();
        for field in fields {
            // length prefix keeps field boundaries unambiguous
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }

        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
