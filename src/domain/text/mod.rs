pub mod chunker;
pub mod normalizer;
pub mod segmenter;
pub mod sentence;
pub mod title;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use chunker::{chunk_paragraphs, Chunk, DEFAULT_CHUNK_CHAR_LIMIT};
pub use normalizer::normalize;
pub use segmenter::{flatten, segment_paragraphs};
pub use sentence::split_sentences;
pub use title::{accept_external_title, resolve_title, UNTITLED_ARTICLE};

/// Optional language-model collaborator used during document intake.
///
/// Both operations are best effort: callers fall back to the deterministic
/// pipeline when they fail.
#[async_trait]
pub trait TextAssistant: Send + Sync {
    /// Reflow and de-clutter flattened text, keeping the wording intact
    async fn clean(&self, flattened: &str) -> anyhow::Result<String>;

    /// Propose a document title; implementations may only read the head
    async fn extract_title(&self, raw: &str) -> anyhow::Result<String>;
}

/// Text ready for scheduling: a title and ordered chunks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedDocument {
    pub title: String,
    pub chunks: Vec<Chunk>,
}

/// Deterministic intake: normalize, segment, chunk and pick a title
pub fn prepare_document(raw: &str, filename: Option<&str>, chunk_char_limit: usize) -> PreparedDocument {
    let normalized = normalize(raw);
    let paragraphs = segment_paragraphs(&normalized);

    PreparedDocument {
        title: resolve_title(&normalized, filename),
        chunks: chunk_paragraphs(&paragraphs, chunk_char_limit),
    }
}

/// Normalized, reflowed text in the shape handed to a [`TextAssistant`]
pub fn flatten_for_cleaning(raw: &str) -> String {
    flatten(&segment_paragraphs(&normalize(raw)))
}

/// Like [`prepare_document`], but chunk `cleaned` text while still taking the
/// title from the raw upload
pub fn prepare_cleaned_document(
    raw: &str,
    cleaned: &str,
    filename: Option<&str>,
    chunk_char_limit: usize,
) -> PreparedDocument {
    let paragraphs = segment_paragraphs(&normalize(cleaned));

    PreparedDocument {
        title: resolve_title(&normalize(raw), filename),
        chunks: chunk_paragraphs(&paragraphs, chunk_char_limit),
    }
}
