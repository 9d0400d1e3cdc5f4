pub mod error;
pub mod model;
pub mod service;

pub use error::ArticleServiceError;
pub use model::{
    audio_filename, is_valid_article_id, new_article_id, Article, ArticleParagraph,
    ArticleProgress, ArticleSummary, ParagraphProgress, ProgressState,
};
pub use service::{ArticleService, ArticleServiceApi, IntakeSettings};

use serde::{Deserialize, Serialize};

/// A file received by the upload endpoint
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Query options for POST /upload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadOptions {
    pub clean: Option<bool>,
    pub chunk_limit: Option<usize>,
}

/// Request for POST /generate_audio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateAudioRequest {
    pub text: String,
    pub audio_filename: String,
    #[serde(default)]
    pub article_title: Option<String>,
    /// Voice id or gender word such as "Male"
    #[serde(default, alias = "gender")]
    pub voice: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

/// Response for endpoints that enqueue a single job
#[derive(Debug, Serialize, Deserialize)]
pub struct QueuedTaskResponse {
    pub status: String,
    pub task_id: String,
}

impl QueuedTaskResponse {
    pub fn queued(task_id: String) -> Self {
        Self {
            status: "queued".to_string(),
            task_id,
        }
    }
}
