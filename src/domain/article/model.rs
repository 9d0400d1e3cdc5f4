use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::infrastructure::queue::JobState;

/// A processed upload: its title and one audio job per chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub paragraphs: Vec<ArticleParagraph>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleParagraph {
    pub text: String,
    /// Published audio filename, `<article_id>_<index>.<ext>`
    pub audio: String,
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: String,
    pub title: String,
}

impl From<&Article> for ArticleSummary {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id.clone(),
            title: article.title.clone(),
        }
    }
}

/// `article_<unix seconds>_<6 hex chars>`
pub fn new_article_id(now: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(6).collect();
    format!("article_{}_{}", now.timestamp(), suffix)
}

/// Audio filename for the chunk at `index` (1-based)
pub fn audio_filename(article_id: &str, index: usize, extension: &str) -> String {
    format!("{}_{}.{}", article_id, index, extension)
}

/// Article ids only use ASCII letters, digits, `_` and `-`
pub fn is_valid_article_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressState {
    /// Some chunks are still queued or running
    Pending,
    Complete,
    /// Everything finished, some chunks failed
    Partial,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphProgress {
    pub index: usize,
    pub audio: String,
    pub task_id: Option<String>,
    pub status: JobState,
    pub result: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleProgress {
    pub id: String,
    pub status: ProgressState,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub pending: usize,
    pub paragraphs: Vec<ParagraphProgress>,
}

impl ArticleProgress {
    pub fn new(id: String, paragraphs: Vec<ParagraphProgress>) -> Self {
        let count = |state: JobState| paragraphs.iter().filter(|p| p.status == state).count();
        let succeeded = count(JobState::Succeeded);
        let failed = count(JobState::Failed);
        let total = paragraphs.len();
        let pending = total - succeeded - failed;

        let status = if pending > 0 {
            ProgressState::Pending
        } else if failed == 0 {
            ProgressState::Complete
        } else if succeeded == 0 {
            ProgressState::Failed
        } else {
            ProgressState::Partial
        };

        Self {
            id,
            status,
            total,
            succeeded,
            failed,
            pending,
            paragraphs,
        }
    }
}
