use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::ArticleServiceError;
use super::model::{
    audio_filename, is_valid_article_id, new_article_id, Article, ArticleParagraph, ArticleProgress, ArticleSummary,
    ParagraphProgress,
};
use super::{GenerateAudioRequest, UploadOptions, UploadedDocument};
use crate::domain::text::{
    accept_external_title, flatten_for_cleaning, normalize, prepare_cleaned_document,
    prepare_document, PreparedDocument, TextAssistant,
};
use crate::domain::tts::{AudioFormat, SynthesisJob};
use crate::infrastructure::pdf::PdfTextExtractor;
use crate::infrastructure::queue::{JobQueue, JobState, JobStatus};
use crate::infrastructure::repositories::ArticleRepository;

#[derive(Debug, Clone)]
pub struct IntakeSettings {
    pub max_upload_bytes: usize,
    pub chunk_char_limit: usize,
    pub delivery_format: AudioFormat,
    pub clean_by_default: bool,
    pub extract_title: bool,
    /// Where published audio lives
    pub audio_dir: PathBuf,
}

pub struct ArticleService {
    article_repo: Arc<dyn ArticleRepository>,
    job_queue: Arc<JobQueue>,
    pdf_extractor: Arc<dyn PdfTextExtractor>,
    text_assistant: Option<Arc<dyn TextAssistant>>,
    settings: IntakeSettings,
}

impl ArticleService {
    pub fn new(
        article_repo: Arc<dyn ArticleRepository>,
        job_queue: Arc<JobQueue>,
        pdf_extractor: Arc<dyn PdfTextExtractor>,
        text_assistant: Option<Arc<dyn TextAssistant>>,
        settings: IntakeSettings,
    ) -> Self {
        Self {
            article_repo,
            job_queue,
            pdf_extractor,
            text_assistant,
            settings,
        }
    }
}

#[async_trait]
pub trait ArticleServiceApi: Send + Sync {
    /// Extract, chunk and schedule an uploaded document
    async fn create_from_upload(
        &self,
        document: UploadedDocument,
        options: UploadOptions,
    ) -> Result<Article, ArticleServiceError>;

    async fn list_articles(&self) -> Result<Vec<ArticleSummary>, ArticleServiceError>;

    async fn get_article(&self, id: &str) -> Result<Article, ArticleServiceError>;

    /// Remove the article and its published audio
    async fn delete_article(&self, id: &str) -> Result<(), ArticleServiceError>;

    async fn article_progress(&self, id: &str) -> Result<ArticleProgress, ArticleServiceError>;

    /// Queue one synthesis job outside of an upload, returning its task id
    async fn enqueue_single(&self, request: GenerateAudioRequest) -> Result<String, ArticleServiceError>;

    async fn task_status(&self, task_id: &str) -> Result<JobStatus, ArticleServiceError>;
}

#[async_trait]
impl ArticleServiceApi for ArticleService {
    async fn create_from_upload(
        &self,
        document: UploadedDocument,
        options: UploadOptions,
    ) -> Result<Article, ArticleServiceError> {
        let start_time = std::time::Instant::now();
        let chunk_limit = self.chunk_limit(options.chunk_limit)?;
        let raw_text = self.extract_text(&document).await?;

        let clean_requested = options.clean.unwrap_or(self.settings.clean_by_default);
        let mut prepared = self
            .prepare(&raw_text, &document.filename, chunk_limit, clean_requested)
            .await;

        if prepared.chunks.is_empty() {
            return Err(ArticleServiceError::Extraction(
                "no text could be recovered from the document".to_string(),
            ));
        }

        prepared.title = self.resolve_title(&raw_text, &document.filename, prepared.title).await;

        let article_id = new_article_id(Utc::now());
        let extension = self.settings.delivery_format.extension();
        let audio: Vec<String> = prepared
            .chunks
            .iter()
            .map(|chunk| audio_filename(&article_id, chunk.index, extension))
            .collect();
        let jobs = prepared
            .chunks
            .iter()
            .zip(&audio)
            .map(|(chunk, audio)| SynthesisJob {
                chunk_text: chunk.text.clone(),
                target_filename: audio.clone(),
                article_id: Some(article_id.clone()),
                article_title: Some(prepared.title.clone()),
                voice_hint: None,
                provider_override: None,
            })
            .collect();

        // all chunks are queued or none, so a rejected upload leaves no audio behind
        let task_ids = self.job_queue.enqueue_all(jobs).await?;

        let paragraphs = prepared
            .chunks
            .into_iter()
            .zip(audio)
            .zip(task_ids)
            .map(|((chunk, audio), task_id)| ArticleParagraph {
                text: chunk.text,
                audio,
                task_id: Some(task_id),
            })
            .collect();

        let article = Article {
            id: article_id,
            title: prepared.title,
            paragraphs,
            created_at: Utc::now(),
        };

        self.article_repo
            .save(&article)
            .await
            .map_err(|e| ArticleServiceError::Dependency(e.to_string()))?;

        tracing::info!(
            article_id = %article.id,
            title = %article.title,
            chunks = article.paragraphs.len(),
            characters_count = raw_text.len(),
            latency_ms = start_time.elapsed().as_millis(),
            "Article processed and queued"
        );

        Ok(article)
    }

    async fn list_articles(&self) -> Result<Vec<ArticleSummary>, ArticleServiceError> {
        self.article_repo
            .list()
            .await
            .map_err(|e| ArticleServiceError::Dependency(e.to_string()))
    }

    async fn get_article(&self, id: &str) -> Result<Article, ArticleServiceError> {
        if !is_valid_article_id(id) {
            return Err(ArticleServiceError::NotFound);
        }
        self.article_repo
            .find_by_id(id)
            .await
            .map_err(|e| ArticleServiceError::Dependency(e.to_string()))?
            .ok_or(ArticleServiceError::NotFound)
    }

    async fn delete_article(&self, id: &str) -> Result<(), ArticleServiceError> {
        let article = self.get_article(id).await?;

        let mut removed = 0;
        for paragraph in &article.paragraphs {
            for path in self.audio_paths(&paragraph.audio) {
                if tokio::fs::remove_file(&path).await.is_ok() {
                    removed += 1;
                }
            }
        }

        self.article_repo
            .delete(id)
            .await
            .map_err(|e| ArticleServiceError::Dependency(e.to_string()))?;

        tracing::info!(article_id = %id, audio_files_removed = removed, "Article deleted");
        Ok(())
    }

    async fn article_progress(&self, id: &str) -> Result<ArticleProgress, ArticleServiceError> {
        let article = self.get_article(id).await?;

        let mut paragraphs = Vec::with_capacity(article.paragraphs.len());
        for (i, paragraph) in article.paragraphs.iter().enumerate() {
            let known = match &paragraph.task_id {
                Some(task_id) => self.job_queue.status(task_id).await,
                None => None,
            };

            let (status, result) = match known {
                Some(job) => (job.status, job.result),
                // status expired or never recorded: trust the file system
                None => match self.published_audio(&paragraph.audio).await {
                    Some(path) => (JobState::Succeeded, Some(path.display().to_string())),
                    None => (JobState::Failed, Some("job status unavailable".to_string())),
                },
            };

            paragraphs.push(ParagraphProgress {
                index: i + 1,
                audio: paragraph.audio.clone(),
                task_id: paragraph.task_id.clone(),
                status,
                result,
            });
        }

        Ok(ArticleProgress::new(article.id, paragraphs))
    }

    async fn enqueue_single(&self, request: GenerateAudioRequest) -> Result<String, ArticleServiceError> {
        if request.text.trim().is_empty() {
            return Err(ArticleServiceError::Validation("text must not be empty".to_string()));
        }
        if request.audio_filename.trim().is_empty() {
            return Err(ArticleServiceError::Validation(
                "audio_filename must not be empty".to_string(),
            ));
        }

        let task_id = self
            .job_queue
            .enqueue(SynthesisJob {
                chunk_text: request.text,
                target_filename: request.audio_filename,
                article_id: None,
                article_title: request.article_title,
                voice_hint: request.voice,
                provider_override: request.provider,
            })
            .await?;

        Ok(task_id)
    }

    async fn task_status(&self, task_id: &str) -> Result<JobStatus, ArticleServiceError> {
        self.job_queue
            .status(task_id)
            .await
            .ok_or(ArticleServiceError::TaskNotFound)
    }
}

impl ArticleService {
    fn chunk_limit(&self, requested: Option<usize>) -> Result<usize, ArticleServiceError> {
        match requested {
            Some(0) => Err(ArticleServiceError::Validation(
                "chunk_limit must be positive".to_string(),
            )),
            Some(limit) => Ok(limit),
            None => Ok(self.settings.chunk_char_limit),
        }
    }

    async fn extract_text(&self, document: &UploadedDocument) -> Result<String, ArticleServiceError> {
        if document.bytes.len() > self.settings.max_upload_bytes {
            return Err(ArticleServiceError::PayloadTooLarge(format!(
                "max {} MB",
                self.settings.max_upload_bytes / (1024 * 1024)
            )));
        }

        let extension = Path::new(&document.filename)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase());

        let raw_text = match extension.as_deref() {
            Some("txt") => String::from_utf8_lossy(&document.bytes).into_owned(),
            Some("pdf") => self
                .pdf_extractor
                .extract_text(&document.bytes)
                .await
                .map_err(|e| {
                    tracing::warn!(error = %e, filename = %document.filename, "PDF extraction failed");
                    ArticleServiceError::Extraction(format!("could not read PDF: {}", e))
                })?,
            _ => {
                return Err(ArticleServiceError::Validation(
                    "only .txt and .pdf files are supported".to_string(),
                ))
            }
        };

        if raw_text.trim().is_empty() {
            return Err(ArticleServiceError::Extraction(
                "the document contains no text".to_string(),
            ));
        }
        Ok(raw_text)
    }

    /// Deterministic chunking, optionally on LLM-cleaned text
    async fn prepare(&self, raw_text: &str, filename: &str, limit: usize, clean: bool) -> PreparedDocument {
        let assistant = match (&self.text_assistant, clean) {
            (Some(assistant), true) => assistant,
            (None, true) => {
                tracing::warn!("Text cleaning requested but no text assistant is configured");
                return prepare_document(raw_text, Some(filename), limit);
            }
            (_, false) => return prepare_document(raw_text, Some(filename), limit),
        };

        let flattened = flatten_for_cleaning(raw_text);
        let cleaned = match assistant.clean(&flattened).await {
            Ok(cleaned) if !cleaned.trim().is_empty() && !cleaned.starts_with("Error") => cleaned,
            Ok(_) => {
                tracing::warn!("Text assistant returned unusable output, using flattened text");
                flattened
            }
            Err(e) => {
                tracing::warn!(error = %e, "Text cleaning failed, using flattened text");
                flattened
            }
        };

        prepare_cleaned_document(raw_text, &cleaned, Some(filename), limit)
    }

    async fn resolve_title(&self, raw_text: &str, filename: &str, heuristic: String) -> String {
        let assistant = match &self.text_assistant {
            Some(assistant) if self.settings.extract_title => assistant,
            _ => return heuristic,
        };

        let proposed = match assistant.extract_title(raw_text).await {
            Ok(title) => Some(title),
            Err(e) => {
                tracing::warn!(error = %e, "Title extraction failed, using heuristic title");
                None
            }
        };

        accept_external_title(proposed.as_deref(), &normalize(raw_text), Some(filename))
    }

    /// Every path a chunk's audio may have been published under
    fn audio_paths(&self, audio: &str) -> Vec<PathBuf> {
        let stem = Path::new(audio)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if stem.is_empty() {
            return Vec::new();
        }

        let mut paths: Vec<PathBuf> = [self.settings.delivery_format, AudioFormat::INTERMEDIATE]
            .iter()
            .map(|format| self.settings.audio_dir.join(format!("{}.{}", stem, format.extension())))
            .collect();
        paths.push(
            self.settings
                .audio_dir
                .join("masters")
                .join(format!("{}.{}", stem, AudioFormat::INTERMEDIATE.extension())),
        );
        paths.dedup();
        paths
    }

    async fn published_audio(&self, audio: &str) -> Option<PathBuf> {
        for path in self.audio_paths(audio).into_iter().take(2) {
            if tokio::fs::metadata(&path).await.map(|m| m.len() > 0).unwrap_or(false) {
                return Some(path);
            }
        }
        None
    }
}
