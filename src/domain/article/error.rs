use crate::error::AppError;
use crate::infrastructure::queue::QueueError;

#[derive(Debug, thiserror::Error)]
pub enum ArticleServiceError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("file too large: {0}")]
    PayloadTooLarge(String),
    #[error("could not extract text: {0}")]
    Extraction(String),
    #[error("article not found")]
    NotFound,
    #[error("task not found")]
    TaskNotFound,
    #[error("job queue unavailable: {0}")]
    Unavailable(#[from] QueueError),
    #[error("dependency error: {0}")]
    Dependency(String),
}

impl From<ArticleServiceError> for AppError {
    fn from(err: ArticleServiceError) -> Self {
        match err {
            ArticleServiceError::Validation(msg) => AppError::BadRequest(msg),
            ArticleServiceError::PayloadTooLarge(msg) => AppError::PayloadTooLarge(msg),
            ArticleServiceError::Extraction(msg) => AppError::Unprocessable(msg),
            ArticleServiceError::NotFound => AppError::NotFound("Article not found".to_string()),
            ArticleServiceError::TaskNotFound => AppError::NotFound("Task not found".to_string()),
            ArticleServiceError::Unavailable(e) => AppError::ServiceUnavailable(e.to_string()),
            ArticleServiceError::Dependency(msg) => AppError::Internal(msg),
        }
    }
}
