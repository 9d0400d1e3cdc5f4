use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::{
    domain::article::{
        Article, ArticleProgress, ArticleService, ArticleServiceApi, ArticleSummary,
        UploadOptions, UploadedDocument,
    },
    error::{AppError, AppResult},
};

/// Multipart field carrying the document
const FILE_FIELD: &str = "file";

pub struct ArticleController {
    article_service: Arc<ArticleService>,
}

impl ArticleController {
    pub fn new(article_service: Arc<ArticleService>) -> Self {
        Self { article_service }
    }

    /// POST /upload - Upload a .txt or .pdf document and queue its audio
    pub async fn upload(
        State(controller): State<Arc<ArticleController>>,
        Query(options): Query<UploadOptions>,
        mut multipart: Multipart,
    ) -> AppResult<Json<Article>> {
        let mut document = None;

        while let Some(field) = multipart.next_field().await? {
            if field.name() != Some(FILE_FIELD) {
                continue;
            }
            let filename = field
                .file_name()
                .map(str::to_string)
                .ok_or_else(|| AppError::BadRequest("uploaded file has no filename".to_string()))?;
            let bytes = field.bytes().await?;

            document = Some(UploadedDocument {
                filename,
                bytes: bytes.to_vec(),
            });
        }

        let document = document
            .ok_or_else(|| AppError::BadRequest("missing multipart field 'file'".to_string()))?;

        let article = controller
            .article_service
            .create_from_upload(document, options)
            .await?;
        Ok(Json(article))
    }

    /// GET /api/articles - List stored articles, newest first
    pub async fn list_articles(
        State(controller): State<Arc<ArticleController>>,
    ) -> AppResult<Json<Vec<ArticleSummary>>> {
        let articles = controller.article_service.list_articles().await?;
        Ok(Json(articles))
    }

    /// GET /api/article/:id - Get one article
    pub async fn get_article(
        State(controller): State<Arc<ArticleController>>,
        Path(article_id): Path<String>,
    ) -> AppResult<Json<Article>> {
        let article = controller.article_service.get_article(&article_id).await?;
        Ok(Json(article))
    }

    /// DELETE /api/article/:id - Delete an article and its audio
    pub async fn delete_article(
        State(controller): State<Arc<ArticleController>>,
        Path(article_id): Path<String>,
    ) -> AppResult<StatusCode> {
        controller.article_service.delete_article(&article_id).await?;
        Ok(StatusCode::NO_CONTENT)
    }

    /// GET /api/article/:id/progress - Aggregated job status of an article
    pub async fn article_progress(
        State(controller): State<Arc<ArticleController>>,
        Path(article_id): Path<String>,
    ) -> AppResult<Json<ArticleProgress>> {
        let progress = controller
            .article_service
            .article_progress(&article_id)
            .await?;
        Ok(Json(progress))
    }
}
