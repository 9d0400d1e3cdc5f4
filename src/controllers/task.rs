use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::{
    domain::article::{ArticleService, ArticleServiceApi, GenerateAudioRequest, QueuedTaskResponse},
    error::AppResult,
    infrastructure::queue::JobStatus,
};

pub struct TaskController {
    article_service: Arc<ArticleService>,
}

impl TaskController {
    pub fn new(article_service: Arc<ArticleService>) -> Self {
        Self { article_service }
    }

    /// GET /task_status/:task_id - Status of a queued synthesis job
    pub async fn task_status(
        State(controller): State<Arc<TaskController>>,
        Path(task_id): Path<String>,
    ) -> AppResult<Json<JobStatus>> {
        let status = controller.article_service.task_status(&task_id).await?;
        Ok(Json(status))
    }

    /// POST /generate_audio - Queue a single synthesis job
    pub async fn generate_audio(
        State(controller): State<Arc<TaskController>>,
        Json(request): Json<GenerateAudioRequest>,
    ) -> AppResult<(StatusCode, Json<QueuedTaskResponse>)> {
        let task_id = controller.article_service.enqueue_single(request).await?;
        Ok((StatusCode::ACCEPTED, Json(QueuedTaskResponse::queued(task_id))))
    }
}
