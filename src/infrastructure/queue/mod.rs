use async_trait::async_trait;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use crate::domain::tts::{JobError, SynthesisJob, SynthesisOrchestrator};
use crate::infrastructure::config::WorkerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub task_id: String,
    pub status: JobState,
    /// Artifact path on success, error message on failure
    pub result: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("job queue is full")]
    Full,
    #[error("job queue is shut down")]
    Closed,
}

/// Runs one job to completion
#[async_trait]
pub trait JobExecutor: Send + Sync {
    async fn execute(&self, job: &SynthesisJob) -> Result<PathBuf, JobError>;
}

#[async_trait]
impl JobExecutor for SynthesisOrchestrator {
    async fn execute(&self, job: &SynthesisJob) -> Result<PathBuf, JobError> {
        self.run(job).await
    }
}

struct QueuedJob {
    task_id: String,
    job: SynthesisJob,
}

/// In-process job queue drained by a fixed pool of worker tasks.
///
/// Jobs of the same article run in no particular order. Statuses are kept for
/// the configured TTL and then forgotten.
pub struct JobQueue {
    sender: mpsc::Sender<QueuedJob>,
    statuses: Cache<String, JobStatus>,
    workers: usize,
}

impl JobQueue {
    /// Spawn the workers; must be called inside a tokio runtime
    pub fn start(executor: Arc<dyn JobExecutor>, config: &WorkerConfig) -> Self {
        let (sender, receiver) = mpsc::channel::<QueuedJob>(config.queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let statuses: Cache<String, JobStatus> = Cache::builder()
            .time_to_live(Duration::from_secs(config.status_ttl_hours * 3600))
            .build();
        let time_limit = Duration::from_secs(config.job_time_limit_sec);
        let workers = config.concurrency.max(1);

        for worker_id in 0..workers {
            tokio::spawn(worker_loop(
                worker_id,
                receiver.clone(),
                executor.clone(),
                statuses.clone(),
                time_limit,
            ));
        }
        tracing::info!(workers, capacity = config.queue_capacity, "Job queue started");

        Self {
            sender,
            statuses,
            workers,
        }
    }

    /// Queue a job and return its task id
    pub async fn enqueue(&self, job: SynthesisJob) -> Result<String, QueueError> {
        let mut task_ids = self.enqueue_all(vec![job]).await?;
        task_ids.pop().ok_or(QueueError::Closed)
    }

    /// Queue every job or none of them, returning task ids in job order
    pub async fn enqueue_all(&self, jobs: Vec<SynthesisJob>) -> Result<Vec<String>, QueueError> {
        let mut permits = Vec::with_capacity(jobs.len());
        for _ in 0..jobs.len() {
            // dropping the permits taken so far releases their slots
            let permit = self.sender.try_reserve().map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => QueueError::Full,
                mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
            })?;
            permits.push(permit);
        }

        let mut task_ids = Vec::with_capacity(jobs.len());
        for (permit, job) in permits.into_iter().zip(jobs) {
            let task_id = Uuid::new_v4().to_string();
            record(&self.statuses, &task_id, JobState::Queued, None).await;
            permit.send(QueuedJob {
                task_id: task_id.clone(),
                job,
            });
            tracing::debug!(task_id = %task_id, "Job queued");
            task_ids.push(task_id);
        }
        Ok(task_ids)
    }

    pub async fn status(&self, task_id: &str) -> Option<JobStatus> {
        self.statuses.get(task_id).await
    }

    pub fn worker_count(&self) -> usize {
        self.workers
    }
}

async fn record(statuses: &Cache<String, JobStatus>, task_id: &str, state: JobState, result: Option<String>) {
    statuses
        .insert(
            task_id.to_string(),
            JobStatus {
                task_id: task_id.to_string(),
                status: state,
                result,
            },
        )
        .await;
}

async fn worker_loop(
    worker_id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<QueuedJob>>>,
    executor: Arc<dyn JobExecutor>,
    statuses: Cache<String, JobStatus>,
    time_limit: Duration,
) {
    loop {
        // hold the lock only while waiting for the next job
        let next = receiver.lock().await.recv().await;
        let Some(QueuedJob { task_id, job }) = next else {
            tracing::debug!(worker_id, "Job queue closed, worker exiting");
            return;
        };

        record(&statuses, &task_id, JobState::Running, None).await;
        let start_time = std::time::Instant::now();

        let result = match tokio::time::timeout(time_limit, executor.execute(&job)).await {
            Ok(result) => result,
            Err(_) => Err(JobError::TimedOut(time_limit.as_secs())),
        };

        match result {
            Ok(path) => {
                tracing::info!(
                    worker_id,
                    task_id = %task_id,
                    article_id = ?job.article_id,
                    latency_ms = start_time.elapsed().as_millis(),
                    "Job succeeded"
                );
                record(&statuses, &task_id, JobState::Succeeded, Some(path.display().to_string())).await;
            }
            Err(err) => {
                tracing::error!(
                    worker_id,
                    task_id = %task_id,
                    article_id = ?job.article_id,
                    error = %err,
                    "Job failed"
                );
                record(&statuses, &task_id, JobState::Failed, Some(err.to_string())).await;
            }
        }
    }
}
