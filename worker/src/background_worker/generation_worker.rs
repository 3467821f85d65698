use anyhow::Result;
use std::{sync::Arc, time::Duration};
use tracing::{error, info};
use uuid::Uuid;

use crates::domain::{
    entities::jobs::JobEntity,
    repositories::{generation_tasks::GenerationTaskRepository, jobs::JobRepository},
    value_objects::{
        errors::is_token_limit_exceeded,
        jobs::{MAX_JOB_ATTEMPTS, VideoGenerationPayload},
    },
};

use crate::usecases::video_generation::VideoGenerationUseCase;

const IDLE_SLEEP: Duration = Duration::from_secs(5);

pub async fn run_generation_worker_loop(
    job_repo: Arc<dyn JobRepository + Send + Sync>,
    task_repo: Arc<dyn GenerationTaskRepository + Send + Sync>,
    usecase: Arc<VideoGenerationUseCase>,
) -> Result<()> {
    info!("Starting video generation worker loop");
    loop {
        match job_repo.lock_next_video_generation_job().await {
            Ok(Some(job)) => {
                info!(job_id = %job.id, attempt = job.attempts, "processing generation job");
                process_job(&job_repo, &task_repo, &usecase, &job).await;
            }
            Ok(None) => {
                tokio::time::sleep(IDLE_SLEEP).await;
            }
            Err(err) => {
                error!(error = ?err, "error locking next generation job");
                tokio::time::sleep(IDLE_SLEEP).await;
            }
        }
    }
}

async fn process_job(
    job_repo: &Arc<dyn JobRepository + Send + Sync>,
    task_repo: &Arc<dyn GenerationTaskRepository + Send + Sync>,
    usecase: &Arc<VideoGenerationUseCase>,
    job: &JobEntity,
) {
    let payload: VideoGenerationPayload = match serde_json::from_value(job.payload.clone()) {
        Ok(payload) => payload,
        Err(err) => {
            // Malformed payloads can never succeed; bury the job.
            error!(job_id = %job.id, error = ?err, "generation job payload is malformed");
            if let Err(mark_err) = job_repo
                .mark_job_dead(job.id, &format!("malformed payload: {err}"))
                .await
            {
                error!(job_id = %job.id, error = ?mark_err, "failed to bury malformed job");
            }
            return;
        }
    };

    match usecase.run(payload.task_id).await {
        Ok(()) => {
            if let Err(err) = job_repo.mark_job_done(job.id).await {
                error!(job_id = %job.id, error = ?err, "failed to mark job done");
            }
            info!(job_id = %job.id, task_id = %payload.task_id, "generation job completed");
        }
        Err(err) => {
            handle_job_failure(job_repo, task_repo, job, payload.task_id, err).await;
        }
    }
}

async fn handle_job_failure(
    job_repo: &Arc<dyn JobRepository + Send + Sync>,
    task_repo: &Arc<dyn GenerationTaskRepository + Send + Sync>,
    job: &JobEntity,
    task_id: Uuid,
    err: anyhow::Error,
) {
    let message = format!("{:#}", err);
    error!(job_id = %job.id, %task_id, error = %message, "generation job failed");

    // Terminal errors skip the backoff ladder; everything else gets the
    // remaining attempt budget.
    if is_token_limit_exceeded(&err) {
        if let Err(mark_err) = job_repo.mark_job_dead(job.id, &message).await {
            error!(job_id = %job.id, error = ?mark_err, "failed to mark job dead");
        }
        if let Err(mark_err) = task_repo.mark_failed(task_id, message).await {
            error!(%task_id, error = ?mark_err, "failed to mark task failed");
        }
        return;
    }

    match job_repo
        .mark_job_failed(job.id, &message, MAX_JOB_ATTEMPTS)
        .await
    {
        Ok(true) => {
            info!(job_id = %job.id, %task_id, "generation job requeued with backoff");
            if let Err(mark_err) = task_repo.mark_pending_for_retry(task_id, message).await {
                error!(%task_id, error = ?mark_err, "failed to reset task for retry");
            }
        }
        Ok(false) => {
            if let Err(mark_err) = task_repo.mark_failed(task_id, message).await {
                error!(%task_id, error = ?mark_err, "failed to mark task failed");
            }
        }
        Err(mark_err) => {
            error!(job_id = %job.id, error = ?mark_err, "failed to record job failure");
        }
    }
}
