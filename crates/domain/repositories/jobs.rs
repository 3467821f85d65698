use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::jobs::JobEntity;

#[async_trait]
#[automock]
pub trait JobRepository {
    async fn enqueue_video_generation_job(&self, task_id: Uuid) -> Result<Uuid>;
    /// Claims the next due job with `FOR UPDATE SKIP LOCKED`, so concurrent
    /// workers never run the same job.
    async fn lock_next_video_generation_job(&self) -> Result<Option<JobEntity>>;
    async fn mark_job_done(&self, job_id: Uuid) -> Result<()>;
    /// Requeues with exponential backoff until the attempt budget is spent,
    /// then marks the job dead. Returns true when the job will run again.
    async fn mark_job_failed(&self, job_id: Uuid, error: &str, max_attempts: i32) -> Result<bool>;
    /// Terminal failures skip the backoff ladder entirely.
    async fn mark_job_dead(&self, job_id: Uuid, error: &str) -> Result<()>;
}
