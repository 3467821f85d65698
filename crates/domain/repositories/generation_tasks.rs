use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::generation_tasks::{GenerationTaskEntity, InsertGenerationTaskEntity},
    value_objects::generation_tasks::TaskListFilter,
};

#[async_trait]
#[automock]
pub trait GenerationTaskRepository {
    async fn insert(&self, insert_task_entity: InsertGenerationTaskEntity) -> Result<Uuid>;
    async fn find_by_id(&self, task_id: Uuid) -> Result<Option<GenerationTaskEntity>>;
    /// Marks the task processing with the initial progress value.
    async fn mark_processing(&self, task_id: Uuid) -> Result<()>;
    async fn update_progress(&self, task_id: Uuid, progress: i32) -> Result<()>;
    async fn mark_completed(
        &self,
        task_id: Uuid,
        output_video_key: String,
        video_duration_sec: i32,
        credit_cost: i32,
    ) -> Result<()>;
    async fn mark_failed(&self, task_id: Uuid, error_message: String) -> Result<()>;
    /// Puts a task back in line after a retryable failure; progress restarts
    /// so it stays non-decreasing within each processing episode.
    async fn mark_pending_for_retry(&self, task_id: Uuid, error_message: String) -> Result<()>;
    /// Newest-first page of a user's tasks plus the total row count for the
    /// same filter.
    async fn list_by_user(
        &self,
        user_id: Uuid,
        filter: TaskListFilter,
    ) -> Result<(Vec<GenerationTaskEntity>, i64)>;
}
