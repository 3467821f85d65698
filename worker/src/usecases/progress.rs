use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crates::domain::repositories::generation_tasks::GenerationTaskRepository;

/// Persists pipeline progress so status polling sees live values. A write
/// failure must never abort the stage that reported it.
pub struct ProgressTracker {
    task_repo: Arc<dyn GenerationTaskRepository + Send + Sync>,
}

impl ProgressTracker {
    pub fn new(task_repo: Arc<dyn GenerationTaskRepository + Send + Sync>) -> Self {
        Self { task_repo }
    }

    /// Callers advance through the stage schedule and must not pass a value
    /// below the task's current progress.
    pub async fn advance(&self, task_id: Uuid, percent: f64, note: &str) {
        let percent = percent.clamp(0.0, 100.0) as i32;

        if let Err(err) = self.task_repo.update_progress(task_id, percent).await {
            error!(%task_id, percent, error = ?err, "failed to persist progress");
            return;
        }

        info!(%task_id, percent, note, "progress");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crates::domain::repositories::generation_tasks::MockGenerationTaskRepository;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn advance_persists_the_clamped_value() {
        let task_id = Uuid::new_v4();
        let mut task_repo = MockGenerationTaskRepository::new();
        task_repo
            .expect_update_progress()
            .with(eq(task_id), eq(100))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let tracker = ProgressTracker::new(Arc::new(task_repo));
        tracker.advance(task_id, 150.0, "done").await;
    }

    #[tokio::test]
    async fn advance_swallows_persistence_failures() {
        let task_id = Uuid::new_v4();
        let mut task_repo = MockGenerationTaskRepository::new();
        task_repo
            .expect_update_progress()
            .returning(|_, _| Box::pin(async { Err(anyhow::anyhow!("db down")) }));

        let tracker = ProgressTracker::new(Arc::new(task_repo));
        // Must return normally even though the write failed.
        tracker.advance(task_id, 42.0, "halfway").await;
    }
}
