use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::generation_tasks::{GenerationTaskEntity, InsertGenerationTaskEntity},
        repositories::generation_tasks::GenerationTaskRepository,
        value_objects::{enums::task_statuses::TaskStatus, generation_tasks::TaskListFilter},
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::generation_tasks},
};

/// Progress value written when a worker picks the task up.
const INITIAL_PROCESSING_PROGRESS: i32 = 5;

pub struct GenerationTaskPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl GenerationTaskPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl GenerationTaskRepository for GenerationTaskPostgres {
    async fn insert(&self, insert_task_entity: InsertGenerationTaskEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let task_id = diesel::insert_into(generation_tasks::table)
            .values(&insert_task_entity)
            .returning(generation_tasks::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(task_id)
    }

    async fn find_by_id(&self, task_id: Uuid) -> Result<Option<GenerationTaskEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let task = generation_tasks::table
            .find(task_id)
            .select(GenerationTaskEntity::as_select())
            .first::<GenerationTaskEntity>(&mut conn)
            .optional()?;

        Ok(task)
    }

    async fn mark_processing(&self, task_id: Uuid) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::update(generation_tasks::table.find(task_id))
            .set((
                generation_tasks::status.eq(TaskStatus::Processing.to_string()),
                generation_tasks::progress.eq(INITIAL_PROCESSING_PROGRESS),
                generation_tasks::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn update_progress(&self, task_id: Uuid, progress: i32) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::update(generation_tasks::table.find(task_id))
            .set((
                generation_tasks::progress.eq(progress.clamp(0, 100)),
                generation_tasks::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn mark_completed(
        &self,
        task_id: Uuid,
        output_video_key: String,
        video_duration_sec: i32,
        credit_cost: i32,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::update(generation_tasks::table.find(task_id))
            .set((
                generation_tasks::status.eq(TaskStatus::Completed.to_string()),
                generation_tasks::progress.eq(100),
                generation_tasks::output_video_key.eq(Some(output_video_key)),
                generation_tasks::video_duration_sec.eq(Some(video_duration_sec)),
                generation_tasks::credit_cost.eq(Some(credit_cost)),
                // Clear any message left behind by an earlier retried attempt.
                generation_tasks::error_message.eq::<Option<String>>(None),
                generation_tasks::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn mark_failed(&self, task_id: Uuid, error_message: String) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::update(generation_tasks::table.find(task_id))
            .set((
                generation_tasks::status.eq(TaskStatus::Failed.to_string()),
                generation_tasks::error_message.eq(Some(error_message)),
                generation_tasks::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn mark_pending_for_retry(&self, task_id: Uuid, error_message: String) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::update(generation_tasks::table.find(task_id))
            .set((
                generation_tasks::status.eq(TaskStatus::Pending.to_string()),
                generation_tasks::progress.eq(0),
                generation_tasks::error_message.eq(Some(error_message)),
                generation_tasks::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        filter: TaskListFilter,
    ) -> Result<(Vec<GenerationTaskEntity>, i64)> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let page = filter.page.max(1);
        let page_size = filter.page_size.clamp(1, 100);

        let mut query = generation_tasks::table
            .filter(generation_tasks::user_id.eq(user_id))
            .into_boxed();
        let mut count_query = generation_tasks::table
            .filter(generation_tasks::user_id.eq(user_id))
            .into_boxed();

        if let Some(status) = filter.status {
            query = query.filter(generation_tasks::status.eq(status.to_string()));
            count_query = count_query.filter(generation_tasks::status.eq(status.to_string()));
        }

        let total = count_query.count().get_result::<i64>(&mut conn)?;

        let tasks = query
            .order(generation_tasks::created_at.desc())
            .offset((page - 1) * page_size)
            .limit(page_size)
            .select(GenerationTaskEntity::as_select())
            .load::<GenerationTaskEntity>(&mut conn)?;

        Ok((tasks, total))
    }
}
