use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::jobs::{InsertJobEntity, JobEntity},
        repositories::jobs::JobRepository,
        value_objects::{
            enums::job_statuses::JobStatus,
            jobs::{JOB_TYPE_VIDEO_GENERATION, VideoGenerationPayload},
        },
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::jobs},
};

pub struct JobPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl JobPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl JobRepository for JobPostgres {
    async fn enqueue_video_generation_job(&self, task_id: Uuid) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let payload = serde_json::to_value(VideoGenerationPayload { task_id })?;
        let insert_entity = InsertJobEntity {
            type_: JOB_TYPE_VIDEO_GENERATION.to_string(),
            payload,
            run_at: Utc::now(),
            attempts: 0,
            locked_at: None,
            locked_by: None,
            error: None,
            status: JobStatus::Queued.to_string(),
            created_at: Utc::now(),
        };

        let job_id = diesel::insert_into(jobs::table)
            .values(&insert_entity)
            .returning(jobs::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(job_id)
    }

    async fn lock_next_video_generation_job(&self) -> Result<Option<JobEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let worker_id = Uuid::new_v4().to_string();
        let current_time = Utc::now();

        // Claim under FOR UPDATE SKIP LOCKED so each job lands on exactly
        // one worker.
        let job = conn.transaction::<Option<JobEntity>, diesel::result::Error, _>(|conn| {
            let candidate: Option<JobEntity> = jobs::table
                .select(JobEntity::as_select())
                .filter(jobs::type_.eq(JOB_TYPE_VIDEO_GENERATION))
                .filter(jobs::status.eq(JobStatus::Queued.to_string()))
                .filter(jobs::run_at.le(current_time))
                .order(jobs::run_at.asc())
                .for_update()
                .skip_locked()
                .first::<JobEntity>(conn)
                .optional()?;

            if let Some(job) = candidate {
                let updated_job = diesel::update(jobs::table.find(job.id))
                    .set((
                        jobs::status.eq(JobStatus::Running.to_string()),
                        jobs::attempts.eq(job.attempts + 1),
                        jobs::locked_at.eq(Some(current_time)),
                        jobs::locked_by.eq(Some(worker_id)),
                    ))
                    .returning(JobEntity::as_select())
                    .get_result::<JobEntity>(conn)?;
                Ok(Some(updated_job))
            } else {
                Ok(None)
            }
        })?;

        Ok(job)
    }

    async fn mark_job_done(&self, job_id: Uuid) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::update(jobs::table.find(job_id))
            .set((
                jobs::status.eq(JobStatus::Done.to_string()),
                jobs::locked_at.eq::<Option<chrono::DateTime<Utc>>>(None),
                jobs::locked_by.eq::<Option<String>>(None),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn mark_job_failed(&self, job_id: Uuid, error: &str, max_attempts: i32) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let current_time = Utc::now();

        let job = jobs::table
            .find(job_id)
            .select(JobEntity::as_select())
            .first::<JobEntity>(&mut conn)?;

        let will_retry = job.attempts < max_attempts;
        let (new_status, next_run_at) = if will_retry {
            // Exponential backoff: 5s, 25s, 125s...
            let backoff_sec = 5 * 5_i64.pow(job.attempts.saturating_sub(1).max(0) as u32);
            (
                JobStatus::Queued.to_string(),
                current_time + chrono::Duration::seconds(backoff_sec),
            )
        } else {
            (JobStatus::Dead.to_string(), current_time)
        };

        diesel::update(jobs::table.find(job_id))
            .set((
                jobs::status.eq(new_status),
                jobs::error.eq(Some(error)),
                jobs::run_at.eq(next_run_at),
                jobs::locked_at.eq::<Option<chrono::DateTime<Utc>>>(None),
                jobs::locked_by.eq::<Option<String>>(None),
            ))
            .execute(&mut conn)?;

        Ok(will_retry)
    }

    async fn mark_job_dead(&self, job_id: Uuid, error: &str) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::update(jobs::table.find(job_id))
            .set((
                jobs::status.eq(JobStatus::Dead.to_string()),
                jobs::error.eq(Some(error)),
                jobs::locked_at.eq::<Option<chrono::DateTime<Utc>>>(None),
                jobs::locked_by.eq::<Option<String>>(None),
            ))
            .execute(&mut conn)?;

        Ok(())
    }
}
