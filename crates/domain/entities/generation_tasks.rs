use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::generation_tasks;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = generation_tasks)]
pub struct GenerationTaskEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub input_kind: String,
    pub original_text: Option<String>,
    pub source_url: Option<String>,
    pub input_file_key: Option<String>,
    pub output_video_key: Option<String>,
    pub video_duration_sec: Option<i32>,
    /// Null until settlement runs at the end of a successful pipeline.
    pub credit_cost: Option<i32>,
    pub target_language: String,
    pub voice_name: String,
    pub status: String,
    pub progress: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = generation_tasks)]
pub struct InsertGenerationTaskEntity {
    /// Generated by the caller so storage keys can reference the task before
    /// the row exists.
    pub id: Uuid,
    pub user_id: Uuid,
    pub input_kind: String,
    pub original_text: Option<String>,
    pub source_url: Option<String>,
    pub input_file_key: Option<String>,
    pub target_language: String,
    pub voice_name: String,
    pub status: String,
    pub progress: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
