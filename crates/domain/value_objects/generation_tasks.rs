use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::generation_tasks::InsertGenerationTaskEntity,
    value_objects::enums::{input_kinds::InputKind, task_statuses::TaskStatus},
};

/// Ceiling on source-text size at admission, in provider tokens.
pub const MAX_INPUT_TOKENS: u64 = 1_048_576;

/// Ceiling on a single narration script handed to speech synthesis.
pub const MAX_NARRATION_TOKENS: u64 = 32_000;

/// Final output below this size is treated as corrupt.
pub const MIN_OUTPUT_BYTES: u64 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsertGenerationTaskModel {
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub input_kind: InputKind,
    pub original_text: String,
    pub source_url: Option<String>,
    pub input_file_key: Option<String>,
    pub target_language: String,
    pub voice_name: String,
}

impl InsertGenerationTaskModel {
    pub fn to_entity(&self) -> InsertGenerationTaskEntity {
        let now = Utc::now();
        InsertGenerationTaskEntity {
            id: self.task_id,
            user_id: self.user_id,
            input_kind: self.input_kind.to_string(),
            original_text: Some(self.original_text.clone()),
            source_url: self.source_url.clone(),
            input_file_key: self.input_file_key.clone(),
            target_language: self.target_language.clone(),
            voice_name: self.voice_name.clone(),
            status: TaskStatus::Pending.to_string(),
            progress: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TaskListFilter {
    pub status: Option<TaskStatus>,
    pub page: i64,
    pub page_size: i64,
}

/// Assets produced for one segment during a pipeline run. Ephemeral: they
/// live in the run's scratch directory and are reproducible from the task.
#[derive(Debug, Clone)]
pub struct SegmentAssets {
    pub index: usize,
    pub text: String,
    pub image_path: std::path::PathBuf,
    pub audio_path: std::path::PathBuf,
    pub clip_path: std::path::PathBuf,
    pub duration_seconds: i64,
}
