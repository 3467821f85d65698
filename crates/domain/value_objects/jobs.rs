use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const JOB_TYPE_VIDEO_GENERATION: &str = "VideoGeneration";

/// Job-level retry budget for a generation task, including the first attempt.
pub const MAX_JOB_ATTEMPTS: i32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoGenerationPayload {
    pub task_id: Uuid,
}
