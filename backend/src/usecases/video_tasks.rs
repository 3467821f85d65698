use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crates::domain::{
    entities::generation_tasks::GenerationTaskEntity,
    repositories::{
        content::ContentExtractor, credit_ledger::CreditLedgerRepository,
        generation_tasks::GenerationTaskRepository, generative::GenerativeClient,
        jobs::JobRepository, storage::VideoStorageClient,
    },
    value_objects::{
        credits::MIN_CREDIT_FOR_TASK,
        enums::{input_kinds::InputKind, task_statuses::TaskStatus},
        generation_tasks::{InsertGenerationTaskModel, MAX_INPUT_TOKENS, TaskListFilter},
    },
};

use crate::axum_http::error_responses::AppError;

const NAME_PREVIEW_CHARS: usize = 30;

#[derive(Debug, Clone)]
pub struct SubmittedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct SubmitVideoModel {
    pub text: Option<String>,
    pub file: Option<SubmittedFile>,
    pub url: Option<String>,
    pub language: String,
    pub voice_name: String,
}

#[derive(Debug, Serialize)]
pub struct TaskSummaryDto {
    pub id: Uuid,
    pub name: String,
    pub input_kind: String,
    pub source_url: Option<String>,
    pub output_video_url: Option<String>,
    pub video_duration_sec: Option<i32>,
    pub credit_cost: Option<i32>,
    pub target_language: String,
    pub voice_name: String,
    pub status: String,
    pub progress: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PaginationDto {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Serialize)]
pub struct TaskListDto {
    pub tasks: Vec<TaskSummaryDto>,
    pub pagination: PaginationDto,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskListQueryModel {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub status: Option<TaskStatus>,
}

pub struct VideoTasksUseCase {
    task_repo: Arc<dyn GenerationTaskRepository + Send + Sync>,
    ledger: Arc<dyn CreditLedgerRepository + Send + Sync>,
    job_repo: Arc<dyn JobRepository + Send + Sync>,
    generative: Arc<dyn GenerativeClient + Send + Sync>,
    extractor: Arc<dyn ContentExtractor + Send + Sync>,
    storage: Arc<dyn VideoStorageClient + Send + Sync>,
    signed_url_ttl_secs: u64,
}

impl VideoTasksUseCase {
    pub fn new(
        task_repo: Arc<dyn GenerationTaskRepository + Send + Sync>,
        ledger: Arc<dyn CreditLedgerRepository + Send + Sync>,
        job_repo: Arc<dyn JobRepository + Send + Sync>,
        generative: Arc<dyn GenerativeClient + Send + Sync>,
        extractor: Arc<dyn ContentExtractor + Send + Sync>,
        storage: Arc<dyn VideoStorageClient + Send + Sync>,
        signed_url_ttl_secs: u64,
    ) -> Self {
        Self {
            task_repo,
            ledger,
            job_repo,
            generative,
            extractor,
            storage,
            signed_url_ttl_secs,
        }
    }

    /// Admission: balance gate, input precedence, extraction, token bound,
    /// then the pending task row and its queue job.
    pub async fn submit(
        &self,
        request: SubmitVideoModel,
        user_id: Uuid,
    ) -> Result<Uuid, AppError> {
        let is_sufficient = self
            .ledger
            .is_sufficient(user_id, MIN_CREDIT_FOR_TASK)
            .await
            .map_err(AppError::from)?;
        if !is_sufficient {
            warn!(%user_id, "task admission rejected: insufficient credit");
            return Err(AppError::InsufficientCredit(format!(
                "Insufficient credit balance. You need at least {} credits to create a task.",
                MIN_CREDIT_FOR_TASK
            )));
        }

        let task_id = Uuid::new_v4();

        // Input precedence: uploaded file > url > raw text.
        let (input_kind, original_text, source_url, input_file_key) =
            if let Some(file) = request.file {
                let text = self
                    .extractor
                    .extract_from_file(&file.filename, &file.bytes)
                    .await
                    .map_err(|err| AppError::FileProcessing(err.to_string()))?;

                let object_key = format!("inputs/{}/{}", task_id, file.filename);
                let content_type = mime_guess::from_path(&file.filename)
                    .first_or_octet_stream()
                    .to_string();
                self.storage
                    .upload_bytes(&object_key, file.bytes, &content_type)
                    .await
                    .map_err(|err| {
                        AppError::Storage(format!("Failed to upload file to storage: {err}"))
                    })?;

                (InputKind::File, text, None, Some(object_key))
            } else if let Some(url) = request.url.filter(|url| !url.trim().is_empty()) {
                let text = self
                    .extractor
                    .extract_from_url(&url)
                    .await
                    .map_err(|err| {
                        error!(%user_id, url, error = ?err, "failed to extract content from URL");
                        AppError::UrlAccess("Failed to access the provided URL".to_string())
                    })?;

                (InputKind::Url, text, Some(url), None)
            } else if let Some(text) = request.text.filter(|text| !text.trim().is_empty()) {
                (InputKind::Text, text, None, None)
            } else {
                return Err(AppError::BadRequest(
                    "At least one of file, url, or text must be provided".to_string(),
                ));
            };

        let token_count = self
            .generative
            .count_tokens(&original_text)
            .await
            .map_err(|err| {
                error!(%user_id, error = ?err, "failed to count input tokens");
                AppError::BadRequest("Failed to validate input text".to_string())
            })?;
        if token_count > MAX_INPUT_TOKENS {
            return Err(AppError::TokenLimitExceeded(format!(
                "Input text contains {} tokens, which exceeds the maximum limit of {} tokens",
                token_count, MAX_INPUT_TOKENS
            )));
        }

        let insert_model = InsertGenerationTaskModel {
            task_id,
            user_id,
            input_kind,
            original_text,
            source_url,
            input_file_key,
            target_language: request.language,
            voice_name: request.voice_name,
        };

        self.task_repo
            .insert(insert_model.to_entity())
            .await
            .map_err(AppError::from)?;

        self.job_repo
            .enqueue_video_generation_job(task_id)
            .await
            .map_err(AppError::from)?;

        info!(%user_id, %task_id, %input_kind, "generation task submitted");
        Ok(task_id)
    }

    pub async fn list_tasks(
        &self,
        user_id: Uuid,
        query: TaskListQueryModel,
    ) -> Result<TaskListDto, AppError> {
        let page = query.page.unwrap_or(1).max(1);
        let page_size = query.page_size.unwrap_or(10).clamp(1, 100);

        let filter = TaskListFilter {
            status: query.status,
            page,
            page_size,
        };

        let (tasks, total) = self
            .task_repo
            .list_by_user(user_id, filter)
            .await
            .map_err(AppError::from)?;

        let mut summaries = Vec::with_capacity(tasks.len());
        for task in tasks {
            summaries.push(self.to_summary(task).await);
        }

        let total_pages = (total + page_size - 1) / page_size;
        Ok(TaskListDto {
            tasks: summaries,
            pagination: PaginationDto {
                page,
                page_size,
                total,
                total_pages,
                has_next: page < total_pages,
                has_prev: page > 1,
            },
        })
    }

    /// Listing view: bulk text is dropped, the output key is re-signed per
    /// request so links stay fresh.
    async fn to_summary(&self, task: GenerationTaskEntity) -> TaskSummaryDto {
        let output_video_url = match &task.output_video_key {
            Some(key) => match self
                .storage
                .signed_url(key, self.signed_url_ttl_secs)
                .await
            {
                Ok(url) => Some(url),
                Err(err) => {
                    error!(task_id = %task.id, error = ?err, "failed to sign output URL");
                    Some(key.clone())
                }
            },
            None => None,
        };

        TaskSummaryDto {
            id: task.id,
            name: name_preview(task.original_text.as_deref()),
            input_kind: task.input_kind,
            source_url: task.source_url,
            output_video_url,
            video_duration_sec: task.video_duration_sec,
            credit_cost: task.credit_cost,
            target_language: task.target_language,
            voice_name: task.voice_name,
            status: task.status,
            progress: task.progress,
            error_message: task.error_message,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

fn name_preview(original_text: Option<&str>) -> String {
    match original_text {
        Some(text) => {
            let preview: String = text.chars().take(NAME_PREVIEW_CHARS).collect();
            if text.chars().count() > NAME_PREVIEW_CHARS {
                format!("{}...", preview)
            } else {
                preview
            }
        }
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crates::domain::repositories::{
        content::MockContentExtractor, credit_ledger::MockCreditLedgerRepository,
        generation_tasks::MockGenerationTaskRepository, generative::MockGenerativeClient,
        jobs::MockJobRepository, storage::MockVideoStorageClient,
    };
    use crates::domain::value_objects::storage::UploadResult;
    use mockall::predicate::eq;

    struct Mocks {
        task_repo: MockGenerationTaskRepository,
        ledger: MockCreditLedgerRepository,
        job_repo: MockJobRepository,
        generative: MockGenerativeClient,
        extractor: MockContentExtractor,
        storage: MockVideoStorageClient,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                task_repo: MockGenerationTaskRepository::new(),
                ledger: MockCreditLedgerRepository::new(),
                job_repo: MockJobRepository::new(),
                generative: MockGenerativeClient::new(),
                extractor: MockContentExtractor::new(),
                storage: MockVideoStorageClient::new(),
            }
        }

        fn into_usecase(self) -> VideoTasksUseCase {
            VideoTasksUseCase::new(
                Arc::new(self.task_repo),
                Arc::new(self.ledger),
                Arc::new(self.job_repo),
                Arc::new(self.generative),
                Arc::new(self.extractor),
                Arc::new(self.storage),
                3600,
            )
        }
    }

    fn text_request(text: &str) -> SubmitVideoModel {
        SubmitVideoModel {
            text: Some(text.to_string()),
            language: "en".to_string(),
            voice_name: "Achernar".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn admission_below_threshold_creates_no_task() {
        let user_id = Uuid::new_v4();
        let mut mocks = Mocks::new();

        mocks
            .ledger
            .expect_is_sufficient()
            .with(eq(user_id), eq(30))
            .returning(|_, _| Box::pin(async { Ok(false) }));
        // No insert and no enqueue may happen.
        mocks.task_repo.expect_insert().times(0);
        mocks.job_repo.expect_enqueue_video_generation_job().times(0);

        let usecase = mocks.into_usecase();
        let result = usecase.submit(text_request("some content"), user_id).await;

        assert!(matches!(result, Err(AppError::InsufficientCredit(_))));
    }

    #[tokio::test]
    async fn text_submission_inserts_pending_task_and_enqueues_job() {
        let user_id = Uuid::new_v4();
        let mut mocks = Mocks::new();

        mocks
            .ledger
            .expect_is_sufficient()
            .returning(|_, _| Box::pin(async { Ok(true) }));
        mocks
            .generative
            .expect_count_tokens()
            .returning(|_| Box::pin(async { Ok(42) }));
        mocks
            .task_repo
            .expect_insert()
            .withf(|entity| {
                entity.status == TaskStatus::Pending.to_string()
                    && entity.progress == 0
                    && entity.input_kind == "text"
                    && entity.original_text.as_deref() == Some("hello world")
            })
            .returning(|entity| {
                let id = entity.id;
                Box::pin(async move { Ok(id) })
            });
        mocks
            .job_repo
            .expect_enqueue_video_generation_job()
            .returning(|task_id| Box::pin(async move { Ok(task_id) }));

        let usecase = mocks.into_usecase();
        let task_id = usecase
            .submit(text_request("hello world"), user_id)
            .await
            .unwrap();
        assert_ne!(task_id, Uuid::nil());
    }

    #[tokio::test]
    async fn oversized_input_is_terminal() {
        let user_id = Uuid::new_v4();
        let mut mocks = Mocks::new();

        mocks
            .ledger
            .expect_is_sufficient()
            .returning(|_, _| Box::pin(async { Ok(true) }));
        mocks
            .generative
            .expect_count_tokens()
            .returning(|_| Box::pin(async { Ok(MAX_INPUT_TOKENS + 1) }));
        mocks.task_repo.expect_insert().times(0);

        let usecase = mocks.into_usecase();
        let result = usecase.submit(text_request("huge"), user_id).await;
        assert!(matches!(result, Err(AppError::TokenLimitExceeded(_))));
    }

    #[tokio::test]
    async fn file_wins_over_url_and_text() {
        let user_id = Uuid::new_v4();
        let mut mocks = Mocks::new();

        mocks
            .ledger
            .expect_is_sufficient()
            .returning(|_, _| Box::pin(async { Ok(true) }));
        mocks
            .extractor
            .expect_extract_from_file()
            .returning(|_, _| Box::pin(async { Ok("from file".to_string()) }));
        mocks.extractor.expect_extract_from_url().times(0);
        mocks
            .storage
            .expect_upload_bytes()
            .withf(|key, _, _| key.starts_with("inputs/") && key.ends_with("/notes.txt"))
            .returning(|key, bytes, _| {
                let result = UploadResult {
                    object_key: key.to_string(),
                    size_bytes: bytes.len() as i64,
                };
                Box::pin(async move { Ok(result) })
            });
        mocks
            .generative
            .expect_count_tokens()
            .returning(|_| Box::pin(async { Ok(5) }));
        mocks
            .task_repo
            .expect_insert()
            .withf(|entity| {
                entity.input_kind == "file"
                    && entity.original_text.as_deref() == Some("from file")
                    && entity.input_file_key.is_some()
            })
            .returning(|entity| {
                let id = entity.id;
                Box::pin(async move { Ok(id) })
            });
        mocks
            .job_repo
            .expect_enqueue_video_generation_job()
            .returning(|task_id| Box::pin(async move { Ok(task_id) }));

        let mut request = text_request("fallback text");
        request.url = Some("https://example.com/post".to_string());
        request.file = Some(SubmittedFile {
            filename: "notes.txt".to_string(),
            bytes: b"from file".to_vec(),
        });

        let usecase = mocks.into_usecase();
        usecase.submit(request, user_id).await.unwrap();
    }

    #[test]
    fn name_preview_truncates_on_char_boundaries() {
        assert_eq!(name_preview(Some("short")), "short");
        let long = "a".repeat(40);
        assert_eq!(name_preview(Some(&long)), format!("{}...", "a".repeat(30)));
        assert_eq!(name_preview(None), "");
    }
}
