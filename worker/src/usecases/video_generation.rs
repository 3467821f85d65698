use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::{error, info, warn};
use uuid::Uuid;

use crates::domain::{
    entities::generation_tasks::GenerationTaskEntity,
    repositories::{
        credit_ledger::CreditLedgerRepository, generation_tasks::GenerationTaskRepository,
        generative::GenerativeClient, media::MediaAssembler, storage::VideoStorageClient,
    },
    value_objects::{
        credits::task_credit_cost,
        errors::TokenLimitExceeded,
        generation_tasks::{MAX_NARRATION_TOKENS, MIN_OUTPUT_BYTES, SegmentAssets},
        languages::language_name,
    },
};

use crate::usecases::{
    progress::ProgressTracker,
    retry::{GENERATION_ATTEMPTS, with_retries},
};

// Progress schedule: 5 processing, 10 text loaded, 20 segmented, 20..80
// spread across segments in quarter-steps, 85 concatenated, 95 uploaded,
// 98 settled, 100 complete.
const PROGRESS_TEXT_LOADED: f64 = 10.0;
const PROGRESS_SEGMENTED: f64 = 20.0;
const PROGRESS_SEGMENT_SPAN: f64 = 60.0;
const PROGRESS_CONCATENATED: f64 = 85.0;
const PROGRESS_UPLOADED: f64 = 95.0;
const PROGRESS_SETTLING: f64 = 98.0;

/// The generation pipeline: segmentation, per-segment asset generation and
/// assembly, concatenation, upload, credit settlement.
pub struct VideoGenerationUseCase {
    task_repo: Arc<dyn GenerationTaskRepository + Send + Sync>,
    ledger: Arc<dyn CreditLedgerRepository + Send + Sync>,
    generative: Arc<dyn GenerativeClient + Send + Sync>,
    media: Arc<dyn MediaAssembler + Send + Sync>,
    storage: Arc<dyn VideoStorageClient + Send + Sync>,
    progress: ProgressTracker,
}

impl VideoGenerationUseCase {
    pub fn new(
        task_repo: Arc<dyn GenerationTaskRepository + Send + Sync>,
        ledger: Arc<dyn CreditLedgerRepository + Send + Sync>,
        generative: Arc<dyn GenerativeClient + Send + Sync>,
        media: Arc<dyn MediaAssembler + Send + Sync>,
        storage: Arc<dyn VideoStorageClient + Send + Sync>,
    ) -> Self {
        let progress = ProgressTracker::new(Arc::clone(&task_repo));
        Self {
            task_repo,
            ledger,
            generative,
            media,
            storage,
            progress,
        }
    }

    /// Runs one task to completion. Scratch space is released whether the
    /// pipeline succeeds or fails; the caller owns job bookkeeping and the
    /// failed/retry transition.
    pub async fn run(&self, task_id: Uuid) -> Result<()> {
        info!(%task_id, "processing video generation task");

        let task = self
            .task_repo
            .find_by_id(task_id)
            .await?
            .with_context(|| format!("task {} not found", task_id))?;

        self.task_repo.mark_processing(task_id).await?;

        let scratch_dir = std::env::temp_dir().join(format!("video-task-{}", task_id));
        tokio::fs::create_dir_all(&scratch_dir)
            .await
            .context("failed to create scratch directory")?;

        let result = self.run_pipeline(&task, &scratch_dir).await;

        if let Err(err) = tokio::fs::remove_dir_all(&scratch_dir).await {
            warn!(%task_id, error = ?err, "failed to clean up scratch directory");
        }

        result
    }

    async fn run_pipeline(&self, task: &GenerationTaskEntity, scratch_dir: &Path) -> Result<()> {
        let task_id = task.id;

        self.progress
            .advance(task_id, PROGRESS_TEXT_LOADED, "loading source text")
            .await;
        let text = task
            .original_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .context("no text content found in task")?;
        info!(%task_id, length = text.len(), "source text loaded");

        let segments = with_retries("segment content", GENERATION_ATTEMPTS, || {
            self.generative.split_into_segments(text)
        })
        .await?;
        if segments.is_empty() {
            bail!("content produced no segments");
        }
        self.progress
            .advance(
                task_id,
                PROGRESS_SEGMENTED,
                &format!("content split into {} segments", segments.len()),
            )
            .await;

        let language = language_name(&task.target_language);
        let mut assets: Vec<SegmentAssets> = Vec::with_capacity(segments.len());
        for (index, segment_text) in segments.iter().enumerate() {
            let asset = self
                .process_segment(task, segment_text, index, segments.len(), language, scratch_dir)
                .await?;
            assets.push(asset);
        }

        self.progress
            .advance(task_id, PROGRESS_CONCATENATED, "concatenating video segments")
            .await;
        let final_path = scratch_dir.join("final_video.mp4");
        let clip_paths: Vec<PathBuf> = assets.iter().map(|asset| asset.clip_path.clone()).collect();
        self.media.concatenate(&clip_paths, &final_path).await?;

        let output_size = tokio::fs::metadata(&final_path)
            .await
            .context("final video file was not created")?
            .len();
        if output_size < MIN_OUTPUT_BYTES {
            bail!("final video file is too small, possibly corrupted");
        }
        info!(%task_id, output_size, "final video assembled");

        self.progress
            .advance(task_id, PROGRESS_UPLOADED, "uploading video to storage")
            .await;
        let object_key = format!("outputs/{}/video.mp4", task_id);
        self.storage.upload_video(&final_path, &object_key).await?;

        self.progress
            .advance(task_id, PROGRESS_SETTLING, "settling credits")
            .await;
        let durations: Vec<i64> = assets.iter().map(|asset| asset.duration_seconds).collect();
        let total_duration: i64 = durations.iter().sum();
        let credit_cost = self.settle_credits(task, &durations).await;

        self.task_repo
            .mark_completed(task_id, object_key, total_duration as i32, credit_cost)
            .await?;

        info!(
            %task_id,
            segments = assets.len(),
            total_duration,
            credit_cost,
            "video generation completed"
        );
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn process_segment(
        &self,
        task: &GenerationTaskEntity,
        segment_text: &str,
        index: usize,
        segment_count: usize,
        language: &str,
        scratch_dir: &Path,
    ) -> Result<SegmentAssets> {
        let task_id = task.id;
        let base = PROGRESS_SEGMENTED + (index as f64) * PROGRESS_SEGMENT_SPAN / segment_count as f64;
        let quarter = PROGRESS_SEGMENT_SPAN / (segment_count as f64 * 4.0);
        info!(%task_id, segment = index + 1, total = segment_count, "processing segment");

        self.progress
            .advance(
                task_id,
                base,
                &format!("generating image for segment {}", index + 1),
            )
            .await;
        let image_path = with_retries("generate segment image", GENERATION_ATTEMPTS, || {
            self.generative
                .generate_segment_image(segment_text, index, scratch_dir)
        })
        .await?;

        self.progress
            .advance(
                task_id,
                base + quarter,
                &format!("generating narration for segment {}", index + 1),
            )
            .await;
        let narration = with_retries("generate narration script", GENERATION_ATTEMPTS, || {
            self.generative.narration_script(segment_text, language)
        })
        .await?;

        self.progress
            .advance(
                task_id,
                base + quarter * 2.0,
                &format!("generating audio for segment {}", index + 1),
            )
            .await;
        // The narration must fit the speech synthesizer's ceiling; exceeding
        // it is terminal and must not burn retry attempts.
        let narration_tokens = with_retries("count narration tokens", GENERATION_ATTEMPTS, || {
            self.generative.count_tokens(&narration)
        })
        .await?;
        if narration_tokens > MAX_NARRATION_TOKENS {
            return Err(anyhow::Error::new(TokenLimitExceeded {
                token_count: narration_tokens,
                max_tokens: MAX_NARRATION_TOKENS,
            })
            .context(format!("narration for segment {} is too long", index + 1)));
        }
        let audio_path = with_retries("synthesize narration", GENERATION_ATTEMPTS, || {
            self.generative
                .synthesize_narration(&narration, &task.voice_name, index, scratch_dir)
        })
        .await?;

        self.progress
            .advance(
                task_id,
                base + quarter * 3.0,
                &format!("composing video segment {}", index + 1),
            )
            .await;
        let clip_path = scratch_dir.join(format!("segment_{:03}.mp4", index));
        self.media
            .compose_clip(&image_path, &audio_path, &clip_path)
            .await?;

        let duration_seconds = self.media.clip_duration_seconds(&clip_path).await?.round() as i64;
        info!(
            %task_id,
            segment = index + 1,
            duration_seconds,
            "segment clip ready"
        );

        Ok(SegmentAssets {
            index,
            text: segment_text.to_string(),
            image_path,
            audio_path,
            clip_path,
            duration_seconds,
        })
    }

    /// Stage 7: exact cost from measured durations. A ledger failure is
    /// logged and swallowed so a finished video is not failed over billing;
    /// the task then records a zero cost.
    async fn settle_credits(&self, task: &GenerationTaskEntity, durations: &[i64]) -> i32 {
        let total_cost = task_credit_cost(durations);

        let description = format!(
            "task {} consume {} credits (segments: {})",
            task.id,
            total_cost,
            durations.len()
        );
        match self
            .ledger
            .settle(task.user_id, total_cost, task.id, Some(description))
            .await
        {
            Ok(transaction) => {
                info!(
                    task_id = %task.id,
                    total_cost,
                    balance_after = transaction.balance_after,
                    "credits settled"
                );
                total_cost
            }
            Err(err) => {
                error!(task_id = %task.id, error = ?err, "credit settlement failed; completing task with zero cost");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crates::domain::{
        entities::credit_transactions::CreditTransactionEntity,
        repositories::{
            credit_ledger::MockCreditLedgerRepository,
            generation_tasks::MockGenerationTaskRepository, generative::MockGenerativeClient,
            media::MockMediaAssembler, storage::MockVideoStorageClient,
        },
        value_objects::{
            enums::task_statuses::TaskStatus, errors::is_token_limit_exceeded,
            storage::UploadResult,
        },
    };
    use mockall::predicate::eq;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn sample_task(task_id: Uuid, user_id: Uuid) -> GenerationTaskEntity {
        let now = Utc::now();
        GenerationTaskEntity {
            id: task_id,
            user_id,
            input_kind: "text".to_string(),
            original_text: Some("three part story about rust".to_string()),
            source_url: None,
            input_file_key: None,
            output_video_key: None,
            video_duration_sec: None,
            credit_cost: None,
            target_language: "en".to_string(),
            voice_name: "Achernar".to_string(),
            status: TaskStatus::Pending.to_string(),
            progress: 0,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    struct Mocks {
        task_repo: MockGenerationTaskRepository,
        ledger: MockCreditLedgerRepository,
        generative: MockGenerativeClient,
        media: MockMediaAssembler,
        storage: MockVideoStorageClient,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                task_repo: MockGenerationTaskRepository::new(),
                ledger: MockCreditLedgerRepository::new(),
                generative: MockGenerativeClient::new(),
                media: MockMediaAssembler::new(),
                storage: MockVideoStorageClient::new(),
            }
        }

        fn into_usecase(self) -> VideoGenerationUseCase {
            VideoGenerationUseCase::new(
                Arc::new(self.task_repo),
                Arc::new(self.ledger),
                Arc::new(self.generative),
                Arc::new(self.media),
                Arc::new(self.storage),
            )
        }
    }

    /// Wires every collaborator for a happy-path three-segment run with the
    /// given measured durations.
    fn wire_happy_path(mocks: &mut Mocks, task: &GenerationTaskEntity, durations: Vec<f64>) {
        let task_id = task.id;
        let found = task.clone();

        mocks.task_repo.expect_find_by_id().returning(move |_| {
            let found = found.clone();
            Box::pin(async move { Ok(Some(found)) })
        });
        mocks
            .task_repo
            .expect_mark_processing()
            .with(eq(task_id))
            .returning(|_| Box::pin(async { Ok(()) }));
        mocks
            .task_repo
            .expect_update_progress()
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let segment_count = durations.len();
        mocks.generative.expect_split_into_segments().returning(move |_| {
            let segments: Vec<String> = (0..segment_count)
                .map(|i| format!("segment text {}", i))
                .collect();
            Box::pin(async move { Ok(segments) })
        });
        mocks
            .generative
            .expect_generate_segment_image()
            .returning(|_, index, out_dir| {
                let path = out_dir.join(format!("image_{:03}.png", index));
                Box::pin(async move { Ok(path) })
            });
        mocks
            .generative
            .expect_narration_script()
            .returning(|segment, _| {
                let narration = format!("narration for {}", segment);
                Box::pin(async move { Ok(narration) })
            });
        mocks
            .generative
            .expect_count_tokens()
            .returning(|_| Box::pin(async { Ok(120) }));
        mocks
            .generative
            .expect_synthesize_narration()
            .returning(|_, _, index, out_dir| {
                let path = out_dir.join(format!("audio_{:03}.wav", index));
                Box::pin(async move { Ok(path) })
            });

        mocks
            .media
            .expect_compose_clip()
            .returning(|_, _, output_path| {
                let path = output_path.to_path_buf();
                Box::pin(async move { Ok(path) })
            });
        let duration_queue = Mutex::new(VecDeque::from(durations));
        mocks
            .media
            .expect_clip_duration_seconds()
            .returning(move |_| {
                let duration = duration_queue
                    .lock()
                    .unwrap()
                    .pop_front()
                    .expect("more duration probes than segments");
                Box::pin(async move { Ok(duration) })
            });
        mocks
            .media
            .expect_concatenate()
            .returning(|_, output_path| {
                // The pipeline verifies the artifact on disk, so the fake
                // assembler has to produce one above the size floor.
                std::fs::write(output_path, vec![0u8; 4096]).unwrap();
                let path = output_path.to_path_buf();
                Box::pin(async move { Ok(path) })
            });

        mocks.storage.expect_upload_video().returning(|_, key| {
            let result = UploadResult {
                object_key: key.to_string(),
                size_bytes: 4096,
            };
            Box::pin(async move { Ok(result) })
        });
    }

    fn settlement_entry(user_id: Uuid, task_id: Uuid, amount: i32) -> CreditTransactionEntity {
        CreditTransactionEntity {
            id: Uuid::new_v4(),
            user_id,
            task_id: Some(task_id),
            subscription_id: None,
            transaction_type: "task_consume".to_string(),
            amount: -amount,
            balance_after: 100 - amount,
            description: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn three_segments_settle_exact_cost_and_complete() {
        let task_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let task = sample_task(task_id, user_id);

        let mut mocks = Mocks::new();
        // Durations 61/50/20 price at 45/40/30 = 115 credits.
        wire_happy_path(&mut mocks, &task, vec![61.0, 50.0, 20.0]);

        mocks
            .ledger
            .expect_settle()
            .withf(move |uid, amount, tid, _| *uid == user_id && *amount == 115 && *tid == task_id)
            .times(1)
            .returning(move |uid, amount, tid, _| {
                let entry = settlement_entry(uid, tid, amount);
                Box::pin(async move { Ok(entry) })
            });
        mocks
            .task_repo
            .expect_mark_completed()
            .withf(move |tid, key, duration, cost| {
                *tid == task_id
                    && key == &format!("outputs/{}/video.mp4", task_id)
                    && *duration == 131
                    && *cost == 115
            })
            .times(1)
            .returning(|_, _, _, _| Box::pin(async { Ok(()) }));

        let usecase = mocks.into_usecase();
        usecase.run(task_id).await.unwrap();
    }

    #[tokio::test]
    async fn settlement_failure_is_swallowed_and_task_still_completes() {
        let task_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let task = sample_task(task_id, user_id);

        let mut mocks = Mocks::new();
        wire_happy_path(&mut mocks, &task, vec![61.0, 50.0, 20.0]);

        mocks
            .ledger
            .expect_settle()
            .returning(|_, _, _, _| Box::pin(async { Err(anyhow::anyhow!("ledger down")) }));
        mocks
            .task_repo
            .expect_mark_completed()
            .withf(move |tid, _, _, cost| *tid == task_id && *cost == 0)
            .times(1)
            .returning(|_, _, _, _| Box::pin(async { Ok(()) }));

        let usecase = mocks.into_usecase();
        usecase.run(task_id).await.unwrap();
    }

    #[tokio::test]
    async fn zero_segments_fail_the_pipeline() {
        let task_id = Uuid::new_v4();
        let task = sample_task(task_id, Uuid::new_v4());

        let mut mocks = Mocks::new();
        let found = task.clone();
        mocks.task_repo.expect_find_by_id().returning(move |_| {
            let found = found.clone();
            Box::pin(async move { Ok(Some(found)) })
        });
        mocks
            .task_repo
            .expect_mark_processing()
            .returning(|_| Box::pin(async { Ok(()) }));
        mocks
            .task_repo
            .expect_update_progress()
            .returning(|_, _| Box::pin(async { Ok(()) }));
        mocks
            .generative
            .expect_split_into_segments()
            .returning(|_| Box::pin(async { Ok(Vec::new()) }));

        let usecase = mocks.into_usecase();
        let result = usecase.run(task_id).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn oversized_narration_is_terminal() {
        let task_id = Uuid::new_v4();
        let task = sample_task(task_id, Uuid::new_v4());

        let mut mocks = Mocks::new();
        let found = task.clone();
        mocks.task_repo.expect_find_by_id().returning(move |_| {
            let found = found.clone();
            Box::pin(async move { Ok(Some(found)) })
        });
        mocks
            .task_repo
            .expect_mark_processing()
            .returning(|_| Box::pin(async { Ok(()) }));
        mocks
            .task_repo
            .expect_update_progress()
            .returning(|_, _| Box::pin(async { Ok(()) }));
        mocks
            .generative
            .expect_split_into_segments()
            .returning(|_| Box::pin(async { Ok(vec!["one".to_string()]) }));
        mocks
            .generative
            .expect_generate_segment_image()
            .returning(|_, index, out_dir| {
                let path = out_dir.join(format!("image_{:03}.png", index));
                Box::pin(async move { Ok(path) })
            });
        mocks
            .generative
            .expect_narration_script()
            .returning(|_, _| Box::pin(async { Ok("endless narration".to_string()) }));
        mocks
            .generative
            .expect_count_tokens()
            .times(1)
            .returning(|_| Box::pin(async { Ok(MAX_NARRATION_TOKENS + 1) }));
        // Synthesis must never run for an oversized narration.
        mocks.generative.expect_synthesize_narration().times(0);

        let usecase = mocks.into_usecase();
        let err = usecase.run(task_id).await.unwrap_err();
        assert!(is_token_limit_exceeded(&err));
    }
}
