use anyhow::Result;
use crates::domain::repositories::{
    credit_ledger::CreditLedgerRepository, generation_tasks::GenerationTaskRepository,
    generative::GenerativeClient, jobs::JobRepository, media::MediaAssembler,
    notify::RenewalNotifier, storage::VideoStorageClient, subscriptions::SubscriptionRepository,
};
use crates::infra::{
    ai::gemini::{GeminiClient, GeminiConfig},
    db::{
        postgres::postgres_connection,
        repositories::{
            credit_ledger::CreditLedgerPostgres, generation_tasks::GenerationTaskPostgres,
            jobs::JobPostgres, subscriptions::SubscriptionPostgres,
        },
    },
    media::ffmpeg::FfmpegAssembler,
    notify::webhook_notifier::WebhookRenewalNotifier,
    storages::{s3::S3Config, video_storage::S3VideoStorageClient},
};
use std::sync::Arc;
use tracing::{error, info, warn};
use url::Url;
use worker::{
    background_worker::{generation_worker, maintenance_worker},
    config,
    usecases::{
        subscription_maintenance::SubscriptionMaintenanceUseCase,
        video_generation::VideoGenerationUseCase,
    },
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Worker exited with error: {}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("worker")?;

    let config = Arc::new(config::config_loader::load()?);
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&config.database.url)?;
    info!("Postgres connection has been established");
    let db_pool = Arc::new(postgres_pool);

    // Repositories over the shared pool.
    let task_repo: Arc<dyn GenerationTaskRepository + Send + Sync> =
        Arc::new(GenerationTaskPostgres::new(Arc::clone(&db_pool)));
    let ledger: Arc<dyn CreditLedgerRepository + Send + Sync> =
        Arc::new(CreditLedgerPostgres::new(Arc::clone(&db_pool)));
    let job_repo: Arc<dyn JobRepository + Send + Sync> =
        Arc::new(JobPostgres::new(Arc::clone(&db_pool)));
    let subscription_repo: Arc<dyn SubscriptionRepository + Send + Sync> =
        Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool)));

    // External collaborators.
    let storage: Arc<dyn VideoStorageClient + Send + Sync> = Arc::new(
        S3VideoStorageClient::new(S3Config::new(
            config.storage.endpoint.clone(),
            config.storage.region.clone(),
            config.storage.bucket.clone(),
            config.storage.access_key.clone(),
            config.storage.secret_key.clone(),
        ))
        .await?,
    );
    let generative: Arc<dyn GenerativeClient + Send + Sync> =
        Arc::new(GeminiClient::new(GeminiConfig {
            api_key: config.generative.api_key.clone(),
            ..GeminiConfig::default()
        })?);
    let media: Arc<dyn MediaAssembler + Send + Sync> = Arc::new(FfmpegAssembler::new());

    let notifier: Option<Arc<dyn RenewalNotifier + Send + Sync>> =
        match config.maintenance.renewal_webhook_url.as_deref() {
            Some(raw_url) => match Url::parse(raw_url) {
                Ok(url) => Some(Arc::new(WebhookRenewalNotifier::new(url)?)),
                Err(err) => {
                    warn!(error = ?err, "invalid renewal webhook URL; reminders disabled");
                    None
                }
            },
            None => None,
        };

    // Usecases.
    let generation_usecase = Arc::new(VideoGenerationUseCase::new(
        Arc::clone(&task_repo),
        Arc::clone(&ledger),
        generative,
        media,
        storage,
    ));
    let maintenance_usecase = Arc::new(SubscriptionMaintenanceUseCase::new(
        subscription_repo,
        Arc::clone(&ledger),
        notifier,
    ));

    info!("Worker started");

    let generation_loop = tokio::spawn(generation_worker::run_generation_worker_loop(
        job_repo,
        task_repo,
        generation_usecase,
    ));
    let maintenance_loop = tokio::spawn(maintenance_worker::run_maintenance_worker_loop(
        maintenance_usecase,
    ));

    tokio::select! {
        result = generation_loop => result??,
        result = maintenance_loop => result??,
    };

    Ok(())
}
