use anyhow::Result;
use backend::axum_http::http_serve;
use backend::axum_http::routers::credits::CreditsRouterState;
use backend::axum_http::routers::payment_webhook::PaymentWebhookState;
use backend::config::config_loader;
use backend::usecases::{
    credits::CreditsUseCase, subscriptions::SubscriptionsUseCase, video_tasks::VideoTasksUseCase,
};
use crates::domain::repositories::{
    content::ContentExtractor, credit_ledger::CreditLedgerRepository,
    generation_tasks::GenerationTaskRepository, generative::GenerativeClient, jobs::JobRepository,
    payments::PaymentClient, storage::VideoStorageClient, subscriptions::SubscriptionRepository,
};
use crates::infra::{
    ai::gemini::{GeminiClient, GeminiConfig},
    content::extractor::HttpContentExtractor,
    db::{
        postgres::postgres_connection,
        repositories::{
            credit_ledger::CreditLedgerPostgres, generation_tasks::GenerationTaskPostgres,
            jobs::JobPostgres, subscriptions::SubscriptionPostgres,
        },
    },
    payments::checkout_client::CheckoutClient,
    storages::{s3::S3Config, video_storage::S3VideoStorageClient},
};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Backend exited with error: {}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("backend")?;

    let config = Arc::new(config_loader::load()?);
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
    let extractor: Arc<dyn ContentExtractor + Send + Sync> =
        Arc::new(HttpContentExtractor::new()?);
    let payment_client: Arc<dyn PaymentClient + Send + Sync> = Arc::new(CheckoutClient::new(
        config.payments.api_base_url.clone(),
        config.payments.api_key.clone(),
        config.payments.webhook_secret.clone(),
        config.payments.success_url.clone(),
    ));

    // Usecases.
    let video_tasks_usecase = Arc::new(VideoTasksUseCase::new(
        Arc::clone(&task_repo),
        Arc::clone(&ledger),
        Arc::clone(&job_repo),
        Arc::clone(&generative),
        Arc::clone(&extractor),
        Arc::clone(&storage),
        config.storage.signed_url_ttl_secs,
    ));
    let credits_usecase = Arc::new(CreditsUseCase::new(
        Arc::clone(&ledger),
        Arc::clone(&subscription_repo),
    ));
    let subscriptions_usecase = Arc::new(SubscriptionsUseCase::new(
        Arc::clone(&subscription_repo),
        Arc::clone(&ledger),
        Arc::clone(&payment_client),
    ));

    let credits_state = Arc::new(CreditsRouterState {
        credits: credits_usecase,
        subscriptions: Arc::clone(&subscriptions_usecase),
    });
    let webhook_state = Arc::new(PaymentWebhookState {
        payment_client,
        subscriptions: subscriptions_usecase,
    });

    http_serve::start(config, video_tasks_usecase, credits_state, webhook_state).await?;

    Ok(())
}
