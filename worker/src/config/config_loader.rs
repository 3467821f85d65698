use anyhow::{Ok, Result};

use super::config_model::{Database, DotEnvyConfig, Generative, Maintenance, Storage};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let database = Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    let storage = Storage {
        endpoint: std::env::var("STORAGE_S3_ENDPOINT").expect("STORAGE_S3_ENDPOINT is invalid"),
        region: std::env::var("STORAGE_S3_REGION").expect("STORAGE_S3_REGION is invalid"),
        bucket: std::env::var("STORAGE_S3_BUCKET").expect("STORAGE_S3_BUCKET is invalid"),
        access_key: std::env::var("STORAGE_S3_ACCESS_KEY")
            .expect("STORAGE_S3_ACCESS_KEY is invalid"),
        secret_key: std::env::var("STORAGE_S3_SECRET_KEY")
            .expect("STORAGE_S3_SECRET_KEY is invalid"),
    };

    let generative = Generative {
        api_key: std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY is invalid"),
    };

    let maintenance = Maintenance {
        renewal_webhook_url: std::env::var("RENEWAL_REMINDER_WEBHOOK_URL")
            .ok()
            .filter(|url| !url.trim().is_empty()),
    };

    Ok(DotEnvyConfig {
        database,
        storage,
        generative,
        maintenance,
    })
}
