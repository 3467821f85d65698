use anyhow::{Ok, Result};

use super::config_model::{
    BackendServer, Database, DotEnvyConfig, Generative, Payments, Storage,
};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: std::env::var("SERVER_PORT_BACKEND")
            .expect("SERVER_PORT_BACKEND is invalid")
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .expect("SERVER_BODY_LIMIT is invalid")
            .parse()?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .expect("SERVER_TIMEOUT is invalid")
            .parse()?,
    };

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
        signed_url_ttl_secs: std::env::var("STORAGE_SIGNED_URL_TTL")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()?,
    };

    let generative = Generative {
        api_key: std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY is invalid"),
    };

    let payments = Payments {
        api_base_url: std::env::var("PAYMENT_API_BASE_URL")
            .expect("PAYMENT_API_BASE_URL is invalid"),
        api_key: std::env::var("PAYMENT_API_KEY").expect("PAYMENT_API_KEY is invalid"),
        webhook_secret: std::env::var("PAYMENT_WEBHOOK_SECRET")
            .expect("PAYMENT_WEBHOOK_SECRET is invalid"),
        success_url: std::env::var("PAYMENT_SUCCESS_URL").expect("PAYMENT_SUCCESS_URL is invalid"),
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        storage,
        generative,
        payments,
    })
}

pub fn get_auth_secret() -> Result<String> {
    dotenvy::dotenv().ok();

    Ok(std::env::var("JWT_AUTH_SECRET").expect("JWT_AUTH_SECRET is invalid"))
}
