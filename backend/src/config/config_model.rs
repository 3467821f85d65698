#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub storage: Storage,
    pub generative: Generative,
    pub payments: Payments,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Storage {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub signed_url_ttl_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Generative {
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct Payments {
    pub api_base_url: String,
    pub api_key: String,
    pub webhook_secret: String,
    pub success_url: String,
}
