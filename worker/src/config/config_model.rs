#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub database: Database,
    pub storage: Storage,
    pub generative: Generative,
    pub maintenance: Maintenance,
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
}

#[derive(Debug, Clone)]
pub struct Generative {
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct Maintenance {
    /// Optional chat-webhook sink for renewal reminders.
    pub renewal_webhook_url: Option<String>,
}
