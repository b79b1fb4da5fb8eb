// Runtime configuration value objects
// Projected from the flat config file, one per collaborator

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub scratch_dir: String,
    pub log_dir: Option<String>,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub ready_timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub max_attempts: u32,
    pub timeout_seconds: Option<u64>,
    pub scratch_dir: String,
}

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_seconds: Option<u64>,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
}
