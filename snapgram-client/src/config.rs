use std::time::Duration;

/// Display name used for comments whose author could not be resolved
pub const FALLBACK_USER_NAME: &str = "Unknown User";

#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Upper bound on the duration of each remote call
    pub timeout: Duration,

    /// How many author lookups a single listing may run at once
    pub max_concurrent_lookups: usize,

    pub fallback_name: String,
}

impl Default for StoreConfig {
    fn default() -> StoreConfig {
        StoreConfig {
            timeout: Duration::from_secs(10),
            max_concurrent_lookups: 8,
            fallback_name: String::from(FALLBACK_USER_NAME),
        }
    }
}

/// Where and how to reach the document service
#[derive(Clone, Debug)]
pub struct BackendConfig {
    /// Base url of the REST api, eg. `https://cloud.example.org/v1`
    pub endpoint: String,
    pub project_id: String,
    pub api_key: Option<String>,
    pub database_id: String,
    pub comments_collection_id: String,
    pub users_collection_id: String,

    /// Retries on transient failures, on top of the first attempt
    pub max_retries: u32,
}
