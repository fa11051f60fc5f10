use std::net::SocketAddr;
use std::path::PathBuf;

use crate::record::Platform;

#[derive(Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub api_key: String,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub tags: Vec<String>,
    pub limit: usize,
    pub enabled_platforms: Vec<Platform>,
    pub request_timeout_secs: u64,
    pub request_delay_ms: u64,
    pub max_attempts: u32,
    pub output_dir: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &"[redacted]")
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("tags", &self.tags)
            .field("limit", &self.limit)
            .field("enabled_platforms", &self.enabled_platforms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("request_delay_ms", &self.request_delay_ms)
            .field("max_attempts", &self.max_attempts)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}
