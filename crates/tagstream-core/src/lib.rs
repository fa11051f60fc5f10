//! Core types for the tagstream crawl pipeline.
//!
//! Holds the canonical content record produced by every platform adapter,
//! the per-run summary handed to the publisher and the artifact store, and
//! environment-driven application configuration.

use thiserror::Error;

mod app_config;
mod config;
mod record;
mod summary;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use record::{Author, ContentBody, ContentRecord, ContentType, Platform};
pub use summary::{PlatformOutcome, RunSummary, TagError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
