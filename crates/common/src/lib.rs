//! CiteBuddy Common Library
//!
//! Shared code for the CiteBuddy workspace including:
//! - Article records and the repository abstraction (ADS, in-memory)
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod articles;
pub mod config;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use articles::{ArticleId, ArticleRecord, ArticleRepository};
pub use errors::{AppError, Result};
pub use crate::config::AppConfig;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
