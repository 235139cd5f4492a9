//! Melody Core Library
//!
//! Domain models, error types, configuration and client identity hashing shared by
//! every Melody crate.

pub mod config;
pub mod constants;
pub mod error;
pub mod identity;
pub mod models;

// Re-export commonly used types
pub use config::{
    BaseConfig, Config, DownloaderConfig, OriginMode, PipelineMode, RateLimitBackend,
    SecretSource,
};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use identity::ClientIdentifier;
