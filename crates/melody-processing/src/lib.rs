//! Melody Processing Library
//!
//! Runs the external extractor and transcoder for a download and exposes the
//! transcoder output as a byte stream suitable for an HTTP response body.

pub mod download;
pub mod error;
pub mod filename;
pub mod metadata;
pub mod tools;

pub use download::{
    AudioStream, DownloadOrchestrator, DownloadPipelineConfig, OnSuccess, PreparedDownload,
    ProcessPipeline,
};
pub use error::PipelineError;
pub use filename::{content_disposition, content_type_for, sanitize_filename};
pub use metadata::MediaMetadata;
pub use tools::ToolCommand;
