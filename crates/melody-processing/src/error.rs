//! Download pipeline errors

use std::io;
use std::time::Duration;

use melody_core::AppError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Failed to connect {0} output")]
    Pipe(&'static str),

    #[error("Failed to hand extractor output to transcoder: {0}")]
    Handoff(#[source] io::Error),

    #[error("Metadata lookup failed: {0}")]
    Metadata(String),

    #[error("Metadata lookup timed out after {0:?}")]
    MetadataTimeout(Duration),

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: &'static str,
        status: String,
        stderr: String,
    },

    #[error("Failed to read transcoder output: {0}")]
    Read(#[source] io::Error),

    #[error("Scratch directory error: {0}")]
    Scratch(#[source] io::Error),
}

impl PipelineError {
    /// Failures of the metadata step, before any process for the audio itself ran.
    pub fn is_metadata(&self) -> bool {
        matches!(
            self,
            PipelineError::Metadata(_) | PipelineError::MetadataTimeout(_)
        )
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        if err.is_metadata() {
            AppError::MetadataUnavailable(err.to_string())
        } else {
            AppError::MediaConversionError(err.to_string())
        }
    }
}
