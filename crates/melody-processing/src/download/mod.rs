//! Streaming download pipeline
//!
//! Metadata is resolved first, then the extractor and transcoder are started and
//! the transcoder output becomes the response body. The increment callback runs only
//! after the transcoder finished successfully.

mod config;
mod orchestrator;
mod process;
mod stream;

pub use config::DownloadPipelineConfig;
pub use orchestrator::{DownloadOrchestrator, PreparedDownload};
pub use process::ProcessPipeline;
pub use stream::{AudioStream, OnSuccess};
