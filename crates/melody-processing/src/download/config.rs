use std::time::Duration;

use anyhow::Context;
use melody_core::{Config, PipelineMode};

use crate::filename::content_type_for;
use crate::tools::ToolCommand;

/// Settings for extractor and transcoder runs.
#[derive(Clone, Debug)]
pub struct DownloadPipelineConfig {
    pub extractor: ToolCommand,
    pub transcoder: ToolCommand,
    /// Transcoder output format, also the file extension
    pub audio_format: String,
    pub audio_bitrate: String,
    pub audio_sample_rate: u32,
    pub mode: PipelineMode,
    pub metadata_timeout: Duration,
}

impl DownloadPipelineConfig {
    pub fn from_config(config: &Config) -> Result<Self, anyhow::Error> {
        let extractor = ToolCommand::parse(config.ytdlp_path()).context("YTDLP_PATH is empty")?;
        let transcoder =
            ToolCommand::parse(config.ffmpeg_path()).context("FFMPEG_PATH is empty")?;

        let audio_format = config.audio_format().to_ascii_lowercase();
        if content_type_for(&audio_format).is_none() {
            return Err(anyhow::anyhow!(
                "AUDIO_FORMAT '{}' is not supported",
                config.audio_format()
            ));
        }

        Ok(Self {
            extractor,
            transcoder,
            audio_format,
            audio_bitrate: config.audio_bitrate().to_string(),
            audio_sample_rate: config.audio_sample_rate(),
            mode: config.pipeline_mode(),
            metadata_timeout: Duration::from_secs(config.metadata_timeout_secs()),
        })
    }

    pub fn content_type(&self) -> &'static str {
        content_type_for(&self.audio_format).unwrap_or("application/octet-stream")
    }
}

impl Default for DownloadPipelineConfig {
    fn default() -> Self {
        Self {
            extractor: ToolCommand::new("yt-dlp"),
            transcoder: ToolCommand::new("ffmpeg"),
            audio_format: "mp3".to_string(),
            audio_bitrate: "320k".to_string(),
            audio_sample_rate: 48_000,
            mode: PipelineMode::Piped,
            metadata_timeout: Duration::from_secs(60),
        }
    }
}
