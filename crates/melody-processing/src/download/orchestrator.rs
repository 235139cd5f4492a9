use std::path::{Path, PathBuf};
use std::process::Stdio;

use melody_core::PipelineMode;

use super::config::DownloadPipelineConfig;
use super::process::ProcessPipeline;
use super::stream::{AudioStream, OnSuccess};
use crate::error::PipelineError;
use crate::filename::content_disposition;
use crate::metadata::{resolve_metadata, MediaMetadata};

/// Best audio-only format, avoiding webm containers when something else exists.
const AUDIO_SELECTOR: &str = "bestaudio[ext!=webm]/bestaudio";

const SCRATCH_SOURCE_STEM: &str = "source";
const MAX_STDERR_CHARS: usize = 2048;

/// Everything the HTTP layer needs to answer with the converted audio.
pub struct PreparedDownload {
    pub metadata: MediaMetadata,
    pub content_type: &'static str,
    pub content_disposition: String,
    pub stream: AudioStream,
}

/// Runs metadata resolution, then the extractor into the transcoder.
#[derive(Clone, Debug)]
pub struct DownloadOrchestrator {
    config: DownloadPipelineConfig,
}

impl DownloadOrchestrator {
    pub fn new(config: DownloadPipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DownloadPipelineConfig {
        &self.config
    }

    pub async fn resolve_metadata(&self, url: &str) -> Result<MediaMetadata, PipelineError> {
        resolve_metadata(&self.config.extractor, url, self.config.metadata_timeout).await
    }

    /// Resolve metadata and start producing audio for `url`.
    ///
    /// Every error returned here happens before any response byte exists. Errors after
    /// that point surface through the returned stream. `on_success` runs once the
    /// stream completed and the transcoder exited cleanly.
    #[tracing::instrument(skip(self, on_success), fields(mode = ?self.config.mode))]
    pub async fn start(
        &self,
        url: &str,
        on_success: OnSuccess,
    ) -> Result<PreparedDownload, PipelineError> {
        let metadata = self.resolve_metadata(url).await?;

        let stream = match self.config.mode {
            PipelineMode::Piped => self.start_piped(url, &metadata, on_success)?,
            PipelineMode::Scratch => self.start_scratch(url, &metadata, on_success).await?,
        };

        Ok(PreparedDownload {
            content_type: self.config.content_type(),
            content_disposition: content_disposition(&metadata.title, &self.config.audio_format),
            metadata,
            stream,
        })
    }

    fn start_piped(
        &self,
        url: &str,
        metadata: &MediaMetadata,
        on_success: OnSuccess,
    ) -> Result<AudioStream, PipelineError> {
        let extractor = self
            .config
            .extractor
            .command(extractor_args(url, "-"));
        let transcoder = self
            .config
            .transcoder
            .command(self.transcoder_args("pipe:0", metadata, "pipe:1", false));

        let pipeline = ProcessPipeline::spawn(extractor, "extractor", transcoder, "transcoder")?;
        AudioStream::piped(pipeline, on_success)
    }

    async fn start_scratch(
        &self,
        url: &str,
        metadata: &MediaMetadata,
        on_success: OnSuccess,
    ) -> Result<AudioStream, PipelineError> {
        let scratch = tempfile::Builder::new()
            .prefix("melody-")
            .tempdir()
            .map_err(PipelineError::Scratch)?;

        let template = scratch
            .path()
            .join(format!("{}.%(ext)s", SCRATCH_SOURCE_STEM));
        let mut extractor = self
            .config
            .extractor
            .command(extractor_args(url, &template.to_string_lossy()));
        run_to_completion(&mut extractor, "extractor").await?;

        let source = find_source(scratch.path()).await?;
        let output = scratch
            .path()
            .join(format!("output.{}", self.config.audio_format));
        let mut transcoder = self.config.transcoder.command(self.transcoder_args(
            &source.to_string_lossy(),
            metadata,
            &output.to_string_lossy(),
            true,
        ));
        run_to_completion(&mut transcoder, "transcoder").await?;

        let file = tokio::fs::File::open(&output)
            .await
            .map_err(PipelineError::Scratch)?;
        tracing::debug!(dir = %scratch.path().display(), "Scratch conversion finished");
        Ok(AudioStream::scratch(file, scratch, on_success))
    }

    fn transcoder_args(
        &self,
        input: &str,
        metadata: &MediaMetadata,
        output: &str,
        overwrite: bool,
    ) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            input.into(),
            "-vn".into(),
            "-ab".into(),
            self.config.audio_bitrate.clone(),
            "-ar".into(),
            self.config.audio_sample_rate.to_string(),
            "-metadata".into(),
            format!("title={}", metadata.title),
            "-metadata".into(),
            format!("artist={}", metadata.uploader),
            "-f".into(),
            muxer_for(&self.config.audio_format).into(),
        ];
        if overwrite {
            args.push("-y".into());
        }
        args.push(output.into());
        args
    }
}

/// Extractor arguments for downloading best audio to `output` (`-` for stdout).
fn extractor_args(url: &str, output: &str) -> Vec<String> {
    vec![
        "--format".into(),
        AUDIO_SELECTOR.into(),
        "--no-cache-dir".into(),
        "--no-playlist".into(),
        "--quiet".into(),
        "--output".into(),
        output.into(),
        "--".into(),
        url.into(),
    ]
}

fn muxer_for(format: &str) -> &str {
    match format {
        "opus" => "ogg",
        other => other,
    }
}

async fn run_to_completion(
    command: &mut tokio::process::Command,
    tool: &'static str,
) -> Result<(), PipelineError> {
    let output = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| PipelineError::Spawn { tool, source })?;

    if output.status.success() {
        return Ok(());
    }
    let stderr: String = String::from_utf8_lossy(&output.stderr)
        .trim()
        .chars()
        .take(MAX_STDERR_CHARS)
        .collect();
    tracing::error!(tool, status = %output.status, stderr = %stderr, "Process failed");
    Err(PipelineError::ToolFailed {
        tool,
        status: output.status.to_string(),
        stderr,
    })
}

/// The file the extractor wrote; its extension depends on the chosen format.
async fn find_source(dir: &Path) -> Result<PathBuf, PipelineError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(PipelineError::Scratch)?;
    while let Some(entry) = entries.next_entry().await.map_err(PipelineError::Scratch)? {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with(SCRATCH_SOURCE_STEM) {
            return Ok(entry.path());
        }
    }
    Err(PipelineError::ToolFailed {
        tool: "extractor",
        status: "exit status: 0".to_string(),
        stderr: "no output file was written".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extractor_args_end_with_separator_and_url() {
        let args = extractor_args("https://example.com/watch?v=1", "-");
        assert_eq!(&args[..2], &["--format", AUDIO_SELECTOR]);
        assert!(args.windows(2).any(|w| w == ["--output", "-"]));
        assert_eq!(&args[args.len() - 2..], &["--", "https://example.com/watch?v=1"]);
    }

    #[test]
    fn test_transcoder_args() {
        let orchestrator = DownloadOrchestrator::new(DownloadPipelineConfig::default());
        let metadata = MediaMetadata {
            title: "Song".to_string(),
            uploader: "Band".to_string(),
        };
        let args = orchestrator.transcoder_args("pipe:0", &metadata, "pipe:1", false);

        assert!(args.windows(2).any(|w| w == ["-i", "pipe:0"]));
        assert!(args.contains(&"-vn".to_string()));
        assert!(args.windows(2).any(|w| w == ["-ab", "320k"]));
        assert!(args.windows(2).any(|w| w == ["-ar", "48000"]));
        assert!(args.windows(2).any(|w| w == ["-metadata", "title=Song"]));
        assert!(args.windows(2).any(|w| w == ["-metadata", "artist=Band"]));
        assert!(args.windows(2).any(|w| w == ["-f", "mp3"]));
        assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
        assert!(!args.contains(&"-y".to_string()));
    }
}
