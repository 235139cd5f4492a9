//! Media metadata from the extractor's JSON dump

use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::PipelineError;
use crate::tools::ToolCommand;

/// Longest stderr excerpt kept in metadata errors.
const MAX_STDERR_CHARS: usize = 2048;

/// The subset of the extractor's info document used to name and tag the output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MediaMetadata {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub uploader: String,
}

/// Generic extractors report unknown fields as `null`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl MediaMetadata {
    /// Parse the first JSON document of `output`.
    ///
    /// Playlist URLs make the extractor print one document per entry; only the first
    /// is used.
    pub fn from_json_output(output: &[u8]) -> Result<Self, PipelineError> {
        serde_json::Deserializer::from_slice(output)
            .into_iter::<MediaMetadata>()
            .next()
            .ok_or_else(|| PipelineError::Metadata("extractor printed no metadata".to_string()))?
            .map_err(|e| PipelineError::Metadata(format!("unparseable metadata: {}", e)))
    }
}

/// Arguments for a metadata-only extractor run.
pub fn metadata_args(url: &str) -> Vec<String> {
    vec![
        "--skip-download".to_string(),
        "--dump-json".to_string(),
        "--no-playlist".to_string(),
        "--".to_string(),
        url.to_string(),
    ]
}

/// Run the extractor in metadata-only mode and parse its output.
///
/// The child is killed if `timeout` elapses first.
#[tracing::instrument(skip(extractor), fields(extractor = %extractor))]
pub async fn resolve_metadata(
    extractor: &ToolCommand,
    url: &str,
    timeout: Duration,
) -> Result<MediaMetadata, PipelineError> {
    let mut command = extractor.command(metadata_args(url));
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = command
        .spawn()
        .map_err(|e| PipelineError::Metadata(format!("failed to start extractor: {}", e)))?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|e| PipelineError::Metadata(e.to_string()))?,
        Err(_) => {
            tracing::warn!(?timeout, "Metadata lookup timed out");
            return Err(PipelineError::MetadataTimeout(timeout));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let excerpt: String = stderr.trim().chars().take(MAX_STDERR_CHARS).collect();
        tracing::warn!(status = %output.status, stderr = %excerpt, "Extractor metadata run failed");
        return Err(PipelineError::Metadata(format!(
            "extractor exited with {}: {}",
            output.status, excerpt
        )));
    }

    let metadata = MediaMetadata::from_json_output(&output.stdout)?;
    tracing::debug!(title = %metadata.title, uploader = %metadata.uploader, "Resolved metadata");
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(body: &str) -> ToolCommand {
        ToolCommand::with_args("sh", ["-c", body, "extractor"])
    }

    #[test]
    fn test_parses_first_document() {
        let output = br#"{"title": "First", "uploader": "Someone", "duration": 212}
{"title": "Second", "uploader": "Else"}"#;
        let metadata = MediaMetadata::from_json_output(output).unwrap();
        assert_eq!(metadata.title, "First");
        assert_eq!(metadata.uploader, "Someone");
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let metadata = MediaMetadata::from_json_output(br#"{"id": "abc"}"#).unwrap();
        assert_eq!(metadata, MediaMetadata::default());
    }

    #[test]
    fn test_null_fields_default_to_empty() {
        let metadata =
            MediaMetadata::from_json_output(br#"{"title": "Direct file", "uploader": null, "id": "x"}"#)
                .unwrap();
        assert_eq!(metadata.title, "Direct file");
        assert_eq!(metadata.uploader, "");

        let metadata =
            MediaMetadata::from_json_output(br#"{"title": null, "uploader": null}"#).unwrap();
        assert_eq!(metadata, MediaMetadata::default());
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(MediaMetadata::from_json_output(b"").is_err());
        assert!(MediaMetadata::from_json_output(b"WARNING: nope").is_err());
    }

    #[test]
    fn test_url_comes_after_separator() {
        let args = metadata_args("-o/etc/passwd");
        assert_eq!(args[args.len() - 2], "--");
        assert_eq!(args[args.len() - 1], "-o/etc/passwd");
    }

    #[tokio::test]
    async fn test_resolve_metadata() {
        let extractor = script(r#"echo '{"title": "Song", "uploader": "Band"}'"#);
        let metadata = resolve_metadata(&extractor, "https://example.com/v", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(metadata.title, "Song");
        assert_eq!(metadata.uploader, "Band");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_metadata_error() {
        let extractor = script("echo 'ERROR: Unsupported URL' >&2; exit 1");
        let err = resolve_metadata(&extractor, "https://example.com/v", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.is_metadata());
        assert!(err.to_string().contains("Unsupported URL"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let extractor = script("sleep 10");
        let err = resolve_metadata(&extractor, "https://example.com/v", Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MetadataTimeout(_)));
    }

    #[tokio::test]
    async fn test_missing_binary_is_metadata_error() {
        let extractor = ToolCommand::new("/nonexistent/melody-extractor");
        let err = resolve_metadata(&extractor, "https://example.com/v", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(err.is_metadata());
    }
}
