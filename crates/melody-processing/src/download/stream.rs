use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use tempfile::TempDir;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

use super::process::ProcessPipeline;
use crate::error::PipelineError;

/// Read size for the response body.
const CHUNK_SIZE: usize = 32 * 1024;

/// Runs once, after the last byte was read and the transcoder exited successfully.
pub type OnSuccess = BoxFuture<'static, ()>;

/// What keeps the bytes flowing. Dropping it kills processes or removes files.
enum Source {
    Piped(ProcessPipeline),
    Scratch { _dir: TempDir },
}

struct StreamState {
    reader: ReaderStream<Pin<Box<dyn AsyncRead + Send>>>,
    source: Source,
    on_success: Option<OnSuccess>,
    finished: bool,
}

/// Converted audio as a stream of chunks.
///
/// Yields `Err` at most once and then ends; an HTTP server treats that as an aborted
/// body. Dropping the stream before the end tears down the pipeline.
pub struct AudioStream {
    inner: BoxStream<'static, Result<Bytes, PipelineError>>,
    upstream_id: Option<u32>,
    downstream_id: Option<u32>,
}

impl AudioStream {
    /// Stream the output of a running pipeline.
    pub fn piped(mut pipeline: ProcessPipeline, on_success: OnSuccess) -> Result<Self, PipelineError> {
        let output = pipeline
            .take_output()
            .ok_or(PipelineError::Pipe("transcoder"))?;
        let upstream_id = pipeline.upstream_id();
        let downstream_id = pipeline.downstream_id();
        let mut stream = Self::from_source(Box::pin(output), Source::Piped(pipeline), on_success);
        stream.upstream_id = upstream_id;
        stream.downstream_id = downstream_id;
        Ok(stream)
    }

    /// Stream a finished file that lives inside `scratch`.
    pub fn scratch(file: tokio::fs::File, scratch: TempDir, on_success: OnSuccess) -> Self {
        Self::from_source(Box::pin(file), Source::Scratch { _dir: scratch }, on_success)
    }

    fn from_source(
        reader: Pin<Box<dyn AsyncRead + Send>>,
        source: Source,
        on_success: OnSuccess,
    ) -> Self {
        let state = StreamState {
            reader: ReaderStream::with_capacity(reader, CHUNK_SIZE),
            source,
            on_success: Some(on_success),
            finished: false,
        };
        Self {
            inner: stream::unfold(state, next_chunk).boxed(),
            upstream_id: None,
            downstream_id: None,
        }
    }

    /// Process ID of the extractor, for piped streams.
    pub fn upstream_id(&self) -> Option<u32> {
        self.upstream_id
    }

    /// Process ID of the transcoder, for piped streams.
    pub fn downstream_id(&self) -> Option<u32> {
        self.downstream_id
    }
}

async fn next_chunk(
    mut state: StreamState,
) -> Option<(Result<Bytes, PipelineError>, StreamState)> {
    if state.finished {
        return None;
    }

    match state.reader.next().await {
        Some(Ok(chunk)) => Some((Ok(chunk), state)),
        Some(Err(e)) => {
            tracing::error!(error = %e, "Reading converted audio failed, aborting response");
            state.finished = true;
            Some((Err(PipelineError::Read(e)), state))
        }
        None => {
            state.finished = true;
            if let Source::Piped(pipeline) = &mut state.source {
                if let Err(e) = pipeline.finish().await {
                    tracing::error!(error = %e, "Transcoder failed after streaming started");
                    return Some((Err(e), state));
                }
            }
            if let Some(on_success) = state.on_success.take() {
                on_success.await;
            }
            tracing::debug!("Audio stream completed");
            None
        }
    }
}

impl Stream for AudioStream {
    type Item = Result<Bytes, PipelineError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}
