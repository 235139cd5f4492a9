use std::collections::VecDeque;
use std::process::Stdio;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};

use crate::error::PipelineError;

/// Lines of stderr kept per process for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// Last lines written to a child's stderr.
///
/// Draining stderr continuously also keeps a chatty tool from blocking on a full pipe.
#[derive(Clone, Default)]
struct StderrTail {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl StderrTail {
    fn drain(stderr: ChildStderr, tool: &'static str) -> Self {
        let tail = Self::default();
        let lines = tail.lines.clone();
        tokio::spawn(async move {
            let mut reader = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                tracing::trace!(tool, line = %line, "stderr");
                if let Ok(mut lines) = lines.lock() {
                    if lines.len() == STDERR_TAIL_LINES {
                        lines.pop_front();
                    }
                    lines.push_back(line);
                }
            }
        });
        tail
    }

    fn snapshot(&self) -> String {
        self.lines
            .lock()
            .map(|lines| lines.iter().cloned().collect::<Vec<_>>().join("\n"))
            .unwrap_or_default()
    }
}

/// Two processes where the upstream's stdout is the downstream's stdin.
///
/// The pipe between them is created by the OS; no bytes pass through this process.
/// Both children are killed when the pipeline is dropped.
pub struct ProcessPipeline {
    upstream: Child,
    downstream: Child,
    upstream_tool: &'static str,
    downstream_tool: &'static str,
    output: Option<ChildStdout>,
    upstream_stderr: StderrTail,
    downstream_stderr: StderrTail,
}

impl ProcessPipeline {
    /// Spawn `upstream` then `downstream`, overriding their standard streams.
    ///
    /// If the downstream fails to start the already running upstream is killed.
    pub fn spawn(
        mut upstream: Command,
        upstream_tool: &'static str,
        mut downstream: Command,
        downstream_tool: &'static str,
    ) -> Result<Self, PipelineError> {
        upstream
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let mut upstream_child = upstream.spawn().map_err(|source| PipelineError::Spawn {
            tool: upstream_tool,
            source,
        })?;

        let upstream_stdout = upstream_child
            .stdout
            .take()
            .ok_or(PipelineError::Pipe(upstream_tool))?;
        let handoff: Stdio = upstream_stdout.try_into().map_err(PipelineError::Handoff)?;

        downstream
            .stdin(handoff)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let mut downstream_child = downstream.spawn().map_err(|source| PipelineError::Spawn {
            tool: downstream_tool,
            source,
        })?;

        let output = downstream_child
            .stdout
            .take()
            .ok_or(PipelineError::Pipe(downstream_tool))?;

        let upstream_stderr = upstream_child
            .stderr
            .take()
            .map(|stderr| StderrTail::drain(stderr, upstream_tool))
            .unwrap_or_default();
        let downstream_stderr = downstream_child
            .stderr
            .take()
            .map(|stderr| StderrTail::drain(stderr, downstream_tool))
            .unwrap_or_default();

        tracing::debug!(
            upstream = ?upstream_child.id(),
            downstream = ?downstream_child.id(),
            "Process pipeline started"
        );

        Ok(Self {
            upstream: upstream_child,
            downstream: downstream_child,
            upstream_tool,
            downstream_tool,
            output: Some(output),
            upstream_stderr,
            downstream_stderr,
        })
    }

    pub fn upstream_id(&self) -> Option<u32> {
        self.upstream.id()
    }

    pub fn downstream_id(&self) -> Option<u32> {
        self.downstream.id()
    }

    /// The downstream's stdout. Available once.
    pub fn take_output(&mut self) -> Option<ChildStdout> {
        self.output.take()
    }

    /// Wait for the downstream, then the upstream.
    ///
    /// Only a downstream failure is an error. An upstream failure after the
    /// downstream succeeded is logged and ignored.
    pub async fn finish(&mut self) -> Result<(), PipelineError> {
        let status = self
            .downstream
            .wait()
            .await
            .map_err(PipelineError::Read)?;
        if !status.success() {
            let stderr = self.downstream_stderr.snapshot();
            tracing::error!(tool = self.downstream_tool, %status, stderr = %stderr, "Process failed");
            return Err(PipelineError::ToolFailed {
                tool: self.downstream_tool,
                status: status.to_string(),
                stderr,
            });
        }

        match self.upstream.wait().await {
            Ok(status) if status.success() => {}
            Ok(status) => tracing::warn!(
                tool = self.upstream_tool,
                %status,
                stderr = %self.upstream_stderr.snapshot(),
                "Upstream process failed after downstream succeeded"
            ),
            Err(e) => tracing::warn!(
                tool = self.upstream_tool,
                error = %e,
                "Failed to wait for upstream process"
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    fn sh(script: &str) -> Command {
        let mut command = Command::new("sh");
        command.args(["-c", script]);
        command
    }

    #[tokio::test]
    async fn test_upstream_output_reaches_downstream() {
        let mut pipeline =
            ProcessPipeline::spawn(sh("printf 'hello'"), "upstream", sh("tr a-z A-Z"), "downstream")
                .unwrap();
        let mut output = pipeline.take_output().unwrap();
        assert!(pipeline.take_output().is_none());

        let mut collected = String::new();
        output.read_to_string(&mut collected).await.unwrap();
        assert_eq!(collected, "HELLO");
        pipeline.finish().await.unwrap();
    }

    #[tokio::test]
    async fn test_downstream_failure_is_reported_with_stderr() {
        let mut pipeline = ProcessPipeline::spawn(
            sh("printf 'data'"),
            "upstream",
            sh("cat >/dev/null; echo 'bad input' >&2; exit 3"),
            "downstream",
        )
        .unwrap();
        let mut output = pipeline.take_output().unwrap();
        let mut sink = Vec::new();
        output.read_to_end(&mut sink).await.unwrap();

        // Let the stderr drain task catch up
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        match pipeline.finish().await {
            Err(PipelineError::ToolFailed { tool, stderr, .. }) => {
                assert_eq!(tool, "downstream");
                assert!(stderr.contains("bad input"));
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_upstream_failure_is_ignored() {
        let mut pipeline =
            ProcessPipeline::spawn(sh("printf 'x'; exit 1"), "upstream", sh("cat"), "downstream")
                .unwrap();
        let mut output = pipeline.take_output().unwrap();
        let mut sink = Vec::new();
        output.read_to_end(&mut sink).await.unwrap();
        assert_eq!(sink, b"x");
        pipeline.finish().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_downstream_binary() {
        let result = ProcessPipeline::spawn(
            sh("sleep 5"),
            "upstream",
            Command::new("/nonexistent/melody-transcoder"),
            "downstream",
        );
        assert!(matches!(
            result,
            Err(PipelineError::Spawn {
                tool: "downstream",
                ..
            })
        ));
    }
}
