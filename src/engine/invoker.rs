use std::process::Stdio;
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use crate::errors::SweepError;
use crate::models::TargetDescriptor;
use super::args::base_args;
use super::EngineSettings;
use tracing::{debug, trace};

/// Text and status of one engine run.
#[derive(Debug)]
pub struct InvocationResult {
    /// Combined stdout and stderr. Kept on failure for diagnostics.
    pub output: String,
    pub failed: bool,
    pub error: Option<SweepError>,
}

impl InvocationResult {
    pub fn success(output: String) -> Self {
        Self { output, failed: false, error: None }
    }

    pub fn failure(output: String, error: SweepError) -> Self {
        Self { output, failed: true, error: Some(error) }
    }

    /// Human-readable cause, empty on success.
    pub fn error_message(&self) -> String {
        self.error.as_ref().map(|e| e.to_string()).unwrap_or_default()
    }
}

#[async_trait]
pub trait Invoker: Send + Sync {
    /// Run the engine against `target` with the base arguments plus
    /// `extra_args`. Never fails the caller; failures are in the result.
    async fn invoke(&self, target: &TargetDescriptor, extra_args: &[String]) -> InvocationResult;
}

/// Runs sqlmap as a child process.
pub struct SqlmapInvoker {
    settings: EngineSettings,
}

impl SqlmapInvoker {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub fn command_args(&self, target: &TargetDescriptor, extra_args: &[String]) -> Vec<String> {
        let mut args = base_args(&self.settings, target);
        args.extend(extra_args.iter().cloned());
        args
    }
}

#[async_trait]
impl Invoker for SqlmapInvoker {
    async fn invoke(&self, target: &TargetDescriptor, extra_args: &[String]) -> InvocationResult {
        let args = self.command_args(target, extra_args);
        debug!(target = %target.endpoint(), args = ?extra_args, "Invoking engine");

        let mut cmd = Command::new(&self.settings.python);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the future (cancellation, timeout) must not leave sqlmap running
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return InvocationResult::failure(
                    String::new(),
                    SweepError::Invocation(format!(
                        "failed to launch {}: {}",
                        self.settings.python, e
                    )),
                );
            }
        };

        // Buffers live outside the run future so a timeout keeps what was read
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let finished = {
            let run = async {
                let (status, _, _) = tokio::join!(
                    child.wait(),
                    drain(stdout_pipe, &mut stdout),
                    drain(stderr_pipe, &mut stderr),
                );
                status
            };
            match self.settings.timeout {
                Some(limit) => tokio::time::timeout(limit, run).await.ok(),
                None => Some(run.await),
            }
        };

        let Some(status) = finished else {
            let _ = child.kill().await;
            let text = combine(&stdout, &stderr);
            let limit = self.settings.timeout.unwrap_or_default();
            return InvocationResult::failure(
                text,
                SweepError::Timeout(format!(
                    "engine did not finish within {}s",
                    limit.as_secs()
                )),
            );
        };

        let text = combine(&stdout, &stderr);
        trace!(target = %target.endpoint(), bytes = text.len(), "Engine output captured");

        match status {
            Ok(status) if status.success() => InvocationResult::success(text),
            Ok(status) => InvocationResult::failure(
                text,
                SweepError::Invocation(format!("engine exited with {}", status)),
            ),
            Err(e) => InvocationResult::failure(
                text,
                SweepError::Invocation(format!("failed waiting for engine: {}", e)),
            ),
        }
    }
}

/// Read `pipe` to its end into `sink`, chunk by chunk.
async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>, sink: &mut Vec<u8>) {
    let Some(mut pipe) = pipe else {
        return;
    };
    let mut chunk = [0u8; 8192];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => sink.extend_from_slice(&chunk[..n]),
        }
    }
}

/// Stdout followed by stderr, lossily decoded.
fn combine(stdout: &[u8], stderr: &[u8]) -> String {
    let mut text = String::from_utf8_lossy(stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(stderr));
    text
}
