use log::{debug, error, warn};
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::error_handling::types::ToolError;
use crate::process_execution::types::RawToolOutput;

/// Limit applied to the `-v` version probe.
pub const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs the capture tool with a discrete argument vector.
///
/// Implementations must have killed and reaped the process before the
/// returned future resolves, and must also kill it when the future is
/// dropped early.
pub trait ToolRunner: Send + Sync {
    /// Program path, used in error reports.
    fn program(&self) -> &Path;

    fn run(
        &self,
        args: &[String],
        limit: Option<Duration>,
    ) -> impl Future<Output = Result<RawToolOutput, ToolError>> + Send;
}

/// Renders `program args...` for logs and error reports. Arguments with
/// whitespace or quotes are quoted; nothing here is ever executed.
pub fn display_command(program: &Path, args: &[String]) -> String {
    let mut rendered = program.display().to_string();
    for arg in args {
        rendered.push(' ');
        if arg.is_empty() || arg.contains(char::is_whitespace) || arg.contains('"') {
            rendered.push_str(&format!("{:?}", arg));
        } else {
            rendered.push_str(arg);
        }
    }
    rendered
}

/// [`ToolRunner`] backed by a real `tshark` binary.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    program: PathBuf,
}

impl ProcessExecutor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Runs `tshark -v` and returns the first line of its output, trimmed.
    pub async fn probe_version(&self) -> Result<String, ToolError> {
        let output = self
            .run(&["-v".to_string()], Some(VERSION_PROBE_TIMEOUT))
            .await?;
        output
            .stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(String::from)
            .ok_or_else(|| ToolError::ToolUnavailable {
                program: self.program.clone(),
                reason: "version probe printed nothing".to_string(),
            })
    }

    fn spawn_error(&self, command: String, err: std::io::Error) -> ToolError {
        match err.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                error!("Cannot start {}: {}", self.program.display(), err);
                ToolError::ToolUnavailable {
                    program: self.program.clone(),
                    reason: err.to_string(),
                }
            }
            _ => ToolError::ExecutionFailure {
                command,
                stderr: format!("failed to start process: {}", err),
            },
        }
    }

    async fn execute(
        &self,
        args: &[String],
        limit: Option<Duration>,
    ) -> Result<RawToolOutput, ToolError> {
        let command_line = display_command(&self.program, args);
        debug!("Running {}", command_line);

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| self.spawn_error(command_line.clone(), e))?;

        let stdout_reader = child.stdout.take().map(|pipe| tokio::spawn(read_pipe(pipe)));
        let stderr_reader = child.stderr.take().map(|pipe| tokio::spawn(read_pipe(pipe)));

        let waited = match limit {
            Some(limit) => tokio::time::timeout(limit, child.wait()).await.ok(),
            None => Some(child.wait().await),
        };

        let status = match waited {
            Some(status) => status.map_err(|e| ToolError::ExecutionFailure {
                command: command_line.clone(),
                stderr: format!("failed to wait for process: {}", e),
            })?,
            None => {
                let limit = limit.unwrap_or_default();
                // kill() also waits, so the child is reaped before we return
                if let Err(e) = child.kill().await {
                    error!("Cannot kill {}: {}", command_line, e);
                }
                for reader in [stdout_reader, stderr_reader].into_iter().flatten() {
                    reader.abort();
                }
                warn!(
                    "{} exceeded {}s and was killed",
                    command_line,
                    limit.as_secs()
                );
                return Err(ToolError::Timeout {
                    command: command_line,
                    limit,
                });
            }
        };

        let collect_failure = |e: std::io::Error| ToolError::ExecutionFailure {
            command: command_line.clone(),
            stderr: format!("failed to collect process output: {}", e),
        };
        let stdout = collect(stdout_reader).await.map_err(collect_failure)?;
        let stderr = collect(stderr_reader).await.map_err(collect_failure)?;

        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();

        if !status.success() {
            let stderr = match stderr.trim() {
                "" => format!("process exited with {}", status),
                text => text.to_string(),
            };
            warn!("{} failed: {}", command_line, stderr);
            return Err(ToolError::ExecutionFailure {
                command: command_line,
                stderr,
            });
        }

        debug!(
            "{} finished with {} bytes of output",
            command_line,
            stdout.len()
        );
        Ok(RawToolOutput {
            stdout,
            stderr,
            exit_code: status.code(),
        })
    }
}

async fn read_pipe<P: AsyncRead + Unpin>(mut pipe: P) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    pipe.read_to_end(&mut buffer).await?;
    Ok(buffer)
}

async fn collect(
    reader: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
) -> std::io::Result<Vec<u8>> {
    match reader {
        Some(reader) => reader.await.map_err(std::io::Error::other)?,
        None => Ok(Vec::new()),
    }
}

impl ToolRunner for ProcessExecutor {
    fn program(&self) -> &Path {
        &self.program
    }

    fn run(
        &self,
        args: &[String],
        limit: Option<Duration>,
    ) -> impl Future<Output = Result<RawToolOutput, ToolError>> + Send {
        self.execute(args, limit)
    }
}
