//! Runs one ffmpeg invocation against staged files.

use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::{Duration, Instant},
};

use {
    tokio::process::Command,
    tracing::{debug, info, warn},
};

use crate::{Error, Result, catalog::PreparedAction};

/// Lifecycle of one edit job. Terminal states are reached in one step from
/// `Invoking`, or from `Validating`/`Staged` when the request is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Validating,
    Staged,
    Invoking,
    Succeeded,
    ToolFailed,
    InvalidInput,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::ToolFailed | Self::InvalidInput)
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Validating, Staged | InvalidInput | ToolFailed)
                | (Staged, Invoking | InvalidInput | ToolFailed)
                | (Invoking, Succeeded | ToolFailed | InvalidInput)
        )
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded { output: PathBuf },
    ToolFailed { diagnostic: String },
    InvalidInput { message: String },
}

impl JobOutcome {
    pub fn state(&self) -> JobState {
        match self {
            Self::Succeeded { .. } => JobState::Succeeded,
            Self::ToolFailed { .. } => JobState::ToolFailed,
            Self::InvalidInput { .. } => JobState::InvalidInput,
        }
    }
}

/// Outcome plus the wall-clock time spent around the tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub outcome: JobOutcome,
    pub elapsed: Duration,
}

impl JobResult {
    pub fn into_result(self) -> Result<(PathBuf, Duration)> {
        match self.outcome {
            JobOutcome::Succeeded { output } => Ok((output, self.elapsed)),
            JobOutcome::ToolFailed { diagnostic } => Err(Error::tool_failure(diagnostic)),
            JobOutcome::InvalidInput { message } => Err(Error::invalid_input(message)),
        }
    }
}

pub const OUTPUT_NOT_PRODUCED: &str = "The processed file could not be created.";

/// Invokes the external tool. Cheap to clone; holds only the executable path.
#[derive(Debug, Clone)]
pub struct JobRunner {
    tool: PathBuf,
}

impl JobRunner {
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self { tool: tool.into() }
    }

    /// Run `action` once, reading `input` and writing `output`. Never retries.
    pub async fn run(&self, input: &Path, output: &Path, action: &PreparedAction) -> JobResult {
        let start = Instant::now();
        let outcome = self.invoke(input, output, action).await;
        let elapsed = start.elapsed();
        info!(
            action = action.spec.name,
            kind = %action.spec.kind,
            state = ?outcome.state(),
            elapsed_ms = elapsed.as_millis() as u64,
            "tool run finished"
        );
        JobResult { outcome, elapsed }
    }

    async fn invoke(&self, input: &Path, output: &Path, action: &PreparedAction) -> JobOutcome {
        if !tokio::fs::try_exists(input).await.unwrap_or(false) {
            return JobOutcome::InvalidInput {
                message: format!("Input file does not exist: {}", input.display()),
            };
        }

        // A stale file at the output path would read as success.
        match tokio::fs::remove_file(output).await {
            Ok(()) => debug!(path = %output.display(), "removed stale output"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(e) => {
                return JobOutcome::ToolFailed {
                    diagnostic: format!("cannot clear output path {}: {e}", output.display()),
                };
            },
        }

        let args = action.tool_args(input, output);
        debug!(tool = %self.tool.display(), ?args, "invoking tool");

        let result = Command::new(&self.tool)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let out = match result {
            Ok(out) => out,
            Err(e) => {
                warn!(tool = %self.tool.display(), error = %e, "failed to start tool");
                return JobOutcome::ToolFailed {
                    diagnostic: format!("failed to start {}: {e}", self.tool.display()),
                };
            },
        };

        if !out.status.success() {
            let diagnostic = String::from_utf8_lossy(&out.stderr).trim_end().to_string();
            warn!(
                exit_code = out.status.code().unwrap_or(-1),
                stderr_len = diagnostic.len(),
                "tool exited with failure"
            );
            return JobOutcome::ToolFailed {
                diagnostic: if diagnostic.is_empty() {
                    format!("exited with {}", out.status)
                } else {
                    diagnostic
                },
            };
        }

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return JobOutcome::ToolFailed {
                diagnostic: OUTPUT_NOT_PRODUCED.to_string(),
            };
        }

        JobOutcome::Succeeded {
            output: output.to_path_buf(),
        }
    }
}
