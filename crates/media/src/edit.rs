//! One edit command, end to end: locate, validate, stage, run, reply, clean up.

use std::{io, path::PathBuf, time::Duration};

use {
    tracing::{Instrument, debug, info, info_span, warn},
    trp_channels::CommandContext,
    trp_config::{
        MediaConfig,
        schema::{DEFAULT_HISTORY_WINDOW, DEFAULT_MAX_INPUT_BYTES},
    },
    uuid::Uuid,
};

use crate::{
    Error, Result,
    catalog::prepare,
    kind::MediaKind,
    locator::locate,
    probe::probe,
    runner::{JobRunner, JobState},
    staging::StagingStore,
};

/// A parsed `<kind> <action> [value]` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    pub kind: MediaKind,
    pub action: String,
    pub value: Option<String>,
}

impl EditRequest {
    pub fn new(kind: MediaKind, action: impl Into<String>, value: Option<String>) -> Self {
        Self {
            kind,
            action: action.into(),
            value,
        }
    }
}

/// Shared by every command; holds no per-job state.
#[derive(Debug, Clone)]
pub struct EditService {
    staging: StagingStore,
    runner: JobRunner,
    ffprobe: Option<PathBuf>,
    max_input_bytes: u64,
    history_window: usize,
}

impl EditService {
    pub fn new(staging: StagingStore, runner: JobRunner) -> Self {
        Self {
            staging,
            runner,
            ffprobe: None,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }

    pub fn from_config(config: &MediaConfig) -> io::Result<Self> {
        let staging = StagingStore::open(&config.scratch_dir)?;
        Ok(Self::new(staging, JobRunner::new(&config.ffmpeg_path))
            .with_ffprobe(config.ffprobe_path.clone())
            .with_max_input_bytes(config.max_input_bytes)
            .with_history_window(config.history_window))
    }

    #[must_use]
    pub fn with_ffprobe(mut self, ffprobe: Option<PathBuf>) -> Self {
        self.ffprobe = ffprobe;
        self
    }

    #[must_use]
    pub fn with_max_input_bytes(mut self, max_input_bytes: u64) -> Self {
        self.max_input_bytes = max_input_bytes;
        self
    }

    #[must_use]
    pub fn with_history_window(mut self, history_window: usize) -> Self {
        self.history_window = history_window;
        self
    }

    /// Handle one command. Sends exactly one reply into `ctx`, whatever the
    /// outcome, and leaves nothing behind in the scratch directory.
    pub async fn handle(&self, ctx: &dyn CommandContext, req: &EditRequest) -> Result<Duration> {
        let span = info_span!(
            "edit",
            job_id = %Uuid::new_v4(),
            channel = ctx.channel_type(),
            kind = %req.kind,
            action = %req.action,
        );
        async {
            let (_, result) = self.run_job(ctx, req).await;
            match &result {
                Ok(elapsed) => {
                    info!(elapsed_ms = elapsed.as_millis() as u64, "edit completed");
                },
                Err(e) => {
                    match e {
                        Error::NotFound { .. } | Error::InvalidInput { .. } => {
                            info!(category = e.category(), error = %e, "edit rejected");
                        },
                        _ => warn!(category = e.category(), error = %e, "edit failed"),
                    }
                    if let Err(send) = ctx.reply_text(&e.user_message()).await {
                        warn!(error = %send, "failed to send error reply");
                    }
                },
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Runs the job, leaving the returned state terminal on every path.
    async fn run_job(
        &self,
        ctx: &dyn CommandContext,
        req: &EditRequest,
    ) -> (JobState, Result<Duration>) {
        let mut state = JobState::Validating;
        let result = self.execute(ctx, req, &mut state).await;
        if let Err(e) = &result
            && !state.is_terminal()
        {
            advance(&mut state, failed_state(e));
        }
        (state, result)
    }

    async fn execute(
        &self,
        ctx: &dyn CommandContext,
        req: &EditRequest,
        state: &mut JobState,
    ) -> Result<Duration> {
        let kind = req.kind;

        let located = locate(ctx, self.history_window)
            .await?
            .ok_or(Error::NotFound { kind })?;
        let media = located.media;
        kind.check_extension(&media)?;
        if media.size > self.max_input_bytes {
            return Err(Error::invalid_input(format!(
                "File size exceeds the {} limit.",
                describe_limit(self.max_input_bytes)
            )));
        }
        let action = prepare(kind, &req.action, req.value.as_deref())?;

        let mut scratch = self.staging.scope();
        let staged = scratch
            .stage(ctx, &media, kind, self.max_input_bytes)
            .await?;
        advance(state, JobState::Staged);
        let output = scratch.allocate_output(kind);

        let typing = ctx.start_typing();
        advance(state, JobState::Invoking);
        let runner = self.runner.clone();
        let input = staged.path.clone();
        let task_output = output.clone();
        let joined =
            tokio::spawn(async move { runner.run(&input, &task_output, &action).await }).await;
        drop(typing);
        let result = joined.map_err(|e| Error::tool_failure(format!("tool task aborted: {e}")))?;
        advance(state, result.outcome.state());
        let (output, elapsed) = result.into_result()?;

        let mut note = format!("-# Took {:.2} seconds", elapsed.as_secs_f64());
        if let Some(info) = probe(self.ffprobe.as_deref(), &output).await {
            note.push_str(" · ");
            note.push_str(&info.summary());
        }
        ctx.reply_file(&output, &note)
            .await
            .map_err(|e| Error::staging("failed to send the processed file", e))?;

        scratch.release();
        Ok(elapsed)
    }
}

/// Terminal state for a job that stopped before the tool reported.
fn failed_state(err: &Error) -> JobState {
    match err {
        Error::NotFound { .. } | Error::InvalidInput { .. } => JobState::InvalidInput,
        _ => JobState::ToolFailed,
    }
}

fn advance(state: &mut JobState, next: JobState) {
    debug_assert!(state.can_transition_to(next), "{state:?} -> {next:?}");
    debug!(from = ?state, to = ?next, "job state");
    *state = next;
}

/// `25 MB` for whole mebibytes, two decimals otherwise.
fn describe_limit(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    if bytes % MB == 0 {
        format!("{} MB", bytes / MB)
    } else {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    }
}
