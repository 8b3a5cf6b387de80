use std::error::Error as StdError;

use crate::kind::MediaKind;

/// Everything that can end an edit without a result file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No attachment anywhere the locator looks. Not a fault.
    #[error("no {kind} file found to edit")]
    NotFound { kind: MediaKind },

    /// The request breaks a rule the user can fix (type, size, action, value).
    #[error("{message}")]
    InvalidInput { message: String },

    /// ffmpeg ran and failed, or exited cleanly without writing output.
    #[error("ffmpeg failed: {diagnostic}")]
    ToolFailure { diagnostic: String },

    /// Download or local IO failed while preparing the job.
    #[error("{context}: {source}")]
    Staging {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn tool_failure(diagnostic: impl Into<String>) -> Self {
        Self::ToolFailure {
            diagnostic: diagnostic.into(),
        }
    }

    #[must_use]
    pub fn staging(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Staging {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Short label for logs.
    pub fn category(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidInput { .. } => "invalid_input",
            Self::ToolFailure { .. } => "tool_failure",
            Self::Staging { .. } => "staging_failure",
        }
    }

    /// The single reply text shown in the conversation.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { kind } => format!("No {kind} file found to edit."),
            Self::InvalidInput { message } => message.clone(),
            Self::ToolFailure { diagnostic } => {
                format!("An error occurred: FFmpeg encountered an error:\n{diagnostic}")
            },
            Self::Staging { context, source } => {
                format!("An error occurred: {context}: {source}")
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
