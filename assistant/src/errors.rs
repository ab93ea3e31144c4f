//! Error types for the assistant gateway

use thiserror::Error;

/// Errors surfaced by assistant calls.
///
/// `Unavailable` means the feature cannot run at all in this session
/// (typically no API key was provided at login); callers degrade the
/// assistant feature and keep the rest of the application working.
/// Everything else is a per-request failure the caller may retry after
/// showing the message. Nothing here retries on its own.
#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("assistant unavailable: {0}")]
    Unavailable(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("completion API error {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("failed to parse completion response: {0}")]
    Parse(String),

    #[error("completion stream error: {0}")]
    Stream(String),

    #[error("prompt template error: {0}")]
    Template(String),
}

impl AssistantError {
    /// True when the assistant cannot run in this session at all, as
    /// opposed to a single request failing.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, AssistantError>;
