use herald_core::TransportError;
use thiserror::Error;

/// Errors specific to the Slack webhook transport.
///
/// These are converted into [`TransportError`] at the public API boundary.
#[derive(Debug, Error)]
pub enum SlackError {
    /// An HTTP-level transport error occurred.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The webhook answered with a non-2xx status.
    #[error("Slack webhook returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The webhook URL is missing or malformed.
    #[error("invalid webhook configuration: {0}")]
    InvalidConfig(String),
}

impl From<SlackError> for TransportError {
    fn from(err: SlackError) -> Self {
        match err {
            SlackError::Http(e) if e.is_builder() => TransportError::Configuration(e.to_string()),
            SlackError::Http(e) => TransportError::Connection(e.to_string()),
            SlackError::UnexpectedStatus { status, body } => TransportError::Rejected { status, body },
            SlackError::InvalidConfig(msg) => TransportError::Configuration(msg),
        }
    }
}
