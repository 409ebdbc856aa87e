use thiserror::Error;

/// Errors raised while parsing a template reference or fetching its
/// contents.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The reference does not follow `host/org/repo/path[@ref]`.
    #[error("invalid template reference {reference:?}: {reason}")]
    InvalidReference { reference: String, reason: String },

    /// An HTTP-level transport error occurred.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The registry answered with a non-success status.
    #[error("registry returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The reference points at something other than a single file.
    #[error("{path} is not a file")]
    NotAFile { path: String },

    /// The file contents could not be decoded.
    #[error("unable to decode template contents: {0}")]
    Decode(String),
}

impl RegistryError {
    pub(crate) fn invalid(reference: &str, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            reference: reference.to_owned(),
            reason: reason.into(),
        }
    }
}
