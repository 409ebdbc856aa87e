use thiserror::Error;

/// Errors surfaced by a [`Transport`](crate::Transport) delivery attempt.
///
/// Delivery is attempted exactly once; none of these are retried.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A network or connection-level failure occurred.
    #[error("connection error: {0}")]
    Connection(String),

    /// The endpoint answered with a non-success status.
    #[error("rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The message could not be encoded for the wire.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The transport was given invalid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = TransportError::Rejected {
            status: 404,
            body: "no_service".into(),
        };
        assert_eq!(err.to_string(), "rejected with HTTP 404: no_service");

        let err = TransportError::Connection("reset".into());
        assert_eq!(err.to_string(), "connection error: reset");
    }
}
