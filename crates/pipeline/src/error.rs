use std::fmt;
use std::path::PathBuf;

use herald_core::TransportError;
use herald_registry::RegistryError;
use herald_template::TemplateError;
use thiserror::Error;

/// Broad class of a pipeline failure. Every class is terminal for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing destination or nothing to send; detected before any I/O.
    Configuration,
    /// The attachment document could not be read, fetched or parsed.
    Resolution,
    /// The template could not be parsed or evaluated.
    Template,
    /// The rendered payload is not a valid message.
    Integrity,
    /// Delivery failed.
    Transport,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Configuration => "configuration",
            Self::Resolution => "resolution",
            Self::Template => "template",
            Self::Integrity => "integrity",
            Self::Transport => "transport",
        })
    }
}

/// Why an attachment document could not be resolved.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("unable to read attachment file {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid attachment source {reference:?}: {source}")]
    Registry {
        reference: String,
        #[source]
        source: RegistryError,
    },

    #[error("attachment document is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("invalid attachment document: {0}")]
    InvalidDocument(#[source] serde_json::Error),
}

/// Errors produced by the composition pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("rendered message is not valid JSON: {0}")]
    Integrity(#[source] serde_json::Error),

    #[error("delivery failed: {0}")]
    Transport(#[from] TransportError),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Resolution(_) => ErrorKind::Resolution,
            Self::Template(_) => ErrorKind::Template,
            Self::Integrity(_) => ErrorKind::Integrity,
            Self::Transport(_) => ErrorKind::Transport,
        }
    }
}
