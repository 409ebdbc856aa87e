use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the identity collaborators.
///
/// None of these abort a run; [`crate::resolve_author_account`] logs them
/// and falls back to an empty account name.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The CA bundle could not be read.
    #[error("unable to read CA bundle {}: {source}", path.display())]
    CaBundle {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TLS setup failed.
    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    /// The directory connection, bind or search failed.
    #[error("directory error: {0}")]
    Directory(#[from] ldap3::LdapError),

    /// An HTTP-level transport error occurred.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The build source is not a usable URL.
    #[error("invalid build source URL {url:?}: {reason}")]
    InvalidSourceUrl { url: String, reason: String },

    /// The user API answered with a non-success status.
    #[error("user API returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}
