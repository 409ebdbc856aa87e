//! Build author identity resolution for Herald.
//!
//! Resolves the directory account name of the person who triggered a build.
//! The lookup is best effort: every failure is logged and yields an empty
//! account name so that message delivery never depends on it.

pub mod config;
pub mod directory;
pub mod error;
pub mod resolve;
pub mod users;

pub use config::{DirectoryConfig, UserApiConfig};
pub use directory::{Directory, DirectoryEntry, LdapDirectory};
pub use error::IdentityError;
pub use resolve::{AuthorQuery, resolve_author_account};
pub use users::{GitHubUsers, UserDirectory};
