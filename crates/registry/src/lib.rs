//! Remote template registry for Herald.
//!
//! Attachment documents can live in a source-controlled repository and be
//! referenced as `host/org/repo/path/to/file.json[@ref]`. This crate parses
//! such references into a [`TemplateSource`] and fetches the file contents
//! through a [`TemplateRegistry`]; [`GitHubRegistry`] is the implementation
//! backed by the GitHub contents API.

pub mod config;
pub mod error;
pub mod github;
pub mod registry;
pub mod source;

pub use config::RegistryConfig;
pub use error::RegistryError;
pub use github::GitHubRegistry;
pub use registry::TemplateRegistry;
pub use source::TemplateSource;
