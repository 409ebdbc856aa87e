//! The Herald message composition pipeline.
//!
//! [`Composer::compose`] turns a validated [`PluginConfig`] and a
//! [`herald_core::BuildContext`] into the final [`herald_core::Message`]:
//!
//! 1. validate the configuration before any I/O
//! 2. resolve the attachment document from a local file or the registry
//! 3. substitute numeric placeholders and parse the attachments
//! 4. append them to the base message and serialize it
//! 5. repair escaped quotes inside directives and render the template
//! 6. parse the rendered payload back into a message
//!
//! [`Composer::deliver`] then hands the result to a
//! [`herald_core::Transport`].

pub mod compose;
pub mod config;
pub mod error;
pub mod resolver;

pub use compose::Composer;
pub use config::{AttachmentSource, PluginConfig};
pub use error::{ErrorKind, PipelineError, ResolutionError};
pub use resolver::AttachmentResolver;
