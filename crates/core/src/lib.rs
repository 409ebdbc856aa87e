//! Shared types for Herald: the build context templates read from, the
//! webhook message model, and the transport seam messages are delivered
//! through.

pub mod context;
pub mod error;
pub mod message;
pub mod transport;

pub use context::{BuildContext, BuildInfo, ContextValue, RepositoryInfo};
pub use error::TransportError;
pub use message::{Attachment, AttachmentField, Message};
pub use transport::Transport;
