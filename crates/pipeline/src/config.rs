use std::path::PathBuf;

use herald_core::Message;

use crate::error::PipelineError;

/// Where the attachment document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentSource {
    /// A file on the local filesystem.
    Local(PathBuf),
    /// A `host/org/repo/path[@ref]` reference into the template registry.
    Remote(String),
}

impl AttachmentSource {
    /// Select a source from the configured path and the `remote` flag.
    /// An empty path means no attachment document.
    pub fn select(path: &str, remote: bool) -> Option<Self> {
        let path = path.trim();
        if path.is_empty() {
            None
        } else if remote {
            Some(Self::Remote(path.to_owned()))
        } else {
            Some(Self::Local(PathBuf::from(path)))
        }
    }
}

/// Everything the pipeline needs besides the build context.
#[derive(Clone, Default)]
pub struct PluginConfig {
    /// Incoming-webhook URL the message is delivered to.
    pub webhook: String,
    /// Base message fields set from configuration.
    pub message: Message,
    pub attachment: Option<AttachmentSource>,
}

impl std::fmt::Debug for PluginConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginConfig")
            .field("webhook", &"[REDACTED]")
            .field("message", &self.message)
            .field("attachment", &self.attachment)
            .finish()
    }
}

impl PluginConfig {
    pub fn new(webhook: impl Into<String>, message: Message) -> Self {
        Self {
            webhook: webhook.into(),
            message,
            attachment: None,
        }
    }

    #[must_use]
    pub fn with_attachment(mut self, source: AttachmentSource) -> Self {
        self.attachment = Some(source);
        self
    }

    /// Check that there is a destination and something to send.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.webhook.trim().is_empty() {
            return Err(PipelineError::Configuration("no webhook provided".into()));
        }
        if self.message.text.is_empty() && self.attachment.is_none() {
            return Err(PipelineError::Configuration(
                "must provide text, filepath, or both".into(),
            ));
        }
        Ok(())
    }
}
