//! Loads attachment documents and extracts their attachments.

use herald_core::{Attachment, BuildContext};
use herald_registry::TemplateRegistry;
use herald_template::substitute_numeric;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::AttachmentSource;
use crate::error::ResolutionError;

/// The only part of an attachment document that is used. Other message
/// fields in the document are ignored.
#[derive(Debug, Deserialize)]
struct AttachmentDocument {
    #[serde(default)]
    attachments: Vec<Attachment>,
}

/// Reads attachment documents from disk or from a template registry.
#[derive(Debug)]
pub struct AttachmentResolver<'a, R> {
    registry: &'a R,
}

impl<'a, R: TemplateRegistry> AttachmentResolver<'a, R> {
    pub fn new(registry: &'a R) -> Self {
        Self { registry }
    }

    /// Raw bytes of the attachment document.
    pub async fn fetch(&self, source: &AttachmentSource) -> Result<Vec<u8>, ResolutionError> {
        match source {
            AttachmentSource::Local(path) => read_local(path).await,
            AttachmentSource::Remote(reference) => self.fetch_remote(reference).await,
        }
    }

    /// Fetch the document, substitute numeric placeholders and return its
    /// attachments.
    pub async fn resolve(
        &self,
        source: &AttachmentSource,
        ctx: &BuildContext,
    ) -> Result<Vec<Attachment>, ResolutionError> {
        let bytes = self.fetch(source).await?;
        parse_attachments(&bytes, ctx)
    }

    #[instrument(skip(self))]
    async fn fetch_remote(&self, reference: &str) -> Result<Vec<u8>, ResolutionError> {
        let registry_error = |source| ResolutionError::Registry {
            reference: reference.to_owned(),
            source,
        };
        let source = self.registry.parse(reference).map_err(registry_error)?;
        debug!(
            host = %source.host,
            org = %source.org,
            repo = %source.repo,
            path = %source.path,
            "pulling attachment document from registry"
        );
        self.registry.fetch(&source).await.map_err(registry_error)
    }
}

#[instrument]
async fn read_local(path: &std::path::Path) -> Result<Vec<u8>, ResolutionError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ResolutionError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(bytes = bytes.len(), "read attachment document");
    Ok(bytes)
}

/// Substitute numeric placeholders in `document` and parse its
/// `attachments` array.
pub fn parse_attachments(document: &[u8], ctx: &BuildContext) -> Result<Vec<Attachment>, ResolutionError> {
    let text = std::str::from_utf8(document)?;
    let substituted = substitute_numeric(text, ctx);
    let parsed: AttachmentDocument =
        serde_json::from_str(&substituted).map_err(ResolutionError::InvalidDocument)?;
    Ok(parsed.attachments)
}
