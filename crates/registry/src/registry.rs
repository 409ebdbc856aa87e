use std::future::Future;

use crate::error::RegistryError;
use crate::source::TemplateSource;

/// A source-controlled store of template documents.
pub trait TemplateRegistry: Send + Sync {
    /// Parse a path-like reference into a [`TemplateSource`].
    fn parse(&self, reference: &str) -> Result<TemplateSource, RegistryError> {
        TemplateSource::parse(reference)
    }

    /// Fetch the raw bytes of the referenced file.
    fn fetch(
        &self,
        source: &TemplateSource,
    ) -> impl Future<Output = Result<Vec<u8>, RegistryError>> + Send;
}

impl<R: TemplateRegistry> TemplateRegistry for &R {
    fn parse(&self, reference: &str) -> Result<TemplateSource, RegistryError> {
        (**self).parse(reference)
    }

    fn fetch(
        &self,
        source: &TemplateSource,
    ) -> impl Future<Output = Result<Vec<u8>, RegistryError>> + Send {
        (**self).fetch(source)
    }
}
