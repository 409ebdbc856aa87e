use herald_core::{BuildContext, Message, Transport};
use herald_registry::TemplateRegistry;
use herald_template::{TemplateRenderer, normalize_escaped_quotes};
use tracing::{Instrument, Span, debug, info, info_span};

use crate::config::PluginConfig;
use crate::error::PipelineError;
use crate::resolver::AttachmentResolver;

/// Runs the composition pipeline for one message.
///
/// Every event is emitted inside the composer's span, which callers can
/// replace with [`Composer::with_span`] to attach their own fields.
pub struct Composer<R> {
    registry: R,
    renderer: TemplateRenderer,
    span: Span,
}

impl<R: TemplateRegistry> Composer<R> {
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            renderer: TemplateRenderer::new(),
            span: info_span!("compose"),
        }
    }

    /// Emit pipeline events inside `span`.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Build the final message for `config` against `ctx`.
    ///
    /// Configuration is validated before any file or network access.
    pub async fn compose(&self, config: &PluginConfig, ctx: &BuildContext) -> Result<Message, PipelineError> {
        self.compose_inner(config, ctx)
            .instrument(self.span.clone())
            .await
    }

    /// Compose the message and hand it to `transport` once.
    pub async fn deliver<T: Transport>(
        &self,
        config: &PluginConfig,
        ctx: &BuildContext,
        transport: &T,
    ) -> Result<Message, PipelineError> {
        let message = self.compose(config, ctx).await?;

        async {
            info!(transport = transport.name(), "delivering message");
            transport.deliver(&message).await
        }
        .instrument(self.span.clone())
        .await?;

        Ok(message)
    }

    async fn compose_inner(&self, config: &PluginConfig, ctx: &BuildContext) -> Result<Message, PipelineError> {
        config.validate()?;

        let mut message = config.message.clone();
        if let Some(source) = &config.attachment {
            let attachments = AttachmentResolver::new(&self.registry)
                .resolve(source, ctx)
                .await?;
            debug!(count = attachments.len(), "resolved attachments");
            message.attachments.extend(attachments);
        }

        let serialized = serde_json::to_vec(&message).map_err(PipelineError::Integrity)?;
        let normalized = normalize_escaped_quotes(&serialized);
        let rendered = self
            .renderer
            .render_bytes(&normalized, &ctx.with_escaped_message())?;

        let message: Message = serde_json::from_str(&rendered).map_err(PipelineError::Integrity)?;
        debug!(
            attachments = message.attachments.len(),
            bytes = rendered.len(),
            "composed message"
        );
        Ok(message)
    }
}

impl<R> std::fmt::Debug for Composer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composer")
            .field("renderer", &self.renderer)
            .field("span", &self.span)
            .finish_non_exhaustive()
    }
}
