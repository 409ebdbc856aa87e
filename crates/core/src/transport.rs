use crate::error::TransportError;
use crate::message::Message;

/// Delivers a fully rendered [`Message`] to its destination.
///
/// Uses native `async fn` in traits, so implementations are statically
/// dispatched. A transport makes a single attempt per call.
pub trait Transport: Send + Sync {
    /// Short name used in log fields.
    fn name(&self) -> &str;

    /// Deliver the message once.
    fn deliver(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;
}

