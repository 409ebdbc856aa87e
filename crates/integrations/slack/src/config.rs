use std::time::Duration;

/// Default request timeout for webhook delivery.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the Slack incoming-webhook transport.
#[derive(Clone)]
pub struct SlackWebhookConfig {
    /// Incoming-webhook URL. The URL embeds its own credential.
    pub webhook_url: String,

    /// Request timeout for the single delivery attempt.
    pub timeout: Duration,
}

impl std::fmt::Debug for SlackWebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackWebhookConfig")
            .field("webhook_url", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SlackWebhookConfig {
    /// Create a configuration for the given webhook URL.
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
