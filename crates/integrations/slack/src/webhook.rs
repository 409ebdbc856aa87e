use herald_core::{Message, Transport, TransportError};
use reqwest::Client;
use tracing::{debug, instrument};

use crate::config::SlackWebhookConfig;
use crate::error::SlackError;

/// Delivers messages to a Slack incoming webhook.
///
/// Each call makes exactly one POST; a non-2xx answer is a failure.
pub struct SlackWebhook {
    config: SlackWebhookConfig,
    client: Client,
}

impl SlackWebhook {
    /// Create a transport with a default `reqwest::Client` using the
    /// configured timeout.
    pub fn new(config: SlackWebhookConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to build HTTP client");
        Self { config, client }
    }

    /// Create a transport with a custom HTTP client.
    pub fn with_client(config: SlackWebhookConfig, client: Client) -> Self {
        Self { config, client }
    }

    async fn post(&self, message: &Message) -> Result<(), SlackError> {
        if self.config.webhook_url.is_empty() {
            return Err(SlackError::InvalidConfig("webhook URL is empty".into()));
        }

        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SlackError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), "webhook accepted message");
        Ok(())
    }
}

impl Transport for SlackWebhook {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "slack"
    }

    #[instrument(skip_all, fields(transport = "slack", attachments = message.attachments.len()))]
    async fn deliver(&self, message: &Message) -> Result<(), TransportError> {
        debug!("posting message to Slack webhook");
        Ok(self.post(message).await?)
    }
}
