//! Slack incoming-webhook transport for Herald.

pub mod config;
pub mod error;
pub mod webhook;

pub use config::SlackWebhookConfig;
pub use error::SlackError;
pub use webhook::SlackWebhook;
