//! Herald CLI
//!
//! A CI pipeline step that renders a build notification and posts it to a
//! Slack incoming webhook.

mod logging;
mod settings;

use anyhow::Context;
use clap::Parser;
use herald_core::BuildContext;
use herald_identity::{AuthorQuery, GitHubUsers, LdapDirectory, resolve_author_account};
use herald_pipeline::Composer;
use herald_registry::GitHubRegistry;
use herald_slack::{SlackWebhook, SlackWebhookConfig};
use tracing::{info, info_span};

use crate::settings::Settings;

const DOCS_URL: &str = concat!(env!("CARGO_PKG_REPOSITORY"), "#readme");

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let mut settings = Settings::parse();
    settings.apply_fallbacks(|name| std::env::var(name).ok());
    logging::init(settings.log_level());

    info!(
        code = env!("CARGO_PKG_REPOSITORY"),
        docs = DOCS_URL,
        version = env!("CARGO_PKG_VERSION"),
        "Herald Slack plugin"
    );

    let config = settings.plugin_config()?;
    config.validate()?;

    let ctx = build_context(&settings).await?;
    let span = info_span!(
        "notify",
        repo = %ctx.repository().full_name,
        build = ctx.build().number,
    );

    let registry = GitHubRegistry::new(settings.registry_config());
    let transport = SlackWebhook::new(SlackWebhookConfig::new(config.webhook.clone()));

    Composer::new(registry)
        .with_span(span)
        .deliver(&config, &ctx, &transport)
        .await
        .context("failed to send Slack message")?;

    info!("message delivered");
    Ok(())
}

/// Build the template context, enriching the author with their directory
/// account when lookups are configured.
async fn build_context(settings: &Settings) -> anyhow::Result<BuildContext> {
    let mut build = settings.build_info()?;
    let repository = settings.repository_info()?;

    let directory = LdapDirectory::new(settings.directory_config());
    let users = GitHubUsers::new(settings.user_api_config());
    let author = AuthorQuery {
        email: &build.author_email,
        login: &build.author,
        build_source: &build.source,
    };
    let account = resolve_author_account(&directory, &users, author).await;
    build.author_account = account;

    Ok(BuildContext::new(build, repository))
}
