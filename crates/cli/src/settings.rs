//! Command-line and environment settings.
//!
//! Every parameter can be given as a flag or through its primary
//! environment variable (both handled by clap). Missing values then fall
//! back to alias environment variables and finally to the first readable
//! parameter or secret file mounted under `/vela`.

use std::path::Path;

use anyhow::{Context, bail};
use clap::{Args, Parser};
use herald_core::{BuildInfo, Message, RepositoryInfo};
use herald_identity::{DirectoryConfig, UserApiConfig};
use herald_pipeline::{AttachmentSource, PluginConfig};
use herald_registry::RegistryConfig;
use herald_registry::config::GITHUB_URL;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Parameter and secret files for `<dir>/<name>`, in lookup order.
macro_rules! vela_files {
    ($dir:literal, $name:literal) => {
        &[
            concat!("/vela/parameters/", $dir, "/", $name),
            concat!("/vela/secrets/", $dir, "/", $name),
        ]
    };
}

/// Herald: post templated build notifications to Slack.
#[derive(Parser)]
#[command(name = "herald", version, about)]
pub struct Settings {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long = "log.level", env = "PARAMETER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// PEM bundle of CAs trusted for the directory connection.
    #[arg(long = "sslcert.path", env = "PARAMETER_SSL_CERT_FILE")]
    pub ssl_cert_path: Option<String>,

    #[command(flatten)]
    pub slack: SlackArgs,

    #[command(flatten)]
    pub build: BuildArgs,

    #[command(flatten)]
    pub repo: RepoArgs,

    #[command(flatten)]
    pub identity: IdentityArgs,
}

#[derive(Args)]
pub struct SlackArgs {
    /// Attachment document: a local path, or a registry reference with `--remote`.
    #[arg(long, env = "PARAMETER_FILEPATH")]
    pub filepath: Option<String>,

    /// Slack incoming-webhook URL.
    #[arg(long, env = "PARAMETER_WEBHOOK")]
    pub webhook: Option<String>,

    #[arg(long = "slack-username", env = "PARAMETER_USERNAME")]
    pub username: Option<String>,

    #[arg(long, env = "PARAMETER_ICON_EMOJI")]
    pub icon_emoji: Option<String>,

    #[arg(long, env = "PARAMETER_ICON_URL")]
    pub icon_url: Option<String>,

    #[arg(long, env = "PARAMETER_CHANNEL")]
    pub channel: Option<String>,

    /// Parent message timestamp to reply in a thread.
    #[arg(long, env = "PARAMETER_THREAD_TS")]
    pub thread_ts: Option<String>,

    /// Message text; may contain template directives.
    #[arg(long, env = "PARAMETER_TEXT")]
    pub text: Option<String>,

    #[arg(long, env = "PARAMETER_PARSE")]
    pub parse: Option<String>,

    /// Treat `--filepath` as a registry reference.
    #[arg(long, env = "PARAMETER_REMOTE")]
    pub remote: Option<String>,

    /// Web URL of the template registry host.
    #[arg(long, env = "PARAMETER_REGISTRY_URL")]
    pub registry_url: Option<String>,

    /// Registry access token.
    #[arg(long, env = "PARAMETER_TOKEN")]
    pub token: Option<String>,
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    #[arg(id = "build-author", long = "build-author", env = "VELA_BUILD_AUTHOR")]
    pub author: Option<String>,
    #[arg(id = "build-author-email", long = "build-author-email", env = "VELA_BUILD_AUTHOR_EMAIL")]
    pub author_email: Option<String>,
    #[arg(id = "build-branch", long = "build-branch", env = "VELA_BUILD_BRANCH")]
    pub branch: Option<String>,
    #[arg(id = "build-channel", long = "build-channel", env = "VELA_BUILD_CHANNEL")]
    pub channel: Option<String>,
    #[arg(id = "build-commit", long = "build-commit", env = "VELA_BUILD_COMMIT")]
    pub commit: Option<String>,
    #[arg(id = "build-created", long = "build-created", env = "VELA_BUILD_CREATED")]
    pub created: Option<String>,
    #[arg(id = "build-enqueued", long = "build-enqueued", env = "VELA_BUILD_ENQUEUED")]
    pub enqueued: Option<String>,
    #[arg(id = "build-event", long = "build-event", env = "VELA_BUILD_EVENT")]
    pub event: Option<String>,
    #[arg(id = "build-finished", long = "build-finished", env = "VELA_BUILD_FINISHED")]
    pub finished: Option<String>,
    #[arg(id = "build-host", long = "build-host", env = "VELA_BUILD_HOST")]
    pub host: Option<String>,
    #[arg(id = "build-link", long = "build-link", env = "VELA_BUILD_LINK")]
    pub link: Option<String>,
    #[arg(id = "build-message", long = "build-message", env = "VELA_BUILD_MESSAGE")]
    pub message: Option<String>,
    #[arg(id = "build-number", long = "build-number", env = "VELA_BUILD_NUMBER")]
    pub number: Option<String>,
    #[arg(id = "build-parent", long = "build-parent", env = "VELA_BUILD_PARENT")]
    pub parent: Option<String>,
    #[arg(id = "build-ref", long = "build-ref", env = "VELA_BUILD_REF")]
    pub git_ref: Option<String>,
    #[arg(id = "build-started", long = "build-started", env = "VELA_BUILD_STARTED")]
    pub started: Option<String>,
    #[arg(id = "build-source", long = "build-source", env = "VELA_BUILD_SOURCE")]
    pub source: Option<String>,
    #[arg(id = "build-tag", long = "build-tag", env = "VELA_BUILD_TAG")]
    pub tag: Option<String>,
    #[arg(id = "build-title", long = "build-title", env = "VELA_BUILD_TITLE")]
    pub title: Option<String>,
    #[arg(id = "build-workspace", long = "build-workspace", env = "VELA_BUILD_WORKSPACE")]
    pub workspace: Option<String>,
}

#[derive(Args, Debug)]
pub struct RepoArgs {
    #[arg(id = "repo-branch", long = "repo-branch", env = "VELA_REPO_BRANCH")]
    pub branch: Option<String>,
    #[arg(id = "repo-clone", long = "repo-clone", env = "VELA_REPO_CLONE")]
    pub clone: Option<String>,
    #[arg(id = "repo-full-name", long = "repo-full-name", env = "VELA_REPO_FULL_NAME")]
    pub full_name: Option<String>,
    #[arg(id = "repo-link", long = "repo-link", env = "VELA_REPO_LINK")]
    pub link: Option<String>,
    #[arg(id = "repo-name", long = "repo-name", env = "VELA_REPO_NAME")]
    pub name: Option<String>,
    #[arg(id = "repo-org", long = "repo-org", env = "VELA_REPO_ORG")]
    pub org: Option<String>,
    #[arg(id = "repo-private", long = "repo-private", env = "VELA_REPO_PRIVATE")]
    pub private: Option<String>,
    #[arg(id = "repo-timeout", long = "repo-timeout", env = "VELA_REPO_TIMEOUT")]
    pub timeout: Option<String>,
    #[arg(id = "repo-trusted", long = "repo-trusted", env = "VELA_REPO_TRUSTED")]
    pub trusted: Option<String>,
}

/// Credentials for build author enrichment. All optional.
#[derive(Args)]
pub struct IdentityArgs {
    #[arg(long, env = "PARAMETER_LDAP_USERNAME")]
    pub ldap_username: Option<String>,
    #[arg(long, env = "PARAMETER_LDAP_PASSWORD")]
    pub ldap_password: Option<String>,
    #[arg(long, env = "PARAMETER_LDAP_SERVER")]
    pub ldap_server: Option<String>,
    #[arg(long, env = "PARAMETER_LDAP_PORT")]
    pub ldap_port: Option<String>,
    #[arg(long, env = "PARAMETER_LDAP_SEARCH_BASE")]
    pub ldap_search_base: Option<String>,
    #[arg(long, env = "PARAMETER_GITHUB_ACCESS_TOKEN")]
    pub github_access_token: Option<String>,
    #[arg(long, env = "PARAMETER_GITHUB_USERNAME")]
    pub github_username: Option<String>,
}

impl Settings {
    /// Fill every unset parameter from its alias environment variables,
    /// then from its parameter and secret files.
    pub fn apply_fallbacks<E>(&mut self, env: E)
    where
        E: Fn(&str) -> Option<String>,
    {
        let env = &env;

        fill(&mut self.log_level, &["SLACK_LOG_LEVEL"], vela_files!("slack", "log_level"), env);
        fill(&mut self.ssl_cert_path, &["SSL_CERT_FILE"], vela_files!("sslcert", "filepath"), env);

        let s = &mut self.slack;
        fill(&mut s.filepath, &["SLACK_FILEPATH"], vela_files!("slack", "filepath"), env);
        fill(&mut s.webhook, &["SLACK_WEBHOOK"], vela_files!("slack", "webhook"), env);
        fill(&mut s.username, &["SLACK_USERNAME"], vela_files!("slack", "username"), env);
        fill(&mut s.icon_emoji, &["SLACK_ICON_EMOJI"], vela_files!("slack", "icon_emoji"), env);
        fill(&mut s.icon_url, &["SLACK_ICON_URL"], vela_files!("slack", "icon_url"), env);
        fill(&mut s.channel, &["SLACK_CHANNEL"], vela_files!("slack", "channel"), env);
        fill(&mut s.thread_ts, &["SLACK_THREAD_TS"], vela_files!("slack", "thread_ts"), env);
        fill(&mut s.text, &["SLACK_TEXT"], vela_files!("slack", "text"), env);
        fill(&mut s.parse, &["SLACK_PARSE"], vela_files!("slack", "parse"), env);
        fill(&mut s.remote, &["SLACK_REMOTE"], &[], env);
        fill(&mut s.registry_url, &["SLACK_REGISTRY_URL"], &[], env);
        fill(&mut s.token, &["VELA_NETRC_PASSWORD"], vela_files!("slack", "token"), env);

        let b = &mut self.build;
        fill(&mut b.author, &["BUILD_AUTHOR"], &[], env);
        fill(&mut b.author_email, &["BUILD_AUTHOR_EMAIL"], &[], env);
        fill(&mut b.branch, &["BUILD_BRANCH"], &[], env);
        fill(&mut b.channel, &["BUILD_CHANNEL"], &[], env);
        fill(&mut b.commit, &["BUILD_COMMIT"], &[], env);
        fill(&mut b.created, &["BUILD_CREATED"], &[], env);
        fill(&mut b.enqueued, &["BUILD_ENQUEUED"], &[], env);
        fill(&mut b.event, &["BUILD_EVENT"], &[], env);
        fill(&mut b.finished, &["BUILD_FINISHED"], &[], env);
        fill(&mut b.host, &["BUILD_HOST"], &[], env);
        fill(&mut b.link, &["BUILD_LINK"], &[], env);
        fill(&mut b.message, &["BUILD_MESSAGE"], &[], env);
        fill(&mut b.number, &["BUILD_NUMBER"], &[], env);
        fill(&mut b.parent, &["BUILD_PARENT"], &[], env);
        fill(&mut b.git_ref, &["BUILD_REF"], &[], env);
        fill(&mut b.started, &["BUILD_STARTED"], &[], env);
        fill(&mut b.source, &["BUILD_SOURCE"], &[], env);
        fill(&mut b.tag, &["BUILD_TAG"], &[], env);
        fill(&mut b.title, &["BUILD_TITLE"], &[], env);
        fill(&mut b.workspace, &["BUILD_WORKSPACE"], &[], env);

        let r = &mut self.repo;
        fill(&mut r.branch, &["REPOSITORY_BRANCH"], &[], env);
        fill(&mut r.clone, &["REPOSITORY_CLONE"], &[], env);
        fill(&mut r.full_name, &["REPOSITORY_FULL_NAME"], &[], env);
        fill(&mut r.link, &["REPOSITORY_LINK"], &[], env);
        fill(&mut r.name, &["REPOSITORY_NAME"], &[], env);
        fill(&mut r.org, &["REPOSITORY_ORG"], &[], env);
        fill(&mut r.private, &["REPOSITORY_PRIVATE"], &[], env);
        fill(&mut r.timeout, &["REPOSITORY_TIMEOUT"], &[], env);
        fill(&mut r.trusted, &["REPOSITORY_TRUSTED"], &[], env);

        let i = &mut self.identity;
        fill(&mut i.ldap_username, &["LDAP_USERNAME"], vela_files!("ldap", "username"), env);
        fill(&mut i.ldap_password, &["LDAP_PASSWORD"], vela_files!("ldap", "password"), env);
        fill(&mut i.ldap_server, &["LDAP_SERVER"], vela_files!("ldap", "server"), env);
        fill(&mut i.ldap_port, &["LDAP_PORT"], vela_files!("ldap", "port"), env);
        fill(&mut i.ldap_search_base, &["LDAP_SEARCH_BASE"], vela_files!("ldap", "searchbase"), env);
        fill(&mut i.github_access_token, &["GITHUB_ACCESS_TOKEN"], vela_files!("github", "token"), env);
        fill(&mut i.github_username, &["GITHUB_USERNAME"], vela_files!("github", "username"), env);
    }

    pub fn log_level(&self) -> &str {
        non_empty(self.log_level.as_deref()).unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn plugin_config(&self) -> anyhow::Result<PluginConfig> {
        let s = &self.slack;
        let message = Message {
            username: text(s.username.as_deref()),
            icon_emoji: text(s.icon_emoji.as_deref()),
            icon_url: text(s.icon_url.as_deref()),
            channel: text(s.channel.as_deref()),
            thread_timestamp: text(s.thread_ts.as_deref()),
            text: text(s.text.as_deref()),
            parse: text(s.parse.as_deref()),
            attachments: Vec::new(),
        };

        let remote = boolean("remote", s.remote.as_deref())?;
        let config = PluginConfig::new(text(s.webhook.as_deref()), message);
        Ok(
            match AttachmentSource::select(s.filepath.as_deref().unwrap_or_default(), remote) {
                Some(source) => config.with_attachment(source),
                None => config,
            },
        )
    }

    pub fn build_info(&self) -> anyhow::Result<BuildInfo> {
        let b = &self.build;
        Ok(BuildInfo {
            author: text(b.author.as_deref()),
            author_email: text(b.author_email.as_deref()),
            author_account: String::new(),
            branch: text(b.branch.as_deref()),
            channel: text(b.channel.as_deref()),
            commit: text(b.commit.as_deref()),
            created: integer("build-created", b.created.as_deref())?,
            enqueued: integer("build-enqueued", b.enqueued.as_deref())?,
            event: text(b.event.as_deref()),
            finished: integer("build-finished", b.finished.as_deref())?,
            host: text(b.host.as_deref()),
            link: text(b.link.as_deref()),
            message: text(b.message.as_deref()),
            number: integer("build-number", b.number.as_deref())?,
            parent: integer("build-parent", b.parent.as_deref())?,
            git_ref: text(b.git_ref.as_deref()),
            started: integer("build-started", b.started.as_deref())?,
            source: text(b.source.as_deref()),
            tag: text(b.tag.as_deref()),
            title: text(b.title.as_deref()),
            workspace: text(b.workspace.as_deref()),
        })
    }

    pub fn repository_info(&self) -> anyhow::Result<RepositoryInfo> {
        let r = &self.repo;
        Ok(RepositoryInfo {
            branch: text(r.branch.as_deref()),
            clone: text(r.clone.as_deref()),
            full_name: text(r.full_name.as_deref()),
            link: text(r.link.as_deref()),
            name: text(r.name.as_deref()),
            org: text(r.org.as_deref()),
            private: text(r.private.as_deref()),
            timeout: integer("repo-timeout", r.timeout.as_deref())?,
            trusted: text(r.trusted.as_deref()),
        })
    }

    pub fn registry_config(&self) -> RegistryConfig {
        let url = non_empty(self.slack.registry_url.as_deref()).unwrap_or(GITHUB_URL);
        RegistryConfig::new(url, text(self.slack.token.as_deref()))
    }

    pub fn directory_config(&self) -> DirectoryConfig {
        let i = &self.identity;
        let config = DirectoryConfig::new(text(i.ldap_server.as_deref()), text(i.ldap_port.as_deref()))
            .with_credentials(text(i.ldap_username.as_deref()), text(i.ldap_password.as_deref()))
            .with_search_base(text(i.ldap_search_base.as_deref()));
        match non_empty(self.ssl_cert_path.as_deref()) {
            Some(path) => config.with_ca_cert_path(path),
            None => config,
        }
    }

    pub fn user_api_config(&self) -> UserApiConfig {
        let i = &self.identity;
        UserApiConfig::new(
            text(i.github_username.as_deref()),
            text(i.github_access_token.as_deref()),
        )
    }
}

fn fill<E>(slot: &mut Option<String>, aliases: &[&str], files: &[&str], env: &E)
where
    E: Fn(&str) -> Option<String>,
{
    if non_empty(slot.as_deref()).is_some() {
        return;
    }
    let found = aliases
        .iter()
        .filter_map(|name| env(name))
        .find(|value| !value.is_empty())
        .or_else(|| files.iter().find_map(|path| read_param_file(Path::new(path))));
    if found.is_some() {
        *slot = found;
    }
}

/// Trimmed contents of a mounted parameter file, if readable and non-empty.
fn read_param_file(path: &Path) -> Option<String> {
    let contents = std::fs::read_to_string(path).ok()?;
    let trimmed = contents.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn text(value: Option<&str>) -> String {
    value.unwrap_or_default().to_owned()
}

/// Unset or empty means zero.
fn integer(name: &str, value: Option<&str>) -> anyhow::Result<i64> {
    match non_empty(value.map(str::trim)) {
        None => Ok(0),
        Some(v) => v
            .parse()
            .with_context(|| format!("invalid integer {v:?} for {name}")),
    }
}

/// Accepts the usual spellings of true and false; unset means false.
fn boolean(name: &str, value: Option<&str>) -> anyhow::Result<bool> {
    match value.map(str::trim).unwrap_or_default() {
        "" | "0" | "f" | "F" | "false" | "False" | "FALSE" => Ok(false),
        "1" | "t" | "T" | "true" | "True" | "TRUE" => Ok(true),
        other => bail!("invalid boolean {other:?} for {name}"),
    }
}
