use std::fmt;

use serde::{Deserialize, Serialize};

/// Build attributes injected by the CI runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub author: String,
    pub author_email: String,
    /// Directory account name resolved for the author, empty when unknown.
    pub author_account: String,
    pub branch: String,
    pub channel: String,
    pub commit: String,
    pub created: i64,
    pub enqueued: i64,
    pub event: String,
    pub finished: i64,
    pub host: String,
    pub link: String,
    pub message: String,
    pub number: i64,
    pub parent: i64,
    pub git_ref: String,
    pub started: i64,
    pub source: String,
    pub tag: String,
    pub title: String,
    pub workspace: String,
}

/// Repository attributes injected by the CI runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub branch: String,
    pub clone: String,
    pub full_name: String,
    pub link: String,
    pub name: String,
    pub org: String,
    pub private: String,
    pub timeout: i64,
    pub trusted: String,
}

/// A single template-visible value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextValue<'a> {
    Text(&'a str),
    Number(i64),
}

impl fmt::Display for ContextValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// The immutable set of build and repository attributes that templates can
/// reference.
///
/// A context is built once per run. Values are only reachable through
/// accessors and [`BuildContext::get`], which resolves the template-visible
/// names (including the legacy `Repo*` aliases of every `Repository*` name).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildContext {
    build: BuildInfo,
    repository: RepositoryInfo,
}

impl BuildContext {
    /// Every name resolvable through [`BuildContext::get`].
    pub const FIELD_NAMES: &'static [&'static str] = &[
        "BuildAuthor",
        "BuildAuthorEmail",
        "BuildAuthorSAMAccountName",
        "BuildBranch",
        "BuildChannel",
        "BuildCommit",
        "BuildCreated",
        "BuildEnqueued",
        "BuildEvent",
        "BuildFinished",
        "BuildHost",
        "BuildLink",
        "BuildMessage",
        "BuildNumber",
        "BuildParent",
        "BuildRef",
        "BuildStarted",
        "BuildSource",
        "BuildTag",
        "BuildTitle",
        "BuildWorkspace",
        "RepositoryBranch",
        "RepoBranch",
        "RepositoryClone",
        "RepoClone",
        "RepositoryFullName",
        "RepoFullName",
        "RepositoryLink",
        "RepoLink",
        "RepositoryName",
        "RepoName",
        "RepositoryOrg",
        "RepoOrg",
        "RepositoryPrivate",
        "RepoPrivate",
        "RepositoryTimeout",
        "RepoTimeout",
        "RepositoryTrusted",
        "RepoTrusted",
    ];

    pub fn new(build: BuildInfo, repository: RepositoryInfo) -> Self {
        Self { build, repository }
    }

    pub fn build(&self) -> &BuildInfo {
        &self.build
    }

    pub fn repository(&self) -> &RepositoryInfo {
        &self.repository
    }

    /// Resolve a template-visible field name.
    ///
    /// Returns `None` only for names that are not part of the context; known
    /// fields always resolve, even when empty.
    pub fn get(&self, name: &str) -> Option<ContextValue<'_>> {
        use ContextValue::{Number, Text};

        let b = &self.build;
        let r = &self.repository;
        let value = match name {
            "BuildAuthor" => Text(&b.author),
            "BuildAuthorEmail" => Text(&b.author_email),
            "BuildAuthorSAMAccountName" => Text(&b.author_account),
            "BuildBranch" => Text(&b.branch),
            "BuildChannel" => Text(&b.channel),
            "BuildCommit" => Text(&b.commit),
            "BuildCreated" => Number(b.created),
            "BuildEnqueued" => Number(b.enqueued),
            "BuildEvent" => Text(&b.event),
            "BuildFinished" => Number(b.finished),
            "BuildHost" => Text(&b.host),
            "BuildLink" => Text(&b.link),
            "BuildMessage" => Text(&b.message),
            "BuildNumber" => Number(b.number),
            "BuildParent" => Number(b.parent),
            "BuildRef" => Text(&b.git_ref),
            "BuildStarted" => Number(b.started),
            "BuildSource" => Text(&b.source),
            "BuildTag" => Text(&b.tag),
            "BuildTitle" => Text(&b.title),
            "BuildWorkspace" => Text(&b.workspace),
            "RepositoryBranch" | "RepoBranch" => Text(&r.branch),
            "RepositoryClone" | "RepoClone" => Text(&r.clone),
            "RepositoryFullName" | "RepoFullName" => Text(&r.full_name),
            "RepositoryLink" | "RepoLink" => Text(&r.link),
            "RepositoryName" | "RepoName" => Text(&r.name),
            "RepositoryOrg" | "RepoOrg" => Text(&r.org),
            "RepositoryPrivate" | "RepoPrivate" => Text(&r.private),
            "RepositoryTimeout" | "RepoTimeout" => Number(r.timeout),
            "RepositoryTrusted" | "RepoTrusted" => Text(&r.trusted),
            _ => return None,
        };
        Some(value)
    }

    /// Returns a copy whose build message has raw newlines replaced with the
    /// two-character `\n` escape.
    ///
    /// Commit messages are the only multi-line field; a raw newline spliced
    /// into a JSON string by the template pass would make the rendered
    /// payload unparsable.
    #[must_use]
    pub fn with_escaped_message(&self) -> Self {
        let mut escaped = self.clone();
        escaped.build.message = self.build.message.replace('\n', "\\n");
        escaped
    }
}
