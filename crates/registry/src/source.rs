use std::fmt;
use std::str::FromStr;

use crate::error::RegistryError;

/// A file in a source-controlled template registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    pub host: String,
    pub org: String,
    pub repo: String,
    /// Path of the file inside the repository.
    pub path: String,
    /// Branch, tag or commit; the default branch when `None`.
    pub git_ref: Option<String>,
}

impl TemplateSource {
    /// Parse a `[scheme://]host/org/repo/path/to/file[@ref]` reference.
    pub fn parse(reference: &str) -> Result<Self, RegistryError> {
        let trimmed = reference.trim();
        if trimmed.is_empty() {
            return Err(RegistryError::invalid(reference, "reference is empty"));
        }

        let without_scheme = trimmed
            .split_once("://")
            .map_or(trimmed, |(_, rest)| rest);

        let (location, git_ref) = match without_scheme.split_once('@') {
            Some((_, "")) => {
                return Err(RegistryError::invalid(reference, "ref after '@' is empty"));
            }
            Some((location, git_ref)) => (location, Some(git_ref.to_owned())),
            None => (without_scheme, None),
        };

        let mut parts = location.splitn(4, '/');
        let (Some(host), Some(org), Some(repo), Some(path)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(RegistryError::invalid(
                reference,
                "expected host/org/repo/path",
            ));
        };

        if [host, org, repo].iter().any(|s| s.is_empty()) || path.split('/').any(str::is_empty) {
            return Err(RegistryError::invalid(reference, "empty path segment"));
        }

        Ok(Self {
            host: host.to_owned(),
            org: org.to_owned(),
            repo: repo.to_owned(),
            path: path.to_owned(),
            git_ref,
        })
    }
}

impl FromStr for TemplateSource {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.host, self.org, self.repo, self.path)?;
        if let Some(git_ref) = &self.git_ref {
            write!(f, "@{git_ref}")?;
        }
        Ok(())
    }
}
