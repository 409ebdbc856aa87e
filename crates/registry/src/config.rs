/// The public GitHub host; its API lives on a separate domain.
pub const GITHUB_URL: &str = "https://github.com";

const GITHUB_API_URL: &str = "https://api.github.com";

/// Configuration for a template registry client.
#[derive(Clone)]
pub struct RegistryConfig {
    /// Web URL of the source-control host, e.g. `https://github.com`.
    pub url: String,

    /// Access token sent with every request. Empty for anonymous access.
    pub token: String,

    /// Explicit API base URL. Derived from `url` when unset.
    pub api_base_url: Option<String>,
}

impl std::fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("url", &self.url)
            .field("token", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl RegistryConfig {
    /// Create a configuration for the host at `url`.
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            api_base_url: None,
        }
    }

    /// Override the API base URL (useful for testing).
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// The REST API root: `https://api.github.com` for the public host and
    /// `<url>/api/v3` for enterprise installs.
    pub fn api_base(&self) -> String {
        if let Some(explicit) = &self.api_base_url {
            return explicit.trim_end_matches('/').to_owned();
        }
        let url = self.url.trim_end_matches('/');
        if url == GITHUB_URL {
            GITHUB_API_URL.to_owned()
        } else {
            format!("{url}/api/v3")
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::new(GITHUB_URL, "")
    }
}
