use std::path::PathBuf;
use std::time::Duration;

/// Connection settings for the LDAP directory.
#[derive(Clone, Default)]
pub struct DirectoryConfig {
    pub server: String,
    pub port: String,
    /// Bind DN or user principal.
    pub username: String,
    pub password: String,
    pub search_base: String,
    /// PEM bundle of trusted CAs. The system trust store is used when unset.
    pub ca_cert_path: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("search_base", &self.search_base)
            .field("ca_cert_path", &self.ca_cert_path)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl DirectoryConfig {
    /// Create a configuration for `server:port`.
    pub fn new(server: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            port: port.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    #[must_use]
    pub fn with_search_base(mut self, base: impl Into<String>) -> Self {
        self.search_base = base.into();
        self
    }

    #[must_use]
    pub fn with_ca_cert_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Lookups only run when both bind credentials are present.
    pub fn is_configured(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// `ldaps://server:port`.
    pub fn url(&self) -> String {
        format!("ldaps://{}:{}", self.server, self.port)
    }
}

/// Credentials for the source-control user API.
#[derive(Clone, Default)]
pub struct UserApiConfig {
    pub username: String,
    pub token: String,
}

impl std::fmt::Debug for UserApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserApiConfig")
            .field("username", &self.username)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl UserApiConfig {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }

    /// Lookups only run when both credentials are present.
    pub fn is_configured(&self) -> bool {
        !self.username.is_empty() && !self.token.is_empty()
    }
}
