use std::future::Future;

use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::UserApiConfig;
use crate::error::IdentityError;

/// A source-control host that can map a login to an email address.
pub trait UserDirectory: Send + Sync {
    /// Whether lookups should be attempted at all.
    fn is_configured(&self) -> bool;

    /// Email address of `login` on the host serving `build_source`. `None`
    /// when the user has no public email.
    fn email_for(
        &self,
        build_source: &str,
        login: &str,
    ) -> impl Future<Output = Result<Option<String>, IdentityError>> + Send;
}

/// User lookups through the GitHub Enterprise REST API.
pub struct GitHubUsers {
    config: UserApiConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    #[serde(default)]
    email: Option<String>,
}

impl GitHubUsers {
    pub fn new(config: UserApiConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(concat!("herald/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");
        Self { config, client }
    }

    pub fn with_client(config: UserApiConfig, client: Client) -> Self {
        Self { config, client }
    }
}

/// `<scheme>://<host[:port]>/api/v3/users/<login>` for the host that
/// serves `build_source`.
pub fn user_url(build_source: &str, login: &str) -> Result<String, IdentityError> {
    let invalid = |reason: &str| IdentityError::InvalidSourceUrl {
        url: build_source.to_owned(),
        reason: reason.to_owned(),
    };
    let url = Url::parse(build_source).map_err(|e| invalid(&e.to_string()))?;
    let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
    let authority = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    };
    Ok(format!("{}://{authority}/api/v3/users/{login}", url.scheme()))
}

impl UserDirectory for GitHubUsers {
    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    #[instrument(skip(self, build_source))]
    async fn email_for(&self, build_source: &str, login: &str) -> Result<Option<String>, IdentityError> {
        let url = user_url(build_source, login)?;
        debug!(%url, "looking up user email");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.username, Some(&self.config.token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let user: UserResponse = response.json().await?;
        Ok(user.email.filter(|email| !email.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    struct MockUserServer {
        listener: tokio::net::TcpListener,
        base_url: String,
    }

    impl MockUserServer {
        async fn start() -> Self {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("failed to bind mock server");
            let port = listener.local_addr().unwrap().port();
            let base_url = format!("http://127.0.0.1:{port}");
            Self { listener, base_url }
        }

        async fn respond_once(self, status_code: u16, body: &str) -> String {
            let (mut stream, _) = self.listener.accept().await.unwrap();

            let mut buf = vec![0u8; 8192];
            let n = stream.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).into_owned();

            let response = format!(
                "HTTP/1.1 {status_code} OK\r\n\
                 Content-Type: application/json\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\
                 \r\n\
                 {body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            request
        }
    }

    #[test]
    fn user_url_keeps_scheme_host_and_port() {
        assert_eq!(
            user_url("https://git.example.com/octo/hello/commit/abc", "octocat").unwrap(),
            "https://git.example.com/api/v3/users/octocat"
        );
        assert_eq!(
            user_url("http://127.0.0.1:8080/o/r", "a").unwrap(),
            "http://127.0.0.1:8080/api/v3/users/a"
        );
    }

    #[test]
    fn user_url_rejects_relative_source() {
        let err = user_url("octo/hello", "a").unwrap_err();
        assert!(matches!(err, IdentityError::InvalidSourceUrl { .. }));
    }

    #[tokio::test]
    async fn returns_email_with_basic_auth() {
        let server = MockUserServer::start().await;
        let source = format!("{}/octo/hello/commit/abc", server.base_url);
        let users = GitHubUsers::new(UserApiConfig::new("bot", "t0ken"));

        let handle = tokio::spawn(async move {
            server
                .respond_once(200, r#"{"login":"octocat","email":"octocat@example.com"}"#)
                .await
        });
        let email = users.email_for(&source, "octocat").await.unwrap();
        let request = handle.await.unwrap();

        assert_eq!(email.as_deref(), Some("octocat@example.com"));
        assert!(request.starts_with("GET /api/v3/users/octocat "), "{request}");
        let credentials = base64::engine::general_purpose::STANDARD.encode("bot:t0ken");
        assert!(
            request
                .to_lowercase()
                .contains(&format!("authorization: basic {}", credentials.to_lowercase())),
            "{request}"
        );
    }

    #[tokio::test]
    async fn null_email_is_none() {
        let server = MockUserServer::start().await;
        let source = server.base_url.clone();
        let users = GitHubUsers::new(UserApiConfig::new("bot", "t"));

        let handle = tokio::spawn(async move {
            server.respond_once(200, r#"{"login":"octocat","email":null}"#).await
        });
        let email = users.email_for(&source, "octocat").await.unwrap();
        handle.await.unwrap();

        assert!(email.is_none());
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockUserServer::start().await;
        let source = server.base_url.clone();
        let users = GitHubUsers::new(UserApiConfig::new("bot", "t"));

        let handle = tokio::spawn(async move {
            server.respond_once(401, r#"{"message":"Bad credentials"}"#).await
        });
        let err = users.email_for(&source, "octocat").await.unwrap_err();
        handle.await.unwrap();

        assert!(matches!(err, IdentityError::UnexpectedStatus { status: 401, .. }));
    }
}
