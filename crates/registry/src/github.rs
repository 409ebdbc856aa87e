use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::registry::TemplateRegistry;
use crate::source::TemplateSource;

/// Registry backed by the GitHub (or GitHub Enterprise) contents API.
pub struct GitHubRegistry {
    config: RegistryConfig,
    client: Client,
}

/// The subset of a contents API object needed to recover file bytes.
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    encoding: String,
    #[serde(default)]
    content: String,
}

impl GitHubRegistry {
    /// Create a registry client with a default `reqwest::Client`.
    pub fn new(config: RegistryConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(concat!("herald/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");
        Self { config, client }
    }

    /// Create a registry client with a custom HTTP client.
    pub fn with_client(config: RegistryConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn contents_url(&self, source: &TemplateSource) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_base(),
            source.org,
            source.repo,
            source.path
        )
    }
}

impl TemplateRegistry for GitHubRegistry {
    #[instrument(skip(self, source), fields(host = %source.host, org = %source.org, repo = %source.repo, path = %source.path))]
    async fn fetch(&self, source: &TemplateSource) -> Result<Vec<u8>, RegistryError> {
        let url = self.contents_url(source);
        debug!("fetching template from registry");

        let mut request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github.v3+json");
        if let Some(git_ref) = &source.git_ref {
            request = request.query(&[("ref", git_ref)]);
        }
        if !self.config.token.is_empty() {
            request = request.header(
                reqwest::header::AUTHORIZATION,
                format!("token {}", self.config.token),
            );
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let contents: ContentsResponse = response.json().await?;
        if contents.kind != "file" {
            return Err(RegistryError::NotAFile {
                path: source.path.clone(),
            });
        }
        let bytes = decode_contents(&contents)?;

        debug!(bytes = bytes.len(), "fetched template");
        Ok(bytes)
    }
}

fn decode_contents(contents: &ContentsResponse) -> Result<Vec<u8>, RegistryError> {
    match contents.encoding.as_str() {
        "base64" => {
            let packed: String = contents
                .content
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect();
            STANDARD
                .decode(packed)
                .map_err(|e| RegistryError::Decode(e.to_string()))
        }
        "" | "utf-8" => Ok(contents.content.clone().into_bytes()),
        other => Err(RegistryError::Decode(format!("unsupported encoding {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    /// A minimal mock HTTP server that answers one request and hands back
    /// the raw request text.
    struct MockRegistryServer {
        listener: tokio::net::TcpListener,
        base_url: String,
    }

    impl MockRegistryServer {
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

    fn source(git_ref: Option<&str>) -> TemplateSource {
        TemplateSource {
            host: "github.com".into(),
            org: "octo".into(),
            repo: "templates".into(),
            path: "slack/build.json".into(),
            git_ref: git_ref.map(str::to_owned),
        }
    }

    fn registry(server: &MockRegistryServer, token: &str) -> GitHubRegistry {
        let config = RegistryConfig::new("https://github.com", token).with_api_base_url(&server.base_url);
        GitHubRegistry::new(config)
    }

    #[tokio::test]
    async fn fetch_decodes_base64_contents() {
        let server = MockRegistryServer::start().await;
        let registry = registry(&server, "s3cret");

        let document = r#"{"attachments":[{"title":"{{ .BuildNumber }}"}]}"#;
        let encoded = STANDARD.encode(document);
        // The API wraps base64 content at 60 columns.
        let (head, tail) = encoded.split_at(20);
        let body = format!(r#"{{"type":"file","encoding":"base64","content":"{head}\n{tail}"}}"#);

        let handle = tokio::spawn(async move { server.respond_once(200, &body).await });
        let bytes = registry.fetch(&source(Some("v1"))).await.unwrap();
        let request = handle.await.unwrap();

        assert_eq!(bytes, document.as_bytes());
        assert!(
            request.starts_with("GET /repos/octo/templates/contents/slack/build.json?ref=v1 "),
            "{request}"
        );
        assert!(request.to_lowercase().contains("authorization: token s3cret"));
    }

    #[tokio::test]
    async fn empty_token_sends_no_authorization() {
        let server = MockRegistryServer::start().await;
        let registry = registry(&server, "");

        let body = r#"{"type":"file","encoding":"base64","content":"e30="}"#;
        let handle = tokio::spawn(async move { server.respond_once(200, body).await });
        let bytes = registry.fetch(&source(None)).await.unwrap();
        let request = handle.await.unwrap();

        assert_eq!(bytes, b"{}");
        assert!(request.starts_with("GET /repos/octo/templates/contents/slack/build.json "));
        assert!(!request.to_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn not_found_is_unexpected_status() {
        let server = MockRegistryServer::start().await;
        let registry = registry(&server, "t");

        let handle = tokio::spawn(async move {
            server.respond_once(404, r#"{"message":"Not Found"}"#).await
        });
        let err = registry.fetch(&source(None)).await.unwrap_err();
        handle.await.unwrap();

        match err {
            RegistryError::UnexpectedStatus { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("Not Found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn directory_listing_is_not_a_file() {
        let server = MockRegistryServer::start().await;
        let registry = registry(&server, "t");

        let handle = tokio::spawn(async move {
            server
                .respond_once(200, r#"{"type":"dir","content":""}"#)
                .await
        });
        let err = registry.fetch(&source(None)).await.unwrap_err();
        handle.await.unwrap();

        assert!(matches!(err, RegistryError::NotAFile { .. }));
    }

    #[test]
    fn invalid_base64_is_a_decode_error() {
        let contents = ContentsResponse {
            kind: "file".into(),
            encoding: "base64".into(),
            content: "!!!".into(),
        };
        assert!(matches!(
            decode_contents(&contents),
            Err(RegistryError::Decode(_))
        ));
    }

    #[test]
    fn default_parse_uses_reference_grammar() {
        let registry = GitHubRegistry::new(RegistryConfig::default());
        let parsed = registry.parse("github.com/octo/templates/build.json").unwrap();
        assert_eq!(parsed.repo, "templates");
        assert!(registry.parse("testdata/build.json").is_err());
    }
}
