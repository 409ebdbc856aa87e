use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use ldap3::{LdapConnAsync, LdapConnSettings, Scope, SearchEntry, ldap_escape};
use native_tls::{Certificate, Protocol, TlsConnector};
use tracing::{debug, instrument, warn};

use crate::config::DirectoryConfig;
use crate::error::IdentityError;

/// Attributes requested for every directory entry.
pub const SEARCH_ATTRIBUTES: [&str; 4] = ["dn", "displayName", "sAMAccountName", "mail"];

/// Default connect timeout for directory connections.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One directory entry returned by a search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub dn: String,
    pub attributes: HashMap<String, Vec<String>>,
}

impl DirectoryEntry {
    /// First value of `name`, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

/// An employee directory searchable by email address.
pub trait Directory: Send + Sync {
    /// Whether lookups should be attempted at all.
    fn is_configured(&self) -> bool;

    /// Every entry whose `mail` attribute equals `email`.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Vec<DirectoryEntry>, IdentityError>> + Send;
}

/// LDAP directory reached over LDAPS with TLS 1.2 or newer.
#[derive(Debug, Clone)]
pub struct LdapDirectory {
    config: DirectoryConfig,
}

impl LdapDirectory {
    pub fn new(config: DirectoryConfig) -> Self {
        Self { config }
    }

    async fn tls_connector(&self) -> Result<TlsConnector, IdentityError> {
        let mut builder = TlsConnector::builder();
        builder.min_protocol_version(Some(Protocol::Tlsv12));

        if let Some(path) = &self.config.ca_cert_path {
            let pem = tokio::fs::read(path)
                .await
                .map_err(|source| IdentityError::CaBundle {
                    path: path.clone(),
                    source,
                })?;
            builder.add_root_certificate(Certificate::from_pem(&pem)?);
        }

        Ok(builder.build()?)
    }
}

impl Directory for LdapDirectory {
    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    #[instrument(skip(self), fields(server = %self.config.server))]
    async fn find_by_email(&self, email: &str) -> Result<Vec<DirectoryEntry>, IdentityError> {
        let connector = self.tls_connector().await?;
        let settings = LdapConnSettings::new()
            .set_connector(connector)
            .set_conn_timeout(self.config.timeout.unwrap_or(DEFAULT_TIMEOUT));

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &self.config.url()).await?;
        ldap3::drive!(conn);

        ldap.simple_bind(&self.config.username, &self.config.password)
            .await?
            .success()?;
        debug!("bound to directory");

        let filter = mail_filter(email);
        let (results, _) = ldap
            .search(
                &self.config.search_base,
                Scope::Subtree,
                &filter,
                SEARCH_ATTRIBUTES.to_vec(),
            )
            .await?
            .success()?;

        let entries: Vec<DirectoryEntry> = results
            .into_iter()
            .map(SearchEntry::construct)
            .map(|entry| DirectoryEntry {
                dn: entry.dn,
                attributes: entry.attrs,
            })
            .collect();
        debug!(entries = entries.len(), "directory search complete");

        if let Err(e) = ldap.unbind().await {
            warn!(error = %e, "failed to unbind from directory");
        }

        Ok(entries)
    }
}

/// `(mail=<email>)` with filter metacharacters escaped.
fn mail_filter(email: &str) -> String {
    format!("(mail={})", ldap_escape(email))
}
