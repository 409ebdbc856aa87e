use tracing::{debug, error, warn};

use crate::directory::Directory;
use crate::users::UserDirectory;

/// Directory attribute holding the account name.
pub const ACCOUNT_ATTRIBUTE: &str = "sAMAccountName";

/// What is known about the build author before enrichment.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorQuery<'a> {
    /// Commit author email; may be empty.
    pub email: &'a str,
    /// Source-control login of the author.
    pub login: &'a str,
    /// Web URL of the build source, used to locate the user API.
    pub build_source: &'a str,
}

/// Resolve the directory account name of the build author.
///
/// Returns an empty string unless the directory is configured. A missing
/// author email is first looked up through `users`. The account name is only
/// returned when exactly one directory entry matches. Every failure is
/// logged and yields an empty string.
pub async fn resolve_author_account<D, U>(directory: &D, users: &U, author: AuthorQuery<'_>) -> String
where
    D: Directory,
    U: UserDirectory,
{
    if !directory.is_configured() {
        debug!("directory credentials not configured, skipping author lookup");
        return String::new();
    }

    let email = if author.email.is_empty() {
        lookup_email(users, author).await
    } else {
        author.email.to_owned()
    };
    if email.is_empty() {
        warn!(login = author.login, "no email address known for build author");
        return String::new();
    }

    let entries = match directory.find_by_email(&email).await {
        Ok(entries) => entries,
        Err(e) => {
            error!(error = %e, "directory lookup failed");
            return String::new();
        }
    };

    match entries.as_slice() {
        [entry] => entry.attribute(ACCOUNT_ATTRIBUTE).unwrap_or_default().to_owned(),
        _ => {
            error!(
                entries = entries.len(),
                "user does not exist or too many entries returned"
            );
            String::new()
        }
    }
}

async fn lookup_email<U: UserDirectory>(users: &U, author: AuthorQuery<'_>) -> String {
    if !users.is_configured() {
        return String::new();
    }
    match users.email_for(author.build_source, author.login).await {
        Ok(email) => email.unwrap_or_default(),
        Err(e) => {
            error!(error = %e, "unable to fetch author email");
            String::new()
        }
    }
}
