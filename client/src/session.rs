//! Session credentials issued by the backend at sign-in.
//!
//! The access and refresh tokens are owned by whoever drives the client (a
//! browser cookie jar, the CLI session file, a test) and are passed into
//! every backend call by reference. Nothing in this crate stores them in a
//! global.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::config::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};

/// Access/refresh token pair for one signed-in user.
#[derive(Clone)]
pub struct SessionCredentials {
    access_token: Option<SecretString>,
    refresh_token: Option<SecretString>,
}

impl SessionCredentials {
    /// Builds credentials from a freshly issued token pair.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: non_empty_secret(access_token.into()),
            refresh_token: non_empty_secret(refresh_token.into()),
        }
    }

    /// Credentials carrying only an access token.
    pub fn access_only(access_token: impl Into<String>) -> Self {
        Self {
            access_token: non_empty_secret(access_token.into()),
            refresh_token: None,
        }
    }

    /// No credentials at all. Every authenticated call made with these fails
    /// locally without touching the network.
    pub fn anonymous() -> Self {
        Self {
            access_token: None,
            refresh_token: None,
        }
    }

    /// Parses a `Cookie` header value such as
    /// `access_token=abc; refresh_token=def; theme=dark`.
    ///
    /// Unknown cookies are ignored. Missing tokens leave the corresponding
    /// slot empty.
    pub fn from_cookie_header(header: &str) -> Self {
        let mut access = None;
        let mut refresh = None;

        for pair in header.split(';') {
            let Some((name, value)) = pair.trim().split_once('=') else {
                continue;
            };
            match name.trim() {
                ACCESS_TOKEN_COOKIE => access = non_empty_secret(value.trim().to_string()),
                REFRESH_TOKEN_COOKIE => refresh = non_empty_secret(value.trim().to_string()),
                _ => {}
            }
        }

        Self {
            access_token: access,
            refresh_token: refresh,
        }
    }

    /// The bearer token for authenticated calls, if present.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_ref().map(|s| s.expose_secret().as_str())
    }

    /// The refresh token, if present.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(|s| s.expose_secret().as_str())
    }

    /// Whether an access token is available.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn non_empty_secret(value: String) -> Option<SecretString> {
    if value.is_empty() {
        None
    } else {
        Some(SecretString::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_tokens_from_cookie_header() {
        let creds = SessionCredentials::from_cookie_header(
            "theme=dark; access_token=abc.def; refresh_token=xyz",
        );
        assert_eq!(creds.access_token(), Some("abc.def"));
        assert_eq!(creds.refresh_token(), Some("xyz"));
        assert!(creds.is_authenticated());
    }

    #[test]
    fn empty_cookie_values_are_treated_as_missing() {
        let creds = SessionCredentials::from_cookie_header("access_token=; refresh_token=r");
        assert!(!creds.is_authenticated());
        assert_eq!(creds.refresh_token(), Some("r"));
    }

    #[test]
    fn debug_output_never_contains_tokens() {
        let creds = SessionCredentials::new("super-secret-access", "super-secret-refresh");
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn anonymous_has_nothing() {
        let creds = SessionCredentials::anonymous();
        assert!(creds.access_token().is_none());
        assert!(creds.refresh_token().is_none());
    }
}
