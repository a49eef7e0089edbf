//! Access credentials for the signing core.
//!
//! Credentials are fixed for the lifetime of a client. They are validated
//! once, when constructed, so signing itself never fails on missing keys.

use crate::error::CredentialsError;
use secrecy::{ExposeSecret, SecretString};
use std::env;
use std::fmt;

/// Environment variable holding the access key id.
pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
/// Environment variable holding the secret access key.
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
/// Environment variable holding an optional session token.
pub const AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";

/// Access key pair plus optional session token.
#[derive(Clone)]
pub struct AwsCredentials {
    access_key_id: String,
    secret_access_key: SecretString,
    session_token: Option<SecretString>,
}

impl AwsCredentials {
    /// Create long-term credentials.
    ///
    /// Fails when either the key id or the secret is empty.
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Result<Self, CredentialsError> {
        let access_key_id = access_key_id.into();
        let secret_access_key = secret_access_key.into();

        if access_key_id.trim().is_empty() {
            return Err(CredentialsError::Invalid {
                message: "access key id must not be empty".to_string(),
            });
        }
        if secret_access_key.trim().is_empty() {
            return Err(CredentialsError::Invalid {
                message: "secret access key must not be empty".to_string(),
            });
        }

        Ok(Self {
            access_key_id,
            secret_access_key: SecretString::new(secret_access_key),
            session_token: None,
        })
    }

    /// Create temporary credentials carrying a session token.
    pub fn with_session_token(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Result<Self, CredentialsError> {
        let mut credentials = Self::new(access_key_id, secret_access_key)?;
        let token = session_token.into();
        if !token.is_empty() {
            credentials.session_token = Some(SecretString::new(token));
        }
        Ok(credentials)
    }

    /// Load credentials from `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`
    /// and the optional `AWS_SESSION_TOKEN`.
    pub fn from_env() -> Result<Self, CredentialsError> {
        let access_key_id = env::var(AWS_ACCESS_KEY_ID).map_err(|_| CredentialsError::NotFound {
            variable: AWS_ACCESS_KEY_ID.to_string(),
        })?;
        let secret_access_key =
            env::var(AWS_SECRET_ACCESS_KEY).map_err(|_| CredentialsError::NotFound {
                variable: AWS_SECRET_ACCESS_KEY.to_string(),
            })?;

        match env::var(AWS_SESSION_TOKEN) {
            Ok(token) => Self::with_session_token(access_key_id, secret_access_key, token),
            Err(_) => Self::new(access_key_id, secret_access_key),
        }
    }

    /// Get the access key ID.
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Get the secret access key.
    ///
    /// Only the signer should call this; the value is HMAC input and must
    /// never be logged.
    pub(crate) fn secret_access_key(&self) -> &str {
        self.secret_access_key.expose_secret()
    }

    /// Get the session token, if any.
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_ref().map(|s| s.expose_secret().as_str())
    }

    /// Check if credentials are temporary (have a session token).
    pub fn is_temporary(&self) -> bool {
        self.session_token.is_some()
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_credentials() {
        let creds = AwsCredentials::new("AKID", "SECRET").unwrap();
        assert_eq!(creds.access_key_id(), "AKID");
        assert_eq!(creds.secret_access_key(), "SECRET");
        assert!(creds.session_token().is_none());
        assert!(!creds.is_temporary());
    }

    #[test]
    fn test_empty_keys_rejected() {
        assert!(matches!(
            AwsCredentials::new("", "SECRET"),
            Err(CredentialsError::Invalid { .. })
        ));
        assert!(matches!(
            AwsCredentials::new("AKID", "  "),
            Err(CredentialsError::Invalid { .. })
        ));
    }

    #[test]
    fn test_session_token() {
        let creds = AwsCredentials::with_session_token("AKID", "SECRET", "TOKEN").unwrap();
        assert_eq!(creds.session_token(), Some("TOKEN"));
        assert!(creds.is_temporary());

        let creds = AwsCredentials::with_session_token("AKID", "SECRET", "").unwrap();
        assert!(creds.session_token().is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = AwsCredentials::with_session_token("AKID", "SUPERSECRET", "TOKEN").unwrap();
        let debug = format!("{:?}", creds);
        assert!(debug.contains("AKID"));
        assert!(!debug.contains("SUPERSECRET"));
        assert!(!debug.contains("TOKEN\""));
        assert!(debug.contains("[REDACTED]"));
    }
}
