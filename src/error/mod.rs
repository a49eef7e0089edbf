//! Error types for the S3-compatible client core.
//!
//! Two failure classes are kept strictly apart:
//!
//! - `S3Error` is returned for things that prevent an exchange from being
//!   attempted or completed: bad configuration, bad arguments, transport
//!   failures, local body I/O.
//! - [`ErrorResult`] is the classified protocol error produced when the
//!   service answers with a non-success status. The request executor hands
//!   it back as a value; it only becomes an `S3Error::Service` when the
//!   caller asks for that with `into_result`.

mod mapping;

pub use mapping::{
    classify, classify_response, map_http_status, map_s3_error_code, ErrorCategory, ErrorKind,
    ErrorResult, S3ErrorResponse,
};

use std::time::Duration;
use thiserror::Error;

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum S3Error {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Credential-related errors.
    #[error("Credentials error: {0}")]
    Credentials(#[from] CredentialsError),

    /// Invalid call arguments or misuse of a multipart session.
    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    /// Network and transport errors.
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Response parsing errors.
    #[error("Response error: {0}")]
    Response(#[from] ResponseError),

    /// Request body I/O errors.
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// A classified error answer from the service.
    #[error("Service error: {0}")]
    Service(ErrorResult),
}

impl S3Error {
    /// Returns true if the error is retryable.
    ///
    /// The core never retries; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            S3Error::Network(e) => e.is_retryable(),
            S3Error::Service(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Returns the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            S3Error::Network(NetworkError::Timeout { .. }) => ErrorCategory::Timeout,
            S3Error::Network(_) => ErrorCategory::Network,
            S3Error::Service(e) => e.category(),
            S3Error::Request(_) => ErrorCategory::InvalidRequest,
            S3Error::Credentials(_) => ErrorCategory::Authentication,
            _ => ErrorCategory::Unknown,
        }
    }

    /// Returns the HTTP status code if the service answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            S3Error::Service(e) => Some(e.status),
            _ => None,
        }
    }

    /// Returns the service error code if available.
    pub fn s3_error_code(&self) -> Option<&str> {
        match self {
            S3Error::Service(e) => Some(e.code.as_str()),
            _ => None,
        }
    }

    /// Returns the request ID if available.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            S3Error::Service(e) => e.request_id.as_deref(),
            _ => None,
        }
    }
}

impl From<ErrorResult> for S3Error {
    fn from(result: ErrorResult) -> Self {
        S3Error::Service(result)
    }
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Missing required credentials.
    #[error("Missing credentials: credentials must be specified via config or environment")]
    MissingCredentials,

    /// Invalid endpoint URL.
    #[error("Invalid endpoint URL: {url}")]
    InvalidEndpoint {
        /// The invalid URL.
        url: String,
        /// Details about the validation error.
        details: String,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {field} - {message}")]
    InvalidConfiguration {
        /// The configuration field name.
        field: String,
        /// Error message.
        message: String,
    },
}

/// Credential-related errors.
#[derive(Debug, Error)]
pub enum CredentialsError {
    /// A required environment variable is not set.
    #[error("Credentials not found: {variable} is not set")]
    NotFound {
        /// Name of the missing variable.
        variable: String,
    },

    /// Credentials are invalid.
    #[error("Invalid credentials: {message}")]
    Invalid {
        /// Details about why credentials are invalid.
        message: String,
    },
}

/// Programmer errors: malformed call arguments and session misuse.
#[derive(Debug, Error)]
pub enum RequestError {
    /// General validation error.
    #[error("Validation error: {message}")]
    Validation {
        /// Details about the validation error.
        message: String,
    },

    /// Part number outside `1..=10000`.
    #[error("Invalid part number {part_number}: must be between 1 and 10000")]
    InvalidPartNumber {
        /// The rejected part number.
        part_number: u32,
    },

    /// Multipart session already completed or aborted.
    #[error("Multipart upload '{upload_id}' is already {state}")]
    SessionClosed {
        /// Upload ID of the closed session.
        upload_id: String,
        /// Terminal state of the session.
        state: String,
    },

    /// Unknown canned ACL.
    #[error("Invalid ACL '{value}'")]
    InvalidAcl {
        /// The rejected value.
        value: String,
    },

    /// Unknown storage class.
    #[error("Invalid storage class '{value}'")]
    InvalidStorageClass {
        /// The rejected value.
        value: String,
    },
}

/// Network and transport errors.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Connection failed.
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        /// Error message.
        message: String,
    },

    /// Request timed out.
    #[error("Request timed out after {duration:?}")]
    Timeout {
        /// The timeout duration.
        duration: Duration,
    },

    /// DNS resolution failed.
    #[error("DNS resolution failed for '{host}'")]
    DnsResolutionFailed {
        /// The host that could not be resolved.
        host: String,
    },

    /// TLS/SSL error.
    #[error("TLS error: {message}")]
    TlsError {
        /// Error message.
        message: String,
    },

    /// Connection reset.
    #[error("Connection reset by peer")]
    ConnectionReset,
}

impl NetworkError {
    /// Returns true if the error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            NetworkError::ConnectionFailed { .. }
                | NetworkError::Timeout { .. }
                | NetworkError::ConnectionReset
        )
    }
}

/// Response parsing errors.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// XML parse error.
    #[error("XML parse error: {message}")]
    XmlParseError {
        /// Error message.
        message: String,
    },

    /// Missing required field.
    #[error("Missing required field '{field}' in response")]
    MissingField {
        /// The missing field name.
        field: String,
    },

    /// Document root is not the expected element.
    #[error("Unexpected document root: expected <{expected}>, got <{found}>")]
    UnexpectedRoot {
        /// Expected root element.
        expected: String,
        /// Root element found.
        found: String,
    },
}

/// Request body I/O errors.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Reading or seeking the body source failed.
    #[error("Body I/O failed: {message}")]
    BodyIo {
        /// Error message.
        message: String,
    },

    /// Stream interrupted.
    #[error("Stream interrupted at byte {bytes_transferred}: {message}")]
    StreamInterrupted {
        /// Bytes successfully transferred before interruption.
        bytes_transferred: u64,
        /// Error message.
        message: String,
    },
}

impl From<std::io::Error> for TransferError {
    fn from(err: std::io::Error) -> Self {
        TransferError::BodyIo {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for S3Error {
    fn from(err: std::io::Error) -> Self {
        S3Error::Transfer(err.into())
    }
}
