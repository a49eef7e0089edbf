//! Client configuration.
//!
//! `S3Config` is an explicit value handed to each client; nothing is read
//! from process-wide state except through `S3ConfigBuilder::from_env`.

use crate::credentials::AwsCredentials;
use crate::error::{ConfigurationError, S3Error};
use crate::signing::encode_key;
use std::time::Duration;
use url::Url;

/// Default region.
pub const DEFAULT_REGION: &str = "us-east-1";
/// Default connection timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default read timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(300);
/// Default idle connections kept per host.
pub const DEFAULT_MAX_IDLE_CONNECTIONS: usize = 100;
/// Default idle connection timeout.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Configuration for the S3 client.
#[derive(Clone)]
pub struct S3Config {
    /// Region used in the credential scope and the default endpoint.
    pub region: String,

    /// Signing credentials.
    pub credentials: AwsCredentials,

    /// Custom endpoint URL (for S3-compatible services). May carry a path
    /// prefix.
    pub endpoint: Option<Url>,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Read timeout per call.
    pub read_timeout: Duration,

    /// Maximum idle connections per host.
    pub max_idle_connections: usize,

    /// Idle connection timeout.
    pub idle_timeout: Duration,

    /// Verify TLS certificates.
    pub verify_ssl: bool,

    /// Hash seekable stream bodies instead of sending `UNSIGNED-PAYLOAD`.
    pub sign_stream_payloads: bool,

    /// Send `Content-MD5` with buffered part uploads.
    pub part_content_md5: bool,
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("region", &self.region)
            .field("credentials", &self.credentials)
            .field("endpoint", &self.endpoint)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("max_idle_connections", &self.max_idle_connections)
            .field("idle_timeout", &self.idle_timeout)
            .field("verify_ssl", &self.verify_ssl)
            .field("sign_stream_payloads", &self.sign_stream_payloads)
            .field("part_content_md5", &self.part_content_md5)
            .finish()
    }
}

impl S3Config {
    /// Create a new configuration builder.
    pub fn builder() -> S3ConfigBuilder {
        S3ConfigBuilder::default()
    }

    /// Scheme, authority and path prefix of every request, without a
    /// trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}{}", self.origin(), self.path_prefix())
    }

    /// Scheme and authority only.
    pub fn origin(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("{}://{}", endpoint.scheme(), self.host_header()),
            None => format!("https://s3.{}.amazonaws.com", self.region),
        }
    }

    /// Value of the `host` header. Non-default ports are included.
    pub fn host_header(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => {
                let host = endpoint.host_str().unwrap_or_default();
                match endpoint.port() {
                    Some(port) => format!("{}:{}", host, port),
                    None => host.to_string(),
                }
            }
            None => format!("s3.{}.amazonaws.com", self.region),
        }
    }

    /// Path prefix of a custom endpoint, empty when there is none.
    pub fn path_prefix(&self) -> &str {
        self.endpoint
            .as_ref()
            .map(|endpoint| endpoint.path().trim_end_matches('/'))
            .unwrap_or("")
    }

    /// Encoded request path for a bucket.
    pub fn bucket_path(&self, bucket: &str) -> String {
        format!("/{}", encode_key(bucket))
    }

    /// Encoded request path for an object.
    pub fn object_path(&self, bucket: &str, key: &str) -> String {
        format!("/{}/{}", encode_key(bucket), encode_key(key))
    }
}

/// Builder for S3 configuration.
#[derive(Default)]
pub struct S3ConfigBuilder {
    region: Option<String>,
    credentials: Option<AwsCredentials>,
    endpoint: Option<Url>,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    max_idle_connections: Option<usize>,
    idle_timeout: Option<Duration>,
    verify_ssl: Option<bool>,
    sign_stream_payloads: Option<bool>,
    part_content_md5: Option<bool>,
}

impl S3ConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the region.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the credentials.
    pub fn credentials(mut self, credentials: AwsCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set a custom endpoint URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Result<Self, S3Error> {
        self.endpoint = Some(parse_endpoint(&endpoint.into())?);
        Ok(self)
    }

    /// Set a custom endpoint URL (infallible version).
    pub fn endpoint_url(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    pub fn max_idle_connections(mut self, max: usize) -> Self {
        self.max_idle_connections = Some(max);
        self
    }

    /// Set the idle connection timeout.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Enable or disable TLS verification.
    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = Some(verify);
        self
    }

    /// Hash seekable stream bodies before sending them.
    pub fn sign_stream_payloads(mut self, enabled: bool) -> Self {
        self.sign_stream_payloads = Some(enabled);
        self
    }

    /// Send `Content-MD5` with buffered part uploads.
    pub fn part_content_md5(mut self, enabled: bool) -> Self {
        self.part_content_md5 = Some(enabled);
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Values already set on the builder are overridden by variables that
    /// are present. Unparseable numeric values are ignored.
    pub fn from_env(mut self) -> Result<Self, S3Error> {
        if let Ok(region) = std::env::var("AWS_REGION") {
            self.region = Some(region);
        } else if let Ok(region) = std::env::var("AWS_DEFAULT_REGION") {
            self.region = Some(region);
        }

        if let Ok(endpoint) = std::env::var("AWS_ENDPOINT_URL_S3") {
            self.endpoint = Some(parse_endpoint(&endpoint)?);
        } else if let Ok(endpoint) = std::env::var("AWS_ENDPOINT_URL") {
            self.endpoint = Some(parse_endpoint(&endpoint)?);
        }

        if self.credentials.is_none() {
            self.credentials = Some(AwsCredentials::from_env()?);
        }

        if let Some(secs) = env_u64("S3_CONNECT_TIMEOUT_SECS") {
            self.connect_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(secs) = env_u64("S3_READ_TIMEOUT_SECS") {
            self.read_timeout = Some(Duration::from_secs(secs));
        }

        Ok(self)
    }

    /// Build the configuration.
    pub fn build(self) -> Result<S3Config, S3Error> {
        let credentials = self
            .credentials
            .ok_or(S3Error::Configuration(ConfigurationError::MissingCredentials))?;

        let region = self.region.unwrap_or_else(|| DEFAULT_REGION.to_string());
        if region.trim().is_empty() {
            return Err(S3Error::Configuration(
                ConfigurationError::InvalidConfiguration {
                    field: "region".to_string(),
                    message: "Region must not be empty".to_string(),
                },
            ));
        }

        Ok(S3Config {
            region,
            credentials,
            endpoint: self.endpoint,
            connect_timeout: self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            read_timeout: self.read_timeout.unwrap_or(DEFAULT_READ_TIMEOUT),
            max_idle_connections: self
                .max_idle_connections
                .unwrap_or(DEFAULT_MAX_IDLE_CONNECTIONS),
            idle_timeout: self.idle_timeout.unwrap_or(DEFAULT_IDLE_TIMEOUT),
            verify_ssl: self.verify_ssl.unwrap_or(true),
            sign_stream_payloads: self.sign_stream_payloads.unwrap_or(false),
            part_content_md5: self.part_content_md5.unwrap_or(false),
        })
    }
}

fn parse_endpoint(value: &str) -> Result<Url, S3Error> {
    let url = Url::parse(value).map_err(|e| {
        S3Error::Configuration(ConfigurationError::InvalidEndpoint {
            url: value.to_string(),
            details: e.to_string(),
        })
    })?;

    if url.host_str().is_none() {
        return Err(S3Error::Configuration(ConfigurationError::InvalidEndpoint {
            url: value.to_string(),
            details: "endpoint has no host".to_string(),
        }));
    }

    Ok(url)
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
