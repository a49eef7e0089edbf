//! HTTP transport layer.
//!
//! The executor only ever talks to [`HttpTransport`]; the reqwest-backed
//! implementation is the default and tests substitute a mock.

use crate::config::S3Config;
use crate::error::{NetworkError, S3Error, TransferError};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::HashMap;
use std::time::Duration;

/// Request body stream of known length.
pub type ByteStream =
    Box<dyn futures::Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync + Unpin>;

/// Per-chunk callback for streamed response bodies.
pub type ChunkCallback<'a> = &'a mut (dyn FnMut(&[u8]) + Send);

/// HTTP request to be sent.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: String,
    /// Request URL.
    pub url: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Buffered request body.
    pub body: Option<Bytes>,
}

impl HttpRequest {
    /// Create a new HTTP request.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Set the request body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Get a header value by name (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP response received.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body. Empty for streamed successful GETs.
    pub body: Bytes,
}

impl HttpResponse {
    /// Create a response with no headers.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the response indicates a client error (4xx status).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if the response indicates a server error (5xx status).
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Get a header value by name (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get the AWS request ID from response headers.
    pub fn request_id(&self) -> Option<&str> {
        self.get_header("x-amz-request-id")
    }

    /// Get the content length.
    pub fn content_length(&self) -> Option<u64> {
        self.get_header("content-length").and_then(|v| v.parse().ok())
    }

    /// Get the content type.
    pub fn content_type(&self) -> Option<&str> {
        self.get_header("content-type")
    }

    /// Get the ETag.
    pub fn etag(&self) -> Option<&str> {
        self.get_header("etag")
    }

    /// Body as UTF-8 text, lossily decoded.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// HTTP transport trait for making requests.
///
/// Implementations must be safe to share between concurrent calls.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request with a buffered body and buffer the response.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, S3Error>;

    /// Send a request whose body is streamed from `body_stream`.
    async fn send_streaming(
        &self,
        request: HttpRequest,
        body_stream: ByteStream,
    ) -> Result<HttpResponse, S3Error>;

    /// Send a request and hand a successful response body to `on_chunk`
    /// piece by piece. Non-2xx bodies are buffered into the returned
    /// response instead and `on_chunk` is not called.
    async fn send_into(
        &self,
        request: HttpRequest,
        on_chunk: ChunkCallback<'_>,
    ) -> Result<HttpResponse, S3Error>;
}

/// Default HTTP transport using reqwest.
pub struct ReqwestTransport {
    client: reqwest::Client,
    read_timeout: Duration,
}

impl ReqwestTransport {
    /// Create a new transport with default settings.
    pub fn new() -> Result<Self, S3Error> {
        Self::builder().build()
    }

    /// Create a transport configured from client settings.
    pub fn from_config(config: &S3Config) -> Result<Self, S3Error> {
        Self::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .pool_max_idle_per_host(config.max_idle_connections)
            .pool_idle_timeout(Some(config.idle_timeout))
            .verify_ssl(config.verify_ssl)
            .build()
    }

    /// Create a transport builder.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::new()
    }

    fn request_builder(&self, request: &HttpRequest) -> Result<reqwest::RequestBuilder, S3Error> {
        let method = request.method.parse::<reqwest::Method>().map_err(|e| {
            S3Error::Network(NetworkError::ConnectionFailed {
                message: format!("Invalid HTTP method: {}", e),
            })
        })?;

        let mut req_builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            req_builder = req_builder.header(name, value);
        }
        Ok(req_builder)
    }

    fn map_send_error(&self, e: reqwest::Error) -> S3Error {
        if e.is_timeout() {
            S3Error::Network(NetworkError::Timeout {
                duration: self.read_timeout,
            })
        } else {
            S3Error::Network(NetworkError::ConnectionFailed {
                message: e.to_string(),
            })
        }
    }

    fn collect_headers(response: &reqwest::Response) -> HashMap<String, String> {
        response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect()
    }

    async fn read_response(&self, response: reqwest::Response) -> Result<HttpResponse, S3Error> {
        let status = response.status().as_u16();
        let headers = Self::collect_headers(&response);

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                S3Error::Network(NetworkError::Timeout {
                    duration: self.read_timeout,
                })
            } else {
                S3Error::Network(NetworkError::ConnectionFailed {
                    message: format!("Failed to read response body: {}", e),
                })
            }
        })?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, S3Error> {
        let mut req_builder = self.request_builder(&request)?;
        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        let response = req_builder.send().await.map_err(|e| self.map_send_error(e))?;
        self.read_response(response).await
    }

    async fn send_streaming(
        &self,
        request: HttpRequest,
        body_stream: ByteStream,
    ) -> Result<HttpResponse, S3Error> {
        let req_builder = self
            .request_builder(&request)?
            .body(reqwest::Body::wrap_stream(body_stream));

        let response = req_builder.send().await.map_err(|e| self.map_send_error(e))?;
        self.read_response(response).await
    }

    async fn send_into(
        &self,
        request: HttpRequest,
        on_chunk: ChunkCallback<'_>,
    ) -> Result<HttpResponse, S3Error> {
        let mut req_builder = self.request_builder(&request)?;
        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        let response = req_builder.send().await.map_err(|e| self.map_send_error(e))?;
        if !response.status().is_success() {
            return self.read_response(response).await;
        }

        let status = response.status().as_u16();
        let headers = Self::collect_headers(&response);

        let mut received: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                S3Error::Transfer(TransferError::StreamInterrupted {
                    bytes_transferred: received,
                    message: e.to_string(),
                })
            })?;
            received += chunk.len() as u64;
            on_chunk(&chunk);
        }

        Ok(HttpResponse {
            status,
            headers,
            body: Bytes::new(),
        })
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport").finish_non_exhaustive()
    }
}

/// Builder for reqwest transport.
pub struct ReqwestTransportBuilder {
    connect_timeout: Duration,
    read_timeout: Duration,
    pool_max_idle_per_host: usize,
    pool_idle_timeout: Option<Duration>,
    verify_ssl: bool,
    user_agent: String,
}

impl ReqwestTransportBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            connect_timeout: crate::config::DEFAULT_CONNECT_TIMEOUT,
            read_timeout: crate::config::DEFAULT_READ_TIMEOUT,
            pool_max_idle_per_host: crate::config::DEFAULT_MAX_IDLE_CONNECTIONS,
            pool_idle_timeout: Some(crate::config::DEFAULT_IDLE_TIMEOUT),
            verify_ssl: true,
            user_agent: format!("s3-compat-integration/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the maximum idle connections per host.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Set the idle connection timeout.
    pub fn pool_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set whether to verify SSL certificates.
    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<ReqwestTransport, S3Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.read_timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .pool_idle_timeout(self.pool_idle_timeout)
            .danger_accept_invalid_certs(!self.verify_ssl)
            .user_agent(&self.user_agent)
            .no_gzip()
            .build()
            .map_err(|e| {
                S3Error::Network(NetworkError::TlsError {
                    message: e.to_string(),
                })
            })?;

        Ok(ReqwestTransport {
            client,
            read_timeout: self.read_timeout,
        })
    }
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}
