//! Signed request execution.
//!
//! One call of [`RequestExecutor`] is one HTTP exchange: normalize the body,
//! add the signing headers, sign, send, and wrap the raw response with
//! exactly one [`Outcome`]. Transport failures are returned as `Err`;
//! protocol errors are returned as `Ok` with `Outcome::Failure`. Nothing is
//! retried.

use crate::body::{into_byte_stream, BodyContent, NormalizedBody, RequestBody};
use crate::config::S3Config;
use crate::error::{classify, classify_response, ErrorResult, S3Error};
use crate::signing::{format_datetime, QueryParams, Signer};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Headers the executor sets itself; caller-supplied copies are dropped.
const RESERVED_HEADERS: &[&str] = &[
    "host",
    "x-amz-date",
    "x-amz-content-sha256",
    "x-amz-security-token",
    "authorization",
    "content-length",
];

/// Result of one signed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// 2xx response, parsed.
    Success(T),
    /// HEAD answered 404.
    Absent,
    /// Classified error response.
    Failure(ErrorResult),
}

impl<T> Outcome<T> {
    /// Whether the call succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Whether HEAD reported the resource missing.
    pub fn is_absent(&self) -> bool {
        matches!(self, Outcome::Absent)
    }

    /// The classified error, if any.
    pub fn error(&self) -> Option<&ErrorResult> {
        match self {
            Outcome::Failure(e) => Some(e),
            _ => None,
        }
    }

    /// Convert into a `Result`, treating `Absent` as `None`.
    pub fn into_option(self) -> Result<Option<T>, S3Error> {
        match self {
            Outcome::Success(value) => Ok(Some(value)),
            Outcome::Absent => Ok(None),
            Outcome::Failure(e) => Err(S3Error::Service(e)),
        }
    }

    /// Convert into a `Result`. `Absent` becomes a not-found error.
    pub fn into_result(self) -> Result<T, S3Error> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Absent => Err(S3Error::Service(classify(404, None))),
            Outcome::Failure(e) => Err(S3Error::Service(e)),
        }
    }

    /// Map the success value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Absent => Outcome::Absent,
            Outcome::Failure(e) => Outcome::Failure(e),
        }
    }
}

/// Raw response plus its outcome.
#[derive(Debug, Clone)]
pub struct S3Response<T> {
    /// The response as received.
    pub raw: HttpResponse,
    /// What it means.
    pub result: Outcome<T>,
}

impl<T> S3Response<T> {
    /// See [`Outcome::into_result`].
    pub fn into_result(self) -> Result<T, S3Error> {
        self.result.into_result()
    }

    /// See [`Outcome::into_option`].
    pub fn into_option(self) -> Result<Option<T>, S3Error> {
        self.result.into_option()
    }
}

/// Signed request executor shared by all operations of a client.
pub struct RequestExecutor {
    config: Arc<S3Config>,
    transport: Arc<dyn HttpTransport>,
    signer: Signer,
}

impl RequestExecutor {
    /// Create an executor.
    pub fn new(config: Arc<S3Config>, transport: Arc<dyn HttpTransport>) -> Self {
        let signer = Signer::new(config.credentials.clone(), config.region.clone());
        Self {
            config,
            transport,
            signer,
        }
    }

    /// Client configuration.
    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// The signer requests are signed with.
    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    /// Signed GET, response buffered.
    pub async fn get<T, P>(
        &self,
        path: &str,
        query: &QueryParams,
        headers: Vec<(String, String)>,
        parser: P,
    ) -> Result<S3Response<T>, S3Error>
    where
        P: FnOnce(&HttpResponse) -> Result<T, S3Error>,
    {
        self.execute("GET", path, query, headers, RequestBody::Empty, parser)
            .await
    }

    /// Signed PUT.
    pub async fn put<T, P>(
        &self,
        path: &str,
        query: &QueryParams,
        headers: Vec<(String, String)>,
        body: RequestBody,
        parser: P,
    ) -> Result<S3Response<T>, S3Error>
    where
        P: FnOnce(&HttpResponse) -> Result<T, S3Error>,
    {
        self.execute("PUT", path, query, headers, body, parser).await
    }

    /// Signed POST.
    pub async fn post<T, P>(
        &self,
        path: &str,
        query: &QueryParams,
        headers: Vec<(String, String)>,
        body: RequestBody,
        parser: P,
    ) -> Result<S3Response<T>, S3Error>
    where
        P: FnOnce(&HttpResponse) -> Result<T, S3Error>,
    {
        self.execute("POST", path, query, headers, body, parser)
            .await
    }

    /// Signed DELETE.
    pub async fn delete<T, P>(
        &self,
        path: &str,
        query: &QueryParams,
        headers: Vec<(String, String)>,
        parser: P,
    ) -> Result<S3Response<T>, S3Error>
    where
        P: FnOnce(&HttpResponse) -> Result<T, S3Error>,
    {
        self.execute("DELETE", path, query, headers, RequestBody::Empty, parser)
            .await
    }

    /// Signed HEAD. A 404 yields [`Outcome::Absent`].
    pub async fn head<T, P>(
        &self,
        path: &str,
        query: &QueryParams,
        headers: Vec<(String, String)>,
        parser: P,
    ) -> Result<S3Response<T>, S3Error>
    where
        P: FnOnce(&HttpResponse) -> Result<T, S3Error>,
    {
        self.execute("HEAD", path, query, headers, RequestBody::Empty, parser)
            .await
    }

    /// Signed GET whose body is handed to `on_chunk` as it arrives.
    ///
    /// The callback runs on the task driving the call. Error responses are
    /// buffered for classification and never reach the callback.
    pub async fn get_streaming<F>(
        &self,
        path: &str,
        query: &QueryParams,
        headers: Vec<(String, String)>,
        mut on_chunk: F,
    ) -> Result<S3Response<()>, S3Error>
    where
        F: FnMut(&[u8]) + Send,
    {
        let body = NormalizedBody::empty();
        let request = self.signed_request("GET", path, query, headers, &body, &Utc::now());
        debug!(method = "GET", path = %path, "Sending streamed S3 request");

        let raw = self.transport.send_into(request, &mut on_chunk).await?;
        Ok(self.finish("GET", path, raw, |_| Ok(())))
    }

    /// Execute one signed exchange.
    pub async fn execute<T, P>(
        &self,
        method: &str,
        path: &str,
        query: &QueryParams,
        headers: Vec<(String, String)>,
        body: RequestBody,
        parser: P,
    ) -> Result<S3Response<T>, S3Error>
    where
        P: FnOnce(&HttpResponse) -> Result<T, S3Error>,
    {
        let method = method.to_uppercase();
        let body = body.normalize(self.config.sign_stream_payloads).await?;
        let request = self.signed_request(&method, path, query, headers, &body, &Utc::now());

        debug!(
            method = %method,
            path = %path,
            content_length = body.length,
            unsigned_payload = body.is_unsigned(),
            "Sending S3 request"
        );

        let length = body.length;
        let raw = match body.content {
            BodyContent::Streamed(stream) => {
                self.transport
                    .send_streaming(request, into_byte_stream(stream, length))
                    .await?
            }
            BodyContent::Buffered(_) | BodyContent::Empty => self.transport.send(request).await?,
        };

        Ok(self.finish(&method, path, raw, parser))
    }

    /// Build the signed request for a normalized body.
    ///
    /// `host`, `x-amz-date`, `x-amz-content-sha256` and, with temporary
    /// credentials, `x-amz-security-token` are added and signed along with
    /// every caller header. `content-length` is added after signing and only
    /// for non-empty bodies.
    pub fn signed_request(
        &self,
        method: &str,
        path: &str,
        query: &QueryParams,
        headers: Vec<(String, String)>,
        body: &NormalizedBody,
        timestamp: &DateTime<Utc>,
    ) -> HttpRequest {
        let full_path = self.full_path(path);

        let mut signed_headers: Vec<(String, String)> = headers
            .into_iter()
            .filter(|(name, _)| {
                !RESERVED_HEADERS
                    .iter()
                    .any(|reserved| name.eq_ignore_ascii_case(reserved))
            })
            .collect();
        signed_headers.push(("host".to_string(), self.config.host_header()));
        signed_headers.push(("x-amz-date".to_string(), format_datetime(timestamp)));
        signed_headers.push((
            "x-amz-content-sha256".to_string(),
            body.payload_hash.clone(),
        ));
        if let Some(token) = self.signer.credentials().session_token() {
            signed_headers.push(("x-amz-security-token".to_string(), token.to_string()));
        }

        let authorization = self.signer.sign_headers(
            method,
            &full_path,
            query,
            &signed_headers,
            &body.payload_hash,
            timestamp,
        );

        let canonical_query = query.to_canonical_string();
        let url = if canonical_query.is_empty() {
            format!("{}{}", self.config.origin(), full_path)
        } else {
            format!("{}{}?{}", self.config.origin(), full_path, canonical_query)
        };

        let mut request = HttpRequest::new(method.to_uppercase(), url);
        for (name, value) in signed_headers {
            request.headers.insert(name, value);
        }
        request
            .headers
            .insert("authorization".to_string(), authorization);
        if body.length > 0 {
            request
                .headers
                .insert("content-length".to_string(), body.length.to_string());
        }
        if let BodyContent::Buffered(bytes) = &body.content {
            request.body = Some(bytes.clone());
        }
        request
    }

    fn full_path(&self, path: &str) -> String {
        let full = format!("{}{}", self.config.path_prefix(), path);
        if full.is_empty() {
            "/".to_string()
        } else {
            full
        }
    }

    fn finish<T, P>(&self, method: &str, path: &str, raw: HttpResponse, parser: P) -> S3Response<T>
    where
        P: FnOnce(&HttpResponse) -> Result<T, S3Error>,
    {
        debug!(
            method = %method,
            path = %path,
            status = raw.status,
            content_length = ?raw.content_length(),
            request_id = ?raw.request_id(),
            "S3 request completed"
        );

        let result = if raw.is_success() {
            match parser(&raw) {
                Ok(value) => Outcome::Success(value),
                Err(e) => {
                    let error = unexpected_payload(&raw);
                    warn!(
                        method = %method,
                        path = %path,
                        status = raw.status,
                        code = %error.code,
                        error = %e,
                        "Successful S3 response could not be parsed"
                    );
                    Outcome::Failure(error)
                }
            }
        } else if method == "HEAD" && raw.status == 404 {
            Outcome::Absent
        } else {
            let error = classify_response(&raw);
            warn!(
                method = %method,
                path = %path,
                status = raw.status,
                code = %error.code,
                request_id = ?error.request_id,
                "S3 request failed"
            );
            Outcome::Failure(error)
        };

        S3Response { raw, result }
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Error for a 2xx response the parser rejected.
///
/// An `<Error>` document is classified from its code; anything else is
/// reported as an unexpected payload.
fn unexpected_payload(raw: &HttpResponse) -> ErrorResult {
    if crate::xml::root_element(&raw.text()).as_deref() == Some("Error") {
        return classify_response(raw);
    }

    let mut error = classify(200, None);
    error.status = raw.status;
    error.code = raw.status.to_string();
    error.request_id = raw.request_id().map(str::to_string);
    error
}
