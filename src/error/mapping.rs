//! Classification of service error answers.
//!
//! A non-success response is turned into an [`ErrorResult`] in two steps:
//! the provider `Code` from the XML body is looked up in a fixed table, and
//! when no code is available the HTTP status decides. Classification never
//! fails; an unreadable body simply takes the status path.

use crate::transport::HttpResponse;
use std::fmt;

/// Parsed `<Error>` body. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct S3ErrorResponse {
    /// Provider error code (e.g., "NoSuchKey").
    pub code: Option<String>,
    /// Human-readable error message.
    pub message: Option<String>,
    /// Request ID.
    pub request_id: Option<String>,
    /// Resource the error refers to.
    pub resource: Option<String>,
}

/// Fine-grained error kind.
///
/// Kinds derived from a provider code come first; the kinds after `Timeout`
/// are only produced by the status fallback, and `Generic` marks a code the
/// table does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad access key or signature.
    Authentication,
    /// Credentials valid but not permitted.
    AccessDenied,
    /// Bucket does not exist.
    BucketNotFound,
    /// Bucket name taken.
    BucketAlreadyExists,
    /// Bucket still holds objects.
    BucketNotEmpty,
    /// Bucket name rejected.
    InvalidBucketName,
    /// Object key does not exist.
    NoSuchKey,
    /// Body larger than allowed.
    EntityTooLarge,
    /// Part smaller than allowed.
    EntityTooSmall,
    /// Multipart upload id unknown.
    NoSuchUpload,
    /// Part missing or ETag mismatch.
    InvalidPart,
    /// Manifest parts not ascending.
    InvalidPartOrder,
    /// Malformed XML or invalid argument.
    InvalidRequest,
    /// Service unavailable or asked to slow down.
    ServiceUnavailable,
    /// Internal service error.
    InternalError,
    /// The service timed out reading the request.
    Timeout,
    /// 404 without a code.
    NotFound,
    /// 409 without a code.
    Conflict,
    /// 429 without a code.
    RateLimited,
    /// 5xx without a code.
    ServerError,
    /// Success status without a usable payload.
    Unexpected,
    /// Status outside the known set.
    Unknown,
    /// Provider code not in the table.
    Generic,
}

impl ErrorKind {
    /// Coarse category of this kind.
    ///
    /// `Generic` has no category of its own; see [`ErrorResult::category`].
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorKind::Authentication => ErrorCategory::Authentication,
            ErrorKind::AccessDenied => ErrorCategory::AccessDenied,
            ErrorKind::BucketNotFound
            | ErrorKind::NoSuchKey
            | ErrorKind::NoSuchUpload
            | ErrorKind::NotFound => ErrorCategory::NotFound,
            ErrorKind::BucketAlreadyExists | ErrorKind::BucketNotEmpty | ErrorKind::Conflict => {
                ErrorCategory::AlreadyExists
            }
            ErrorKind::InvalidBucketName
            | ErrorKind::EntityTooLarge
            | ErrorKind::EntityTooSmall
            | ErrorKind::InvalidPart
            | ErrorKind::InvalidPartOrder
            | ErrorKind::InvalidRequest => ErrorCategory::InvalidRequest,
            ErrorKind::RateLimited => ErrorCategory::RateLimited,
            ErrorKind::ServiceUnavailable | ErrorKind::InternalError | ErrorKind::ServerError => {
                ErrorCategory::ServerError
            }
            ErrorKind::Timeout => ErrorCategory::Timeout,
            ErrorKind::Unexpected | ErrorKind::Unknown | ErrorKind::Generic => {
                ErrorCategory::Unknown
            }
        }
    }
}

/// Coarse error taxonomy shared by protocol and transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Identity could not be established.
    Authentication,
    /// Identity established, action refused.
    AccessDenied,
    /// Bucket, key, upload or resource missing.
    NotFound,
    /// Conflicting resource state.
    AlreadyExists,
    /// The request itself was rejected.
    InvalidRequest,
    /// Throttled.
    RateLimited,
    /// Service-side failure.
    ServerError,
    /// Timed out.
    Timeout,
    /// Transport failure, no answer received.
    Network,
    /// Anything else.
    Unknown,
}

impl ErrorCategory {
    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::AccessDenied => "access-denied",
            ErrorCategory::NotFound => "not-found",
            ErrorCategory::AlreadyExists => "already-exists",
            ErrorCategory::InvalidRequest => "invalid-request",
            ErrorCategory::RateLimited => "rate-limited",
            ErrorCategory::ServerError => "server-error",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Network => "network",
            ErrorCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified protocol-level error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResult {
    /// Error kind.
    pub kind: ErrorKind,
    /// HTTP status of the response.
    pub status: u16,
    /// Provider code, or the stringified status when the body had none.
    pub code: String,
    /// Provider message, or a generic message for the status.
    pub message: String,
    /// Request ID from the body or the `x-amz-request-id` header.
    pub request_id: Option<String>,
    /// Resource path from the body.
    pub resource: Option<String>,
}

impl ErrorResult {
    /// Coarse category.
    ///
    /// Unknown provider codes take the category their status implies.
    pub fn category(&self) -> ErrorCategory {
        match self.kind {
            ErrorKind::Generic => map_http_status(self.status).0.category(),
            kind => kind.category(),
        }
    }

    /// Whether repeating the call could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::ServerError | ErrorCategory::RateLimited | ErrorCategory::Timeout
        )
    }
}

impl fmt::Display for ErrorResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.status, self.message)?;
        if let Some(request_id) = &self.request_id {
            write!(f, " [request id: {}]", request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorResult {}

/// Map a provider error code to a kind.
///
/// Codes the table does not know map to [`ErrorKind::Generic`].
pub fn map_s3_error_code(code: &str) -> ErrorKind {
    match code {
        "InvalidAccessKeyId" | "SignatureDoesNotMatch" => ErrorKind::Authentication,
        "AccessDenied" => ErrorKind::AccessDenied,
        "NoSuchBucket" => ErrorKind::BucketNotFound,
        "BucketAlreadyExists" | "BucketAlreadyOwnedByYou" => ErrorKind::BucketAlreadyExists,
        "BucketNotEmpty" => ErrorKind::BucketNotEmpty,
        "InvalidBucketName" => ErrorKind::InvalidBucketName,
        "NoSuchKey" => ErrorKind::NoSuchKey,
        "EntityTooLarge" => ErrorKind::EntityTooLarge,
        "EntityTooSmall" => ErrorKind::EntityTooSmall,
        "NoSuchUpload" => ErrorKind::NoSuchUpload,
        "InvalidPart" => ErrorKind::InvalidPart,
        "InvalidPartOrder" => ErrorKind::InvalidPartOrder,
        "MalformedXML" | "InvalidArgument" => ErrorKind::InvalidRequest,
        "ServiceUnavailable" | "SlowDown" => ErrorKind::ServiceUnavailable,
        "InternalError" => ErrorKind::InternalError,
        "RequestTimeout" => ErrorKind::Timeout,
        _ => ErrorKind::Generic,
    }
}

/// Map an HTTP status to a kind and generic message when no code is available.
pub fn map_http_status(status: u16) -> (ErrorKind, String) {
    match status {
        200 => (
            ErrorKind::Unexpected,
            "The response was successful but it did not include a valid payload.".to_string(),
        ),
        400 => (
            ErrorKind::InvalidRequest,
            "There was an issue with the format or content of your request.".to_string(),
        ),
        401 | 403 => (
            ErrorKind::Authentication,
            "There's an issue with your credentials or permissions.".to_string(),
        ),
        404 => (
            ErrorKind::NotFound,
            "The requested resource was not found.".to_string(),
        ),
        409 => (
            ErrorKind::Conflict,
            "There was a conflict with the current state of the resource.".to_string(),
        ),
        429 => (
            ErrorKind::RateLimited,
            "Your account has hit a rate limit.".to_string(),
        ),
        500..=599 => (
            ErrorKind::ServerError,
            "The S3 service encountered an unexpected server error.".to_string(),
        ),
        _ => (
            ErrorKind::Unknown,
            format!("The S3 service returned an unexpected status code: '{}'.", status),
        ),
    }
}

/// Classify a status and optional parsed error body.
pub fn classify(status: u16, body: Option<&S3ErrorResponse>) -> ErrorResult {
    let (status_kind, status_message) = map_http_status(status);

    let code = body
        .and_then(|b| b.code.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let kind = match code {
        Some(code) => map_s3_error_code(code),
        None => status_kind,
    };

    let message = body
        .and_then(|b| b.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or(status_message);

    ErrorResult {
        kind,
        status,
        code: code
            .map(str::to_string)
            .unwrap_or_else(|| status.to_string()),
        message,
        request_id: body.and_then(|b| b.request_id.clone()),
        resource: body.and_then(|b| b.resource.clone()),
    }
}

/// Classify a raw response.
///
/// An empty or unparseable body degrades to the status fallback. The
/// request id falls back to the `x-amz-request-id` header.
pub fn classify_response(response: &HttpResponse) -> ErrorResult {
    let parsed = if response.body.is_empty() {
        None
    } else {
        let text = String::from_utf8_lossy(&response.body);
        crate::xml::parse_error_response(&text).ok()
    };

    let mut result = classify(response.status, parsed.as_ref());
    if result.request_id.is_none() {
        result.request_id = response.request_id().map(str::to_string);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::collections::HashMap;

    fn body(code: &str, message: &str) -> S3ErrorResponse {
        S3ErrorResponse {
            code: Some(code.into()),
            message: Some(message.into()),
            request_id: Some("ABC123".into()),
            resource: Some("/my-bucket/my-key".into()),
        }
    }

    #[test]
    fn test_map_no_such_bucket() {
        let result = classify(404, Some(&body("NoSuchBucket", "The specified bucket does not exist")));

        assert_eq!(result.kind, ErrorKind::BucketNotFound);
        assert_eq!(result.code, "NoSuchBucket");
        assert_eq!(result.message, "The specified bucket does not exist");
        assert_eq!(result.request_id.as_deref(), Some("ABC123"));
        assert_eq!(result.resource.as_deref(), Some("/my-bucket/my-key"));
    }

    #[test]
    fn test_map_slow_down() {
        let result = classify(503, Some(&body("SlowDown", "Please reduce your request rate.")));
        assert_eq!(result.kind, ErrorKind::ServiceUnavailable);
        assert_eq!(result.category(), ErrorCategory::ServerError);
        assert!(result.is_retryable());
    }

    #[test]
    fn test_map_unknown_code_keeps_code() {
        let result = classify(400, Some(&body("SomeFutureErrorCode", "Something new")));

        assert_eq!(result.kind, ErrorKind::Generic);
        assert_eq!(result.code, "SomeFutureErrorCode");
        assert_eq!(result.message, "Something new");
        assert_eq!(result.category(), ErrorCategory::InvalidRequest);
    }

    #[test]
    fn test_body_without_code_uses_status() {
        let partial = S3ErrorResponse {
            message: Some("custom".into()),
            ..Default::default()
        };
        let result = classify(409, Some(&partial));

        assert_eq!(result.kind, ErrorKind::Conflict);
        assert_eq!(result.code, "409");
        assert_eq!(result.message, "custom");
    }

    #[test]
    fn test_map_http_status() {
        assert_eq!(map_http_status(401).0, ErrorKind::Authentication);
        assert_eq!(map_http_status(429).0, ErrorKind::RateLimited);
        assert_eq!(map_http_status(502).0, ErrorKind::ServerError);

        let (kind, message) = map_http_status(418);
        assert_eq!(kind, ErrorKind::Unknown);
        assert!(message.contains("'418'"));
    }

    #[test]
    fn test_classify_response_non_error_body() {
        let mut headers = HashMap::new();
        headers.insert("x-amz-request-id".to_string(), "HDR-ID".to_string());
        let response = HttpResponse {
            status: 500,
            headers,
            body: Bytes::from_static(b"<html><body>Bad Gateway</body></html>"),
        };

        let result = classify_response(&response);
        assert_eq!(result.kind, ErrorKind::ServerError);
        assert_eq!(result.code, "500");
        assert_eq!(result.request_id.as_deref(), Some("HDR-ID"));
    }

    #[test]
    fn test_display() {
        let result = classify(403, None);
        assert_eq!(
            result.to_string(),
            "403 (403): There's an issue with your credentials or permissions."
        );
    }
}
