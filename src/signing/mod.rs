//! AWS Signature V4 signing implementation.
//!
//! This module implements canonical request creation, string to sign
//! generation, signing key derivation, and signature calculation, for both
//! header-signed requests and presigned URLs.

mod canonical;
mod signer;

pub use canonical::{
    build_canonical_headers, build_signed_headers, encode_key, encode_query_component,
    CanonicalRequest, QueryParams,
};
pub use signer::{PresignInput, Signer};

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// AWS Signature V4 algorithm identifier.
pub const AWS_ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Service name for S3.
pub const S3_SERVICE: &str = "s3";

/// Terminator of the credential scope and the last key-derivation input.
pub const AWS4_REQUEST: &str = "aws4_request";

/// Payload hash sentinel for bodies that are not pre-hashed.
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// SHA-256 of the empty string.
pub const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Calculate SHA-256 hash of data.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Calculate HMAC-SHA256.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Zeroizing<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    Zeroizing::new(mac.finalize().into_bytes().to_vec())
}

/// Generate the signing key for AWS Signature V4.
///
/// kDate = HMAC("AWS4" + SecretKey, Date)
/// kRegion = HMAC(kDate, Region)
/// kService = HMAC(kRegion, Service)
/// kSigning = HMAC(kService, "aws4_request")
///
/// Intermediate keys are wiped when they go out of scope.
pub fn derive_signing_key(
    secret_key: &str,
    date_stamp: &str,
    region: &str,
    service: &str,
) -> Zeroizing<Vec<u8>> {
    let k_secret = Zeroizing::new(format!("AWS4{}", secret_key));
    let k_date = hmac_sha256(k_secret.as_bytes(), date_stamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, AWS4_REQUEST.as_bytes())
}

/// Build the credential scope string.
///
/// Format: `{date}/{region}/{service}/aws4_request`
pub fn build_credential_scope(date_stamp: &str, region: &str, service: &str) -> String {
    format!("{}/{}/{}/{}", date_stamp, region, service, AWS4_REQUEST)
}

/// Build the string to sign.
pub fn build_string_to_sign(
    amz_date: &str,
    credential_scope: &str,
    canonical_request: &CanonicalRequest,
) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        AWS_ALGORITHM,
        amz_date,
        credential_scope,
        sha256_hex(canonical_request.to_string().as_bytes())
    )
}

/// Format a timestamp for AWS signatures.
///
/// Returns the date-time in `YYYYMMDD'T'HHMMSS'Z'` format.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Format a date stamp for AWS signatures.
///
/// Returns the date in `YYYYMMDD` format.
pub fn format_date_stamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        assert_eq!(sha256_hex(b""), EMPTY_SHA256);
        assert_eq!(
            sha256_hex(b"test"),
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_hmac_sha256() {
        let result = hmac_sha256(b"key", b"message");
        assert_eq!(result.len(), 32);
    }

    #[test]
    fn test_derive_signing_key() {
        // Published key-derivation example for the IAM service.
        let key = derive_signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20120215",
            "us-east-1",
            "iam",
        );
        assert_eq!(
            hex::encode(&*key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_build_credential_scope() {
        let scope = build_credential_scope("20231215", "us-east-1", "s3");
        assert_eq!(scope, "20231215/us-east-1/s3/aws4_request");
    }

    #[test]
    fn test_format_datetime() {
        use chrono::TimeZone;
        let dt = Utc.with_ymd_and_hms(2023, 12, 15, 10, 30, 45).unwrap();
        assert_eq!(format_datetime(&dt), "20231215T103045Z");
        assert_eq!(format_date_stamp(&dt), "20231215");
    }
}
