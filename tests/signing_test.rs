//! Header signing through the executor against the published SigV4 examples.

use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use s3_compat::body::NormalizedBody;
use s3_compat::mocks::{MockTransport, TestFixtures};
use s3_compat::signing::QueryParams;
use s3_compat::{RequestExecutor, S3Config};
use std::sync::Arc;

fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2013, 5, 24, 0, 0, 0).unwrap()
}

fn example_executor() -> RequestExecutor {
    let config = S3Config::builder()
        .credentials(TestFixtures::credentials())
        .endpoint("https://examplebucket.s3.amazonaws.com")
        .unwrap()
        .build()
        .unwrap();
    RequestExecutor::new(Arc::new(config), Arc::new(MockTransport::new()))
}

fn signature(authorization: &str) -> &str {
    authorization
        .rsplit("Signature=")
        .next()
        .unwrap_or_default()
}

#[test]
fn test_get_object_with_range() {
    let request = example_executor().signed_request(
        "GET",
        "/test.txt",
        &QueryParams::new(),
        vec![("Range".to_string(), "bytes=0-9".to_string())],
        &NormalizedBody::empty(),
        &timestamp(),
    );

    let authorization = request.get_header("authorization").unwrap();
    assert!(authorization.contains("SignedHeaders=host;range;x-amz-content-sha256;x-amz-date,"));
    assert_eq!(
        signature(authorization),
        "f0e8bdb87c964420e857bd35b5d6ed310bd44f0170aba48dd91039c6036bdb41"
    );
    assert_eq!(request.url, "https://examplebucket.s3.amazonaws.com/test.txt");
    assert!(request.get_header("content-length").is_none());
}

#[test]
fn test_put_object_with_storage_class() {
    let body = NormalizedBody::buffered(Bytes::from_static(b"Welcome to Amazon S3."));
    let request = example_executor().signed_request(
        "PUT",
        "/test%24file.text",
        &QueryParams::new(),
        vec![
            ("Date".to_string(), "Fri, 24 May 2013 00:00:00 GMT".to_string()),
            ("x-amz-storage-class".to_string(), "REDUCED_REDUNDANCY".to_string()),
        ],
        &body,
        &timestamp(),
    );

    assert_eq!(
        request.get_header("x-amz-content-sha256"),
        Some("44ce7dd67c959e0d3524ffac1771dfbba87d2b6b4b4e99e42034a8b803f8b072")
    );
    let authorization = request.get_header("authorization").unwrap();
    assert!(authorization
        .contains("SignedHeaders=date;host;x-amz-content-sha256;x-amz-date;x-amz-storage-class,"));
    assert_eq!(
        signature(authorization),
        "98ad721746da40c64f1a55b78f14c238d841ea1380cd77a1b5971af0ece108bd"
    );
    assert_eq!(request.get_header("content-length"), Some("21"));
}

#[test]
fn test_get_bucket_lifecycle() {
    let request = example_executor().signed_request(
        "GET",
        "/",
        &QueryParams::new().with("lifecycle", ""),
        Vec::new(),
        &NormalizedBody::empty(),
        &timestamp(),
    );

    assert_eq!(
        signature(request.get_header("authorization").unwrap()),
        "fea454ca298b7da1c68078a5d1bdbfbbe0d65c699e0f91ac7a200a0136783543"
    );
}

#[test]
fn test_list_objects() {
    let request = example_executor().signed_request(
        "GET",
        "/",
        &QueryParams::new().with("prefix", "J").with("max-keys", 2),
        Vec::new(),
        &NormalizedBody::empty(),
        &timestamp(),
    );

    assert_eq!(
        signature(request.get_header("authorization").unwrap()),
        "34b48302e7b5fa45bde8084f4b7868a86f0a534bc59db6670ed5711ef69dc6f7"
    );
    assert_eq!(
        request.url,
        "https://examplebucket.s3.amazonaws.com/?max-keys=2&prefix=J"
    );
}

#[test]
fn test_reserved_caller_headers_are_replaced() {
    let request = example_executor().signed_request(
        "GET",
        "/test.txt",
        &QueryParams::new(),
        vec![
            ("Host".to_string(), "evil.example.com".to_string()),
            ("Authorization".to_string(), "forged".to_string()),
            ("X-Amz-Date".to_string(), "19700101T000000Z".to_string()),
            ("Range".to_string(), "bytes=0-9".to_string()),
        ],
        &NormalizedBody::empty(),
        &timestamp(),
    );

    assert_eq!(
        request.get_header("host"),
        Some("examplebucket.s3.amazonaws.com")
    );
    assert_eq!(request.get_header("x-amz-date"), Some("20130524T000000Z"));
    assert_eq!(
        signature(request.get_header("authorization").unwrap()),
        "f0e8bdb87c964420e857bd35b5d6ed310bd44f0170aba48dd91039c6036bdb41"
    );
}

#[test]
fn test_session_token_is_signed() {
    let credentials = s3_compat::AwsCredentials::with_session_token(
        TestFixtures::ACCESS_KEY_ID,
        TestFixtures::SECRET_ACCESS_KEY,
        "token",
    )
    .unwrap();
    let config = S3Config::builder().credentials(credentials).build().unwrap();
    let executor = RequestExecutor::new(Arc::new(config), Arc::new(MockTransport::new()));

    let request = executor.signed_request(
        "GET",
        "/b/k",
        &QueryParams::new(),
        Vec::new(),
        &NormalizedBody::empty(),
        &timestamp(),
    );

    assert_eq!(request.get_header("x-amz-security-token"), Some("token"));
    assert!(request
        .get_header("authorization")
        .unwrap()
        .contains("x-amz-date;x-amz-security-token,"));
}
