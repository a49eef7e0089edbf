//! Integration tests for ObjectsService.

use bytes::Bytes;
use chrono::{TimeZone, Utc};
use s3_compat::error::{ErrorKind, S3Error};
use s3_compat::mocks::{MockResponse, MockTransport, TestFixtures};
use s3_compat::types::*;
use s3_compat::{RequestBody, S3Client};
use std::io::Cursor;
use std::sync::Arc;

fn not_found() -> MockResponse {
    MockResponse::error(
        404,
        TestFixtures::error_xml("NoSuchKey", "The specified key does not exist."),
    )
}

#[tokio::test]
async fn test_put_object_success() {
    let transport = Arc::new(MockTransport::with_responses(vec![MockResponse::ok()
        .with_header("etag", "\"abc123\"")
        .with_header("x-amz-version-id", "v7")]));
    let client = TestFixtures::client(transport.clone());

    let output = client
        .objects()
        .put(
            "test-bucket",
            "test-key.txt",
            Bytes::from("test content"),
            &PutObjectOptions::new(),
        )
        .await
        .unwrap();

    assert_eq!(output.etag.as_deref(), Some("abc123"));
    assert_eq!(output.version_id.as_deref(), Some("v7"));

    let recorded = transport.last_request().unwrap();
    assert_eq!(recorded.method, "PUT");
    assert_eq!(
        recorded.url,
        "https://s3.us-east-1.amazonaws.com/test-bucket/test-key.txt"
    );
    assert_eq!(recorded.body, Some(Bytes::from("test content")));
    assert_eq!(recorded.get_header("content-length"), Some("12"));
}

#[tokio::test]
async fn test_put_object_headers_are_signed() {
    let transport = Arc::new(MockTransport::with_default(MockResponse::ok()));
    let client = TestFixtures::client(transport.clone());

    let options = PutObjectOptions::new()
        .content_type("text/plain")
        .acl(CannedAcl::Private)
        .storage_class(StorageClass::StandardIa)
        .content_disposition("attachment")
        .expires(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap())
        .metadata("owner", "ops");

    client
        .objects()
        .put("test-bucket", "k", "body", &options)
        .await
        .unwrap();

    let recorded = transport.last_request().unwrap();
    assert_eq!(recorded.get_header("x-amz-acl"), Some("private"));
    assert_eq!(recorded.get_header("x-amz-storage-class"), Some("STANDARD_IA"));
    assert_eq!(
        recorded.get_header("expires"),
        Some("Tue, 01 Jan 2030 00:00:00 GMT")
    );
    assert_eq!(recorded.get_header("x-amz-meta-owner"), Some("ops"));

    let authorization = recorded.get_header("authorization").unwrap();
    assert!(authorization.contains(
        "SignedHeaders=content-disposition;content-type;expires;host;x-amz-acl;\
         x-amz-content-sha256;x-amz-date;x-amz-meta-owner;x-amz-storage-class"
    ));
}

#[tokio::test]
async fn test_put_object_streams_seekable_body() {
    let transport = Arc::new(MockTransport::with_default(MockResponse::ok()));
    let client = TestFixtures::client(transport.clone());

    let body = RequestBody::seekable(Cursor::new(b"streamed payload".to_vec()));
    client
        .objects()
        .put("test-bucket", "big.bin", body, &PutObjectOptions::new())
        .await
        .unwrap();

    assert!(transport.was_streamed(0));
    let recorded = transport.last_request().unwrap();
    assert_eq!(recorded.body, Some(Bytes::from("streamed payload")));
    assert_eq!(
        recorded.get_header("x-amz-content-sha256"),
        Some("UNSIGNED-PAYLOAD")
    );
    assert_eq!(recorded.get_header("content-length"), Some("16"));
}

#[tokio::test]
async fn test_get_object_success() {
    let transport = Arc::new(MockTransport::with_responses(vec![
        MockResponse::ok_with_body("file content"),
    ]));
    let client = TestFixtures::client(transport.clone());

    let body = client.objects().get("test-bucket", "test-key.txt").await.unwrap();

    assert_eq!(body, Bytes::from("file content"));
    let recorded = transport.last_request().unwrap();
    assert_eq!(recorded.method, "GET");
    assert!(recorded.body.is_none());
    assert!(recorded.get_header("content-length").is_none());
}

#[tokio::test]
async fn test_get_object_not_found() {
    let transport = Arc::new(MockTransport::with_responses(vec![not_found()]));
    let client = TestFixtures::client(transport);

    let result = client.objects().get("test-bucket", "missing.txt").await;

    match result {
        Err(S3Error::Service(error)) => {
            assert_eq!(error.kind, ErrorKind::NoSuchKey);
            assert_eq!(error.status, 404);
            assert_eq!(error.request_id.as_deref(), Some("test-request-id"));
        }
        other => panic!("expected service error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_get_streaming_delivers_chunks() {
    let transport = Arc::new(
        MockTransport::with_responses(vec![MockResponse::ok_with_body("0123456789")])
            .with_chunk_size(4),
    );
    let client = TestFixtures::client(transport);

    let mut chunks = Vec::new();
    client
        .objects()
        .get_streaming("test-bucket", "digits.txt", |chunk| {
            chunks.push(chunk.to_vec())
        })
        .await
        .unwrap();

    assert_eq!(
        chunks,
        vec![b"0123".to_vec(), b"4567".to_vec(), b"89".to_vec()]
    );
}

#[tokio::test]
async fn test_get_streaming_error_skips_callback() {
    let transport = Arc::new(MockTransport::with_responses(vec![MockResponse::error(
        403,
        TestFixtures::error_xml("AccessDenied", "Access Denied"),
    )]));
    let client = TestFixtures::client(transport);

    let mut called = false;
    let result = client
        .objects()
        .get_streaming("test-bucket", "secret.txt", |_| called = true)
        .await;

    assert!(!called);
    match result {
        Err(S3Error::Service(error)) => assert_eq!(error.kind, ErrorKind::AccessDenied),
        other => panic!("expected service error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_head_object_metadata() {
    let mut response = MockResponse::ok();
    response.headers = TestFixtures::object_headers();
    let transport = Arc::new(MockTransport::with_responses(vec![response]));
    let client = TestFixtures::client(transport.clone());

    let metadata = client
        .objects()
        .head("test-bucket", "test-key.txt")
        .await
        .unwrap()
        .expect("object exists");

    assert_eq!(metadata.content_type.as_deref(), Some("text/plain"));
    assert_eq!(metadata.content_length, Some(1024));
    assert_eq!(metadata.etag.as_deref(), Some("abc123"));
    assert_eq!(metadata.storage_class.as_deref(), Some("STANDARD_IA"));
    assert_eq!(metadata.version_id.as_deref(), Some("v1"));
    assert_eq!(
        metadata.last_modified,
        Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
    );
    assert_eq!(metadata.metadata.len(), 1);
    assert_eq!(metadata.metadata["owner"], "ops");
    assert_eq!(transport.last_request().unwrap().method, "HEAD");
}

#[tokio::test]
async fn test_head_missing_object_is_none() {
    let transport = Arc::new(MockTransport::with_responses(vec![MockResponse::new(404)]));
    let client = TestFixtures::client(transport);

    let result = client.objects().head("test-bucket", "missing.txt").await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_exists() {
    let transport = Arc::new(MockTransport::with_responses(vec![
        MockResponse::ok(),
        MockResponse::new(404),
        MockResponse::new(403),
    ]));
    let client = TestFixtures::client(transport);

    assert!(client.objects().exists("test-bucket", "a").await.unwrap());
    assert!(!client.objects().exists("test-bucket", "b").await.unwrap());
    match client.objects().exists("test-bucket", "c").await {
        Err(S3Error::Service(error)) => {
            assert_eq!(error.kind, ErrorKind::Authentication);
            assert_eq!(error.code, "403");
        }
        other => panic!("expected authentication error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_delete_object() {
    let transport = Arc::new(MockTransport::with_responses(vec![
        MockResponse::no_content(),
        MockResponse::no_content(),
    ]));
    let client = TestFixtures::client(transport.clone());

    client.objects().delete("test-bucket", "old.txt").await.unwrap();
    client
        .objects()
        .delete_version("test-bucket", "old.txt", "v 1")
        .await
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests[0].method, "DELETE");
    assert!(!requests[0].url.contains('?'));
    assert!(requests[1].url.ends_with("/test-bucket/old.txt?versionId=v%201"));
}

#[tokio::test]
async fn test_keys_are_percent_encoded() {
    let transport = Arc::new(MockTransport::with_default(MockResponse::ok()));
    let client = TestFixtures::client(transport.clone());

    client
        .objects()
        .get("test-bucket", "dir/a file+b.txt")
        .await
        .unwrap();

    assert_eq!(
        transport.last_request().unwrap().url,
        "https://s3.us-east-1.amazonaws.com/test-bucket/dir/a%20file%2Bb.txt"
    );
}
