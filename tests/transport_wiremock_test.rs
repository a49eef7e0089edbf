//! End-to-end tests through the reqwest transport against a local mock server.

use bytes::Bytes;
use s3_compat::error::{ErrorKind, NetworkError, S3Error};
use s3_compat::mocks::TestFixtures;
use s3_compat::signing::{sha256_hex, UNSIGNED_PAYLOAD};
use s3_compat::types::*;
use s3_compat::{RequestBody, S3Client, S3ClientImpl, S3Config};
use std::io::Cursor;
use wiremock::matchers::{body_bytes, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(endpoint: &str) -> S3ClientImpl {
    let config = S3Config::builder()
        .credentials(TestFixtures::credentials())
        .endpoint(endpoint)
        .expect("valid endpoint")
        .build()
        .expect("valid config");
    s3_compat::create_client(config).expect("client builds")
}

#[tokio::test]
async fn test_put_buffered_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/test-bucket/hello.txt"))
        .and(header_exists("authorization"))
        .and(header_exists("x-amz-date"))
        .and(header("x-amz-content-sha256", sha256_hex(b"hello").as_str()))
        .and(header("content-type", "text/plain"))
        .and(body_bytes(b"hello".to_vec()))
        .respond_with(ResponseTemplate::new(200).insert_header("ETag", "\"5d41402a\""))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let output = client
        .objects()
        .put(
            "test-bucket",
            "hello.txt",
            "hello",
            &PutObjectOptions::new().content_type("text/plain"),
        )
        .await
        .unwrap();

    assert_eq!(output.etag.as_deref(), Some("5d41402a"));
}

#[tokio::test]
async fn test_put_streamed_body() {
    let server = MockServer::start().await;
    let payload = vec![b'z'; 150_000];
    Mock::given(method("PUT"))
        .and(path("/test-bucket/stream.bin"))
        .and(header("x-amz-content-sha256", UNSIGNED_PAYLOAD))
        .and(header("content-length", "150000"))
        .and(body_bytes(payload.clone()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    client
        .objects()
        .put(
            "test-bucket",
            "stream.bin",
            RequestBody::seekable(Cursor::new(payload)),
            &PutObjectOptions::new(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_get_streaming_large_body() {
    let server = MockServer::start().await;
    let payload: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
    Mock::given(method("GET"))
        .and(path("/test-bucket/large.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let mut received = Vec::new();
    client
        .objects()
        .get_streaming("test-bucket", "large.bin", |chunk| {
            received.extend_from_slice(chunk)
        })
        .await
        .unwrap();

    assert_eq!(received, payload);
}

#[tokio::test]
async fn test_get_missing_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/test-bucket/missing.txt"))
        .respond_with(
            ResponseTemplate::new(404)
                .insert_header("x-amz-request-id", "req-404")
                .set_body_string(TestFixtures::error_xml("NoSuchKey", "Not here")),
        )
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    match client.objects().get("test-bucket", "missing.txt").await {
        Err(S3Error::Service(error)) => {
            assert_eq!(error.kind, ErrorKind::NoSuchKey);
            assert_eq!(error.message, "Not here");
        }
        other => panic!("expected service error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_get_returns_stored_encoded_bytes() {
    let server = MockServer::start().await;
    // gzip member header followed by an opaque deflate payload
    let stored: Vec<u8> = vec![
        0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0xcb, 0x48, 0xcd, 0xc9,
        0xc9, 0x57, 0x28, 0xcf, 0x2f, 0xca, 0x49, 0x01, 0x00, 0x85, 0x11, 0x4a, 0x0d, 0x0b,
        0x00, 0x00, 0x00,
    ];
    Mock::given(method("GET"))
        .and(path("/test-bucket/archive.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Encoding", "gzip")
                .set_body_bytes(stored.clone()),
        )
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let body = client.objects().get("test-bucket", "archive.txt").await.unwrap();
    assert_eq!(body.to_vec(), stored);

    let mut streamed = Vec::new();
    client
        .objects()
        .get_streaming("test-bucket", "archive.txt", |chunk| {
            streamed.extend_from_slice(chunk)
        })
        .await
        .unwrap();
    assert_eq!(streamed, stored);

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|request| request
        .headers
        .keys()
        .all(|name| !name.as_str().eq_ignore_ascii_case("accept-encoding"))));
}

#[tokio::test]
async fn test_head_missing_key() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/test-bucket/missing.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let metadata = client.objects().head("test-bucket", "missing.txt").await.unwrap();
    assert!(metadata.is_none());
}

#[tokio::test]
async fn test_endpoint_path_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gateway/test-bucket/video.mp4"))
        .and(query_param("uploads", ""))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(TestFixtures::create_multipart_xml("prefixed-upload")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&format!("{}/gateway/", server.uri()));
    let session = client
        .multipart()
        .create("test-bucket", "video.mp4", &CreateMultipartOptions::new())
        .await
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(session.upload_id(), "prefixed-upload");
}

#[tokio::test]
async fn test_multipart_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/test-bucket/big.bin"))
        .and(query_param("uploads", ""))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(TestFixtures::create_multipart_xml("u-1")),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/test-bucket/big.bin"))
        .and(query_param("uploadId", "u-1"))
        .respond_with(ResponseTemplate::new(200).insert_header("ETag", "\"part\""))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/test-bucket/big.bin"))
        .and(query_param("uploadId", "u-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(TestFixtures::complete_multipart_xml()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let output = client
        .multipart()
        .upload(
            "test-bucket",
            "big.bin",
            Bytes::from(vec![3u8; 64]),
            40,
            &CreateMultipartOptions::new(),
        )
        .await
        .unwrap();

    assert_eq!(output.etag.as_deref(), Some("combined-etag-3"));
}

#[tokio::test]
async fn test_connection_refused() {
    let client = client_for("http://127.0.0.1:1");
    let result = client.objects().get("test-bucket", "k").await;

    assert!(matches!(
        result,
        Err(S3Error::Network(NetworkError::ConnectionFailed { .. }))
    ));
}
