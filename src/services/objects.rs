//! Object operations built on the executor.
//!
//! These are thin mappings from typed arguments to one signed call each;
//! protocol errors are converted to `S3Error::Service`.

use crate::body::RequestBody;
use crate::error::S3Error;
use crate::executor::RequestExecutor;
use crate::signing::QueryParams;
use crate::transport::HttpResponse;
use crate::types::*;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

const META_PREFIX: &str = "x-amz-meta-";

/// Service for S3 object operations.
pub struct ObjectsService {
    executor: Arc<RequestExecutor>,
}

impl ObjectsService {
    /// Create a new objects service.
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self { executor }
    }

    /// Download an object into memory.
    pub async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, S3Error> {
        self.executor
            .get(
                &self.executor.config().object_path(bucket, key),
                &QueryParams::new(),
                Vec::new(),
                |raw| Ok(raw.body.clone()),
            )
            .await?
            .into_result()
    }

    /// Download an object, handing each chunk to `on_chunk` as it arrives.
    pub async fn get_streaming<F>(&self, bucket: &str, key: &str, on_chunk: F) -> Result<(), S3Error>
    where
        F: FnMut(&[u8]) + Send,
    {
        self.executor
            .get_streaming(
                &self.executor.config().object_path(bucket, key),
                &QueryParams::new(),
                Vec::new(),
                on_chunk,
            )
            .await?
            .into_result()
    }

    /// Upload an object in a single request.
    pub async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: impl Into<RequestBody>,
        options: &PutObjectOptions,
    ) -> Result<PutObjectOutput, S3Error> {
        self.executor
            .put(
                &self.executor.config().object_path(bucket, key),
                &QueryParams::new(),
                put_headers(options),
                body.into(),
                |raw| {
                    Ok(PutObjectOutput {
                        etag: raw.etag().map(strip_etag_quotes),
                        version_id: raw.get_header("x-amz-version-id").map(String::from),
                    })
                },
            )
            .await?
            .into_result()
    }

    /// Fetch object metadata. `None` when the object does not exist.
    pub async fn head(&self, bucket: &str, key: &str) -> Result<Option<ObjectMetadata>, S3Error> {
        self.executor
            .head(
                &self.executor.config().object_path(bucket, key),
                &QueryParams::new(),
                Vec::new(),
                |raw| Ok(parse_object_metadata(raw)),
            )
            .await?
            .into_option()
    }

    /// Whether an object exists.
    pub async fn exists(&self, bucket: &str, key: &str) -> Result<bool, S3Error> {
        Ok(self.head(bucket, key).await?.is_some())
    }

    /// Delete an object.
    pub async fn delete(&self, bucket: &str, key: &str) -> Result<(), S3Error> {
        self.delete_with_query(bucket, key, QueryParams::new()).await
    }

    /// Delete one version of an object.
    pub async fn delete_version(
        &self,
        bucket: &str,
        key: &str,
        version_id: &str,
    ) -> Result<(), S3Error> {
        self.delete_with_query(bucket, key, QueryParams::new().with("versionId", version_id))
            .await
    }

    async fn delete_with_query(
        &self,
        bucket: &str,
        key: &str,
        query: QueryParams,
    ) -> Result<(), S3Error> {
        self.executor
            .delete(
                &self.executor.config().object_path(bucket, key),
                &query,
                Vec::new(),
                |_| Ok(()),
            )
            .await?
            .into_result()
    }
}

impl std::fmt::Debug for ObjectsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectsService").finish_non_exhaustive()
    }
}

fn put_headers(options: &PutObjectOptions) -> Vec<(String, String)> {
    let mut headers = Vec::new();
    let mut push = |name: &str, value: Option<String>| {
        if let Some(value) = value {
            headers.push((name.to_string(), value));
        }
    };

    push("content-type", options.content_type.clone());
    push("x-amz-acl", options.acl.map(|acl| acl.as_str().to_string()));
    push(
        "x-amz-storage-class",
        options.storage_class.map(|class| class.as_str().to_string()),
    );
    push("cache-control", options.cache_control.clone());
    push("content-disposition", options.content_disposition.clone());
    push("content-encoding", options.content_encoding.clone());
    push("content-language", options.content_language.clone());
    push("expires", options.expires.as_ref().map(format_http_date));

    for (name, value) in &options.metadata {
        headers.push((format!("{}{}", META_PREFIX, name), value.clone()));
    }
    headers
}

/// Format a timestamp as an HTTP date (`Sun, 06 Nov 1994 08:49:37 GMT`).
pub fn format_http_date(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Parse an HTTP date, accepting RFC 3339 as well.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Build object metadata from HEAD response headers.
pub fn parse_object_metadata(raw: &HttpResponse) -> ObjectMetadata {
    let metadata: BTreeMap<String, String> = raw
        .headers
        .iter()
        .filter_map(|(name, value)| {
            let lower = name.to_ascii_lowercase();
            lower
                .strip_prefix(META_PREFIX)
                .map(|meta_key| (meta_key.to_string(), value.clone()))
        })
        .collect();

    ObjectMetadata {
        content_type: raw.content_type().map(String::from),
        content_length: raw.content_length(),
        last_modified: raw.get_header("last-modified").and_then(parse_http_date),
        etag: raw.etag().map(strip_etag_quotes),
        storage_class: raw.get_header("x-amz-storage-class").map(String::from),
        version_id: raw.get_header("x-amz-version-id").map(String::from),
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    #[test]
    fn test_put_headers() {
        let options = PutObjectOptions::new()
            .content_type("text/plain")
            .acl(CannedAcl::PublicRead)
            .storage_class(StorageClass::Glacier)
            .cache_control("no-cache")
            .expires(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
            .metadata("owner", "ops");

        let headers: HashMap<String, String> = put_headers(&options).into_iter().collect();
        assert_eq!(headers["content-type"], "text/plain");
        assert_eq!(headers["x-amz-acl"], "public-read");
        assert_eq!(headers["x-amz-storage-class"], "GLACIER");
        assert_eq!(headers["cache-control"], "no-cache");
        assert_eq!(headers["expires"], "Mon, 15 Jan 2024 10:30:00 GMT");
        assert_eq!(headers["x-amz-meta-owner"], "ops");
        assert!(!headers.contains_key("content-language"));
    }

    #[test]
    fn test_parse_object_metadata() {
        let mut raw = HttpResponse::new(200, Bytes::new());
        raw.headers
            .insert("Content-Type".to_string(), "image/png".to_string());
        raw.headers
            .insert("Content-Length".to_string(), "42".to_string());
        raw.headers
            .insert("ETag".to_string(), "\"d41d8cd9\"".to_string());
        raw.headers.insert(
            "Last-Modified".to_string(),
            "Mon, 15 Jan 2024 10:30:00 GMT".to_string(),
        );
        raw.headers
            .insert("X-Amz-Meta-Camera".to_string(), "x100".to_string());

        let metadata = parse_object_metadata(&raw);
        assert_eq!(metadata.content_type.as_deref(), Some("image/png"));
        assert_eq!(metadata.content_length, Some(42));
        assert_eq!(metadata.etag.as_deref(), Some("d41d8cd9"));
        assert_eq!(
            metadata.last_modified,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
        );
        assert_eq!(metadata.metadata.get("camera").map(String::as_str), Some("x100"));
    }

    #[test]
    fn test_parse_http_date_rejects_garbage() {
        assert!(parse_http_date("yesterday").is_none());
    }
}
