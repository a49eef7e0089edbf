//! Operation result types.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

/// Result of starting a multipart upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateMultipartOutput {
    /// Bucket name.
    pub bucket: Option<String>,
    /// Object key.
    pub key: Option<String>,
    /// Upload ID.
    pub upload_id: String,
}

/// Result of completing a multipart upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompleteMultipartOutput {
    /// URL of the assembled object.
    pub location: Option<String>,
    /// Bucket name.
    pub bucket: Option<String>,
    /// Object key.
    pub key: Option<String>,
    /// ETag of the assembled object, quotes removed.
    pub etag: Option<String>,
}

/// One in-progress multipart upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartUpload {
    /// Object key.
    pub key: String,
    /// Upload ID.
    pub upload_id: String,
    /// When the upload was started.
    pub initiated: Option<DateTime<Utc>>,
    /// Storage class.
    pub storage_class: Option<String>,
}

/// Page of in-progress multipart uploads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListUploadsOutput {
    /// Bucket name.
    pub bucket: Option<String>,
    /// Uploads in this page.
    pub uploads: Vec<MultipartUpload>,
    /// Whether more pages follow.
    pub is_truncated: bool,
    /// Key marker for the next page.
    pub next_key_marker: Option<String>,
    /// Upload-id marker for the next page.
    pub next_upload_id_marker: Option<String>,
}

/// One part stored by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartInfo {
    /// Part number.
    pub part_number: u32,
    /// ETag, quotes removed.
    pub etag: String,
    /// Size in bytes.
    pub size: Option<u64>,
    /// Upload time.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Page of parts for one upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPartsOutput {
    /// Bucket name.
    pub bucket: Option<String>,
    /// Object key.
    pub key: Option<String>,
    /// Upload ID.
    pub upload_id: Option<String>,
    /// Parts in this page.
    pub parts: Vec<PartInfo>,
    /// Whether more pages follow.
    pub is_truncated: bool,
    /// Part-number marker for the next page.
    pub next_part_number_marker: Option<u32>,
}

/// Object metadata returned by HEAD.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Content type.
    pub content_type: Option<String>,
    /// Content length.
    pub content_length: Option<u64>,
    /// Last modification time.
    pub last_modified: Option<DateTime<Utc>>,
    /// ETag, quotes removed.
    pub etag: Option<String>,
    /// Storage class.
    pub storage_class: Option<String>,
    /// Version ID.
    pub version_id: Option<String>,
    /// User metadata with the `x-amz-meta-` prefix removed.
    pub metadata: BTreeMap<String, String>,
}

/// Result of a single-request upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutObjectOutput {
    /// ETag, quotes removed.
    pub etag: Option<String>,
    /// Version ID.
    pub version_id: Option<String>,
}

/// Presigned URL.
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL.
    pub url: String,
    /// HTTP method.
    pub method: String,
    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
    /// Headers that were signed and must be sent with the request.
    pub signed_headers: HashMap<String, String>,
}

impl PresignedUrl {
    /// Check if the URL has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Get remaining time until expiration.
    pub fn time_remaining(&self) -> Option<chrono::Duration> {
        let remaining = self.expires_at - Utc::now();
        if remaining.num_seconds() > 0 {
            Some(remaining)
        } else {
            None
        }
    }
}
