//! Typed per-operation options.
//!
//! Loosely typed inputs (ACL and storage-class strings) are normalized once,
//! when the option value is built, through the `*_str` setters.

use super::common::{CannedAcl, StorageClass};
use crate::error::RequestError;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Default validity of a presigned URL, in seconds.
pub const DEFAULT_PRESIGN_EXPIRES_IN: u64 = 3600;

/// Options for starting a multipart upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateMultipartOptions {
    /// Content type of the final object.
    pub content_type: Option<String>,
    /// Canned ACL.
    pub acl: Option<CannedAcl>,
    /// Storage class.
    pub storage_class: Option<StorageClass>,
    /// User metadata, sent as `x-amz-meta-<name>` headers.
    pub metadata: BTreeMap<String, String>,
}

impl CreateMultipartOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the content type.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the canned ACL.
    pub fn acl(mut self, acl: CannedAcl) -> Self {
        self.acl = Some(acl);
        self
    }

    /// Set the canned ACL from a loosely written string.
    pub fn acl_str(self, acl: &str) -> Result<Self, RequestError> {
        Ok(self.acl(CannedAcl::normalize(acl)?))
    }

    /// Set the storage class.
    pub fn storage_class(mut self, storage_class: StorageClass) -> Self {
        self.storage_class = Some(storage_class);
        self
    }

    /// Set the storage class from a loosely written string.
    pub fn storage_class_str(self, storage_class: &str) -> Result<Self, RequestError> {
        Ok(self.storage_class(StorageClass::normalize(storage_class)?))
    }

    /// Add a metadata entry.
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Options for a single-request object upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutObjectOptions {
    /// Content type.
    pub content_type: Option<String>,
    /// Canned ACL.
    pub acl: Option<CannedAcl>,
    /// Storage class.
    pub storage_class: Option<StorageClass>,
    /// `Cache-Control` header.
    pub cache_control: Option<String>,
    /// `Content-Disposition` header.
    pub content_disposition: Option<String>,
    /// `Content-Encoding` header.
    pub content_encoding: Option<String>,
    /// `Content-Language` header.
    pub content_language: Option<String>,
    /// `Expires` header.
    pub expires: Option<DateTime<Utc>>,
    /// User metadata.
    pub metadata: BTreeMap<String, String>,
}

impl PutObjectOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the content type.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the canned ACL.
    pub fn acl(mut self, acl: CannedAcl) -> Self {
        self.acl = Some(acl);
        self
    }

    /// Set the canned ACL from a loosely written string.
    pub fn acl_str(self, acl: &str) -> Result<Self, RequestError> {
        Ok(self.acl(CannedAcl::normalize(acl)?))
    }

    /// Set the storage class.
    pub fn storage_class(mut self, storage_class: StorageClass) -> Self {
        self.storage_class = Some(storage_class);
        self
    }

    /// Set the storage class from a loosely written string.
    pub fn storage_class_str(self, storage_class: &str) -> Result<Self, RequestError> {
        Ok(self.storage_class(StorageClass::normalize(storage_class)?))
    }

    /// Set `Cache-Control`.
    pub fn cache_control(mut self, value: impl Into<String>) -> Self {
        self.cache_control = Some(value.into());
        self
    }

    /// Set `Content-Disposition`.
    pub fn content_disposition(mut self, value: impl Into<String>) -> Self {
        self.content_disposition = Some(value.into());
        self
    }

    /// Set `Content-Encoding`.
    pub fn content_encoding(mut self, value: impl Into<String>) -> Self {
        self.content_encoding = Some(value.into());
        self
    }

    /// Set `Content-Language`.
    pub fn content_language(mut self, value: impl Into<String>) -> Self {
        self.content_language = Some(value.into());
        self
    }

    /// Set `Expires`.
    pub fn expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Add a metadata entry.
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Options for listing in-progress multipart uploads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListUploadsOptions {
    /// Only uploads whose key starts with this prefix.
    pub prefix: Option<String>,
    /// Pagination key marker.
    pub key_marker: Option<String>,
    /// Pagination upload-id marker.
    pub upload_id_marker: Option<String>,
    /// Page size.
    pub max_uploads: Option<u32>,
}

impl ListUploadsOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set the key marker.
    pub fn key_marker(mut self, marker: impl Into<String>) -> Self {
        self.key_marker = Some(marker.into());
        self
    }

    /// Set the upload-id marker.
    pub fn upload_id_marker(mut self, marker: impl Into<String>) -> Self {
        self.upload_id_marker = Some(marker.into());
        self
    }

    /// Set the page size.
    pub fn max_uploads(mut self, max: u32) -> Self {
        self.max_uploads = Some(max);
        self
    }
}

/// Options for listing the parts of one upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPartsOptions {
    /// Return parts after this part number.
    pub part_number_marker: Option<u32>,
    /// Page size.
    pub max_parts: Option<u32>,
}

impl ListPartsOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the part-number marker.
    pub fn part_number_marker(mut self, marker: u32) -> Self {
        self.part_number_marker = Some(marker);
        self
    }

    /// Set the page size.
    pub fn max_parts(mut self, max: u32) -> Self {
        self.max_parts = Some(max);
        self
    }
}

/// Options for a presigned GET URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignGetOptions {
    /// Validity in seconds.
    pub expires_in: u64,
    /// Override `Content-Type` of the response.
    pub response_content_type: Option<String>,
    /// Override `Content-Disposition` of the response.
    pub response_content_disposition: Option<String>,
}

impl Default for PresignGetOptions {
    fn default() -> Self {
        Self {
            expires_in: DEFAULT_PRESIGN_EXPIRES_IN,
            response_content_type: None,
            response_content_disposition: None,
        }
    }
}

impl PresignGetOptions {
    /// Create options with the default expiry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the validity in seconds.
    pub fn expires_in(mut self, seconds: u64) -> Self {
        self.expires_in = seconds;
        self
    }

    /// Set the response content type override.
    pub fn response_content_type(mut self, value: impl Into<String>) -> Self {
        self.response_content_type = Some(value.into());
        self
    }

    /// Set the response content disposition override.
    pub fn response_content_disposition(mut self, value: impl Into<String>) -> Self {
        self.response_content_disposition = Some(value.into());
        self
    }
}

/// Options for a presigned PUT URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignPutOptions {
    /// Validity in seconds.
    pub expires_in: u64,
    /// Content type the upload must be sent with.
    pub content_type: Option<String>,
}

impl Default for PresignPutOptions {
    fn default() -> Self {
        Self {
            expires_in: DEFAULT_PRESIGN_EXPIRES_IN,
            content_type: None,
        }
    }
}

impl PresignPutOptions {
    /// Create options with the default expiry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the validity in seconds.
    pub fn expires_in(mut self, seconds: u64) -> Self {
        self.expires_in = seconds;
        self
    }

    /// Set the content type that will be signed.
    pub fn content_type(mut self, value: impl Into<String>) -> Self {
        self.content_type = Some(value.into());
        self
    }
}
