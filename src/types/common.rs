//! Common enums and data types.

use crate::error::RequestError;

/// S3 storage class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageClass {
    /// Standard storage for frequently accessed data.
    #[default]
    Standard,
    /// Reduced redundancy storage (not recommended).
    ReducedRedundancy,
    /// Standard-IA for infrequently accessed data.
    StandardIa,
    /// One Zone-IA for infrequently accessed, non-critical data.
    OnezoneIa,
    /// Intelligent-Tiering for unknown or changing access patterns.
    IntelligentTiering,
    /// Glacier Flexible Retrieval (formerly Glacier).
    Glacier,
    /// Glacier Deep Archive for long-term archive.
    DeepArchive,
    /// Glacier Instant Retrieval for archive data.
    GlacierInstantRetrieval,
    /// S3 Outposts storage class.
    Outposts,
}

impl StorageClass {
    /// Returns the S3 API string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageClass::Standard => "STANDARD",
            StorageClass::ReducedRedundancy => "REDUCED_REDUNDANCY",
            StorageClass::StandardIa => "STANDARD_IA",
            StorageClass::OnezoneIa => "ONEZONE_IA",
            StorageClass::IntelligentTiering => "INTELLIGENT_TIERING",
            StorageClass::Glacier => "GLACIER",
            StorageClass::DeepArchive => "DEEP_ARCHIVE",
            StorageClass::GlacierInstantRetrieval => "GLACIER_IR",
            StorageClass::Outposts => "OUTPOSTS",
        }
    }

    /// Parse a loosely written storage class.
    ///
    /// Uppercases and maps `-` to `_` before matching, so `standard-ia` and
    /// `STANDARD_IA` are the same class.
    pub fn normalize(value: &str) -> Result<Self, RequestError> {
        value
            .trim()
            .to_uppercase()
            .replace('-', "_")
            .parse()
            .map_err(|_| RequestError::InvalidStorageClass {
                value: value.to_string(),
            })
    }
}

impl std::str::FromStr for StorageClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STANDARD" => Ok(StorageClass::Standard),
            "REDUCED_REDUNDANCY" => Ok(StorageClass::ReducedRedundancy),
            "STANDARD_IA" => Ok(StorageClass::StandardIa),
            "ONEZONE_IA" => Ok(StorageClass::OnezoneIa),
            "INTELLIGENT_TIERING" => Ok(StorageClass::IntelligentTiering),
            "GLACIER" => Ok(StorageClass::Glacier),
            "DEEP_ARCHIVE" => Ok(StorageClass::DeepArchive),
            "GLACIER_IR" => Ok(StorageClass::GlacierInstantRetrieval),
            "OUTPOSTS" => Ok(StorageClass::Outposts),
            _ => Err(format!("Unknown storage class: {}", s)),
        }
    }
}

/// Canned ACL settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CannedAcl {
    /// Owner gets FULL_CONTROL. No one else has access rights (default).
    #[default]
    Private,
    /// Owner gets FULL_CONTROL. Everyone else gets READ access.
    PublicRead,
    /// Owner gets FULL_CONTROL. Everyone else gets READ and WRITE access.
    PublicReadWrite,
    /// Owner gets FULL_CONTROL. Authenticated users get READ access.
    AuthenticatedRead,
    /// Owner gets FULL_CONTROL. Amazon EC2 gets READ access to bundles.
    AwsExecRead,
    /// Object owner gets FULL_CONTROL. Bucket owner gets READ access.
    BucketOwnerRead,
    /// Both object and bucket owners get FULL_CONTROL.
    BucketOwnerFullControl,
}

impl CannedAcl {
    /// Returns the S3 API string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CannedAcl::Private => "private",
            CannedAcl::PublicRead => "public-read",
            CannedAcl::PublicReadWrite => "public-read-write",
            CannedAcl::AuthenticatedRead => "authenticated-read",
            CannedAcl::AwsExecRead => "aws-exec-read",
            CannedAcl::BucketOwnerRead => "bucket-owner-read",
            CannedAcl::BucketOwnerFullControl => "bucket-owner-full-control",
        }
    }

    /// Parse a loosely written ACL.
    ///
    /// Lowercases and maps `_` to `-` before matching, so `PUBLIC_READ` and
    /// `public-read` are the same ACL.
    pub fn normalize(value: &str) -> Result<Self, RequestError> {
        let normalized = value.trim().to_lowercase().replace('_', "-");
        match normalized.as_str() {
            "private" => Ok(CannedAcl::Private),
            "public-read" => Ok(CannedAcl::PublicRead),
            "public-read-write" => Ok(CannedAcl::PublicReadWrite),
            "authenticated-read" => Ok(CannedAcl::AuthenticatedRead),
            "aws-exec-read" => Ok(CannedAcl::AwsExecRead),
            "bucket-owner-read" => Ok(CannedAcl::BucketOwnerRead),
            "bucket-owner-full-control" => Ok(CannedAcl::BucketOwnerFullControl),
            _ => Err(RequestError::InvalidAcl {
                value: value.to_string(),
            }),
        }
    }
}

/// A part accepted by the service during a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UploadedPart {
    /// Part number (1-10000).
    pub part_number: u32,
    /// ETag with surrounding quotes removed.
    pub etag: String,
}

impl UploadedPart {
    /// Create a part record.
    pub fn new(part_number: u32, etag: impl Into<String>) -> Self {
        Self {
            part_number,
            etag: etag.into(),
        }
    }
}

/// Strip the double quotes S3 wraps ETags in.
pub fn strip_etag_quotes(etag: &str) -> String {
    etag.replace('"', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_class_normalize() {
        assert_eq!(StorageClass::normalize("standard").unwrap(), StorageClass::Standard);
        assert_eq!(
            StorageClass::normalize("standard-ia").unwrap(),
            StorageClass::StandardIa
        );
        assert_eq!(
            StorageClass::normalize("Glacier_IR").unwrap(),
            StorageClass::GlacierInstantRetrieval
        );
        assert!(matches!(
            StorageClass::normalize("cold"),
            Err(RequestError::InvalidStorageClass { .. })
        ));
    }

    #[test]
    fn test_canned_acl_normalize() {
        assert_eq!(CannedAcl::normalize("PUBLIC_READ").unwrap(), CannedAcl::PublicRead);
        assert_eq!(
            CannedAcl::normalize("bucket_owner_full_control").unwrap(),
            CannedAcl::BucketOwnerFullControl
        );
        assert_eq!(CannedAcl::normalize("aws-exec-read").unwrap().as_str(), "aws-exec-read");
        assert!(matches!(
            CannedAcl::normalize("everyone"),
            Err(RequestError::InvalidAcl { .. })
        ));
    }

    #[test]
    fn test_strip_etag_quotes() {
        assert_eq!(strip_etag_quotes("\"abc123\""), "abc123");
        assert_eq!(strip_etag_quotes("abc123"), "abc123");
    }
}
