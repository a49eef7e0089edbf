//! S3-compatible object storage client core.
//!
//! Signs requests with AWS Signature Version 4, sends them over a pluggable
//! HTTP transport and interprets the answers. Works against AWS S3 and
//! compatible services (MinIO, Ceph, R2, LocalStack).
//!
//! # Features
//!
//! - **SigV4**: header signing and presigned URLs
//! - **Bodies**: bytes, seekable streams, one-shot readers and files
//! - **Streaming**: chunked downloads without buffering the object
//! - **Multipart**: explicit sessions plus a one-shot `upload` helper
//! - **Errors**: protocol failures classified into kinds and categories
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use s3_compat::{PutObjectOptions, S3Client};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), s3_compat::S3Error> {
//!     let client = s3_compat::create_client_from_env()?;
//!
//!     let output = client
//!         .objects()
//!         .put("my-bucket", "hello.txt", "Hello, S3!", &PutObjectOptions::new())
//!         .await?;
//!
//!     println!("Uploaded with ETag: {:?}", output.etag);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod body;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod executor;
pub mod mocks;
pub mod services;
pub mod signing;
pub mod transport;
pub mod types;
pub mod xml;

// Re-export main types at crate root
pub use body::{NormalizedBody, RequestBody, SeekableStream};
pub use client::{S3Client, S3ClientBuilder, S3ClientImpl};
pub use config::{S3Config, S3ConfigBuilder};
pub use credentials::AwsCredentials;
pub use error::{
    classify, classify_response, ConfigurationError, CredentialsError, ErrorCategory, ErrorKind,
    ErrorResult, NetworkError, RequestError, ResponseError, S3Error, TransferError,
};
pub use executor::{Outcome, RequestExecutor, S3Response};
pub use services::{
    MultipartCoordinator, MultipartSession, ObjectsService, PresignService, SessionState,
};
pub use signing::{PresignInput, QueryParams, Signer};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use types::{
    // Options
    CreateMultipartOptions,
    ListPartsOptions,
    ListUploadsOptions,
    PresignGetOptions,
    PresignPutOptions,
    PutObjectOptions,
    // Results
    CompleteMultipartOutput,
    CreateMultipartOutput,
    ListPartsOutput,
    ListUploadsOutput,
    MultipartUpload,
    ObjectMetadata,
    PartInfo,
    PresignedUrl,
    PutObjectOutput,
    // Common types
    CannedAcl,
    StorageClass,
    UploadedPart,
};

/// Create a new S3 client from environment variables.
///
/// This will attempt to read configuration from:
/// - `AWS_REGION` / `AWS_DEFAULT_REGION` for region
/// - `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY` for credentials
/// - `AWS_SESSION_TOKEN` for temporary credentials
/// - `AWS_ENDPOINT_URL_S3` / `AWS_ENDPOINT_URL` for custom endpoints
///
/// # Example
///
/// ```rust,no_run
/// let client = s3_compat::create_client_from_env()?;
/// # Ok::<(), s3_compat::S3Error>(())
/// ```
pub fn create_client_from_env() -> Result<S3ClientImpl> {
    S3ClientBuilder::new().from_env()?.build()
}

/// Create a new S3 client with explicit configuration.
///
/// # Example
///
/// ```rust,no_run
/// use s3_compat::{AwsCredentials, S3Config};
///
/// let config = S3Config::builder()
///     .region("us-west-2")
///     .credentials(AwsCredentials::new("AKID", "SECRET")?)
///     .endpoint("http://localhost:9000")?
///     .build()?;
///
/// let client = s3_compat::create_client(config)?;
/// # Ok::<(), s3_compat::S3Error>(())
/// ```
pub fn create_client(config: S3Config) -> Result<S3ClientImpl> {
    S3ClientBuilder::new().config(config).build()
}

/// Result type alias for S3 operations.
pub type Result<T> = std::result::Result<T, S3Error>;
