//! Presign service for generating presigned URLs.

use crate::config::S3Config;
use crate::error::{RequestError, S3Error};
use crate::signing::{PresignInput, QueryParams, Signer};
use crate::types::*;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// Service for generating presigned URLs.
///
/// Presigning is purely local; no request is sent.
pub struct PresignService {
    config: Arc<S3Config>,
    signer: Signer,
}

impl PresignService {
    /// Create a new presign service.
    pub fn new(config: Arc<S3Config>, signer: Signer) -> Self {
        Self { config, signer }
    }

    /// Generate a presigned URL for GET (download).
    pub fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        options: &PresignGetOptions,
    ) -> Result<PresignedUrl, S3Error> {
        self.presign_get_at(bucket, key, options, &Utc::now())
    }

    /// Same as [`presign_get`](Self::presign_get) with an explicit signing time.
    pub fn presign_get_at(
        &self,
        bucket: &str,
        key: &str,
        options: &PresignGetOptions,
        timestamp: &DateTime<Utc>,
    ) -> Result<PresignedUrl, S3Error> {
        let mut query = QueryParams::new();
        query
            .push_opt(
                "response-content-disposition",
                options.response_content_disposition.as_deref(),
            )
            .push_opt(
                "response-content-type",
                options.response_content_type.as_deref(),
            );

        self.presign("GET", bucket, key, options.expires_in, query, Vec::new(), timestamp)
    }

    /// Generate a presigned URL for PUT (upload).
    ///
    /// When a content type is given it is signed, and the upload must send
    /// the same `Content-Type`.
    pub fn presign_put(
        &self,
        bucket: &str,
        key: &str,
        options: &PresignPutOptions,
    ) -> Result<PresignedUrl, S3Error> {
        self.presign_put_at(bucket, key, options, &Utc::now())
    }

    /// Same as [`presign_put`](Self::presign_put) with an explicit signing time.
    pub fn presign_put_at(
        &self,
        bucket: &str,
        key: &str,
        options: &PresignPutOptions,
        timestamp: &DateTime<Utc>,
    ) -> Result<PresignedUrl, S3Error> {
        let headers = options
            .content_type
            .iter()
            .map(|content_type| ("content-type".to_string(), content_type.clone()))
            .collect();

        self.presign(
            "PUT",
            bucket,
            key,
            options.expires_in,
            QueryParams::new(),
            headers,
            timestamp,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn presign(
        &self,
        method: &str,
        bucket: &str,
        key: &str,
        expires_in: u64,
        query: QueryParams,
        headers: Vec<(String, String)>,
        timestamp: &DateTime<Utc>,
    ) -> Result<PresignedUrl, S3Error> {
        if expires_in == 0 {
            return Err(S3Error::Request(RequestError::Validation {
                message: "Presigned URL expiry must be positive".to_string(),
            }));
        }

        let origin = self.config.origin();
        let host = self.config.host_header();
        let path = format!(
            "{}{}",
            self.config.path_prefix(),
            self.config.object_path(bucket, key)
        );

        let presigned = self.signer.presign(
            PresignInput {
                method,
                base_url: &origin,
                host: &host,
                path: &path,
                expires_in,
                query,
                headers,
            },
            timestamp,
        );

        debug!(
            method = method,
            bucket = bucket,
            key = key,
            expires_in = expires_in,
            "Generated presigned URL"
        );
        Ok(presigned)
    }
}

impl std::fmt::Debug for PresignService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresignService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
