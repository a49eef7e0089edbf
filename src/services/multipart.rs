//! Multipart upload coordination.
//!
//! A [`MultipartSession`] tracks one upload through
//! `Created -> PartsUploading -> Completed | Aborted`. Part uploads borrow
//! the session immutably, so several may be in flight at once; their results
//! are recorded afterwards with [`MultipartSession::record_part`] in any
//! order. The manifest is sorted only when `complete` builds it.

use crate::body::{content_md5, RequestBody};
use crate::error::{RequestError, ResponseError, S3Error};
use crate::executor::{Outcome, RequestExecutor, S3Response};
use crate::signing::QueryParams;
use crate::types::*;
use crate::xml;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Smallest valid part number.
pub const MIN_PART_NUMBER: u32 = 1;
/// Largest valid part number.
pub const MAX_PART_NUMBER: u32 = 10_000;

/// Lifecycle state of a multipart session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Upload id obtained, no part recorded yet.
    Created,
    /// At least one part recorded.
    PartsUploading,
    /// The service assembled the object.
    Completed,
    /// The service discarded the upload.
    Aborted,
}

impl SessionState {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Created => "created",
            SessionState::PartsUploading => "uploading",
            SessionState::Completed => "completed",
            SessionState::Aborted => "aborted",
        }
    }

    /// Whether no further calls are allowed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Aborted)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local state of one multipart upload.
#[derive(Debug, Clone)]
pub struct MultipartSession {
    bucket: String,
    key: String,
    upload_id: String,
    parts: Vec<UploadedPart>,
    state: SessionState,
}

impl MultipartSession {
    /// Session for an upload id obtained elsewhere, e.g. from `list_uploads`.
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
        upload_id: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            upload_id: upload_id.into(),
            parts: Vec::new(),
            state: SessionState::Created,
        }
    }

    /// Bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Upload id.
    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }

    /// Recorded parts in recording order.
    pub fn parts(&self) -> &[UploadedPart] {
        &self.parts
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Record an uploaded part.
    ///
    /// Recording is append-only; duplicates are kept and sent as recorded.
    pub fn record_part(&mut self, part: UploadedPart) -> Result<(), S3Error> {
        self.ensure_open()?;
        self.parts.push(part);
        self.state = SessionState::PartsUploading;
        Ok(())
    }

    /// The `CompleteMultipartUpload` document for the recorded parts.
    pub fn manifest(&self) -> String {
        xml::build_complete_multipart_xml(&self.parts)
    }

    fn ensure_open(&self) -> Result<(), S3Error> {
        if self.state.is_terminal() {
            return Err(S3Error::Request(RequestError::SessionClosed {
                upload_id: self.upload_id.clone(),
                state: self.state.to_string(),
            }));
        }
        Ok(())
    }

    fn object_path(&self, executor: &RequestExecutor) -> String {
        executor.config().object_path(&self.bucket, &self.key)
    }

    fn upload_query(&self) -> QueryParams {
        QueryParams::new().with("uploadId", &self.upload_id)
    }
}

/// Sequences the calls of multipart uploads.
pub struct MultipartCoordinator {
    executor: Arc<RequestExecutor>,
}

impl MultipartCoordinator {
    /// Create a coordinator over a shared executor.
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self { executor }
    }

    /// Start a multipart upload.
    pub async fn create(
        &self,
        bucket: &str,
        key: &str,
        options: &CreateMultipartOptions,
    ) -> Result<S3Response<MultipartSession>, S3Error> {
        let path = self.executor.config().object_path(bucket, key);
        let query = QueryParams::new().with("uploads", "");

        let mut headers = Vec::new();
        if let Some(content_type) = &options.content_type {
            headers.push(("content-type".to_string(), content_type.clone()));
        }
        if let Some(acl) = &options.acl {
            headers.push(("x-amz-acl".to_string(), acl.as_str().to_string()));
        }
        if let Some(storage_class) = &options.storage_class {
            headers.push((
                "x-amz-storage-class".to_string(),
                storage_class.as_str().to_string(),
            ));
        }
        for (name, value) in &options.metadata {
            headers.push((format!("x-amz-meta-{}", name), value.clone()));
        }

        let response = self
            .executor
            .post(&path, &query, headers, RequestBody::Empty, |raw| {
                let output = xml::parse_create_multipart_upload(&raw.text())?;
                Ok(MultipartSession::new(bucket, key, output.upload_id))
            })
            .await?;

        if let Outcome::Success(session) = &response.result {
            debug!(
                bucket = %bucket,
                key = %key,
                upload_id = %session.upload_id,
                "Multipart upload created"
            );
        }
        Ok(response)
    }

    /// Upload one part of a session.
    ///
    /// The returned part is not recorded; pass it to
    /// [`MultipartSession::record_part`].
    pub async fn upload_part(
        &self,
        session: &MultipartSession,
        part_number: u32,
        body: impl Into<RequestBody>,
    ) -> Result<S3Response<UploadedPart>, S3Error> {
        session.ensure_open()?;
        if !(MIN_PART_NUMBER..=MAX_PART_NUMBER).contains(&part_number) {
            return Err(S3Error::Request(RequestError::InvalidPartNumber { part_number }));
        }

        let body = body.into();
        let mut headers = Vec::new();
        if self.executor.config().part_content_md5 {
            if let RequestBody::Bytes(bytes) = &body {
                headers.push(("content-md5".to_string(), content_md5(bytes)));
            }
        }

        let query = session.upload_query().with("partNumber", part_number);
        let response = self
            .executor
            .put(&session.object_path(&self.executor), &query, headers, body, |raw| {
                let etag = raw.etag().ok_or_else(|| {
                    S3Error::Response(ResponseError::MissingField {
                        field: "ETag".to_string(),
                    })
                })?;
                Ok(UploadedPart::new(part_number, strip_etag_quotes(etag)))
            })
            .await?;

        if response.result.is_success() {
            debug!(
                upload_id = %session.upload_id,
                part_number = part_number,
                "Multipart part uploaded"
            );
        }
        Ok(response)
    }

    /// Complete a session with its recorded parts.
    ///
    /// The session becomes `Completed` only when the service accepts the
    /// manifest; after a failure it may be completed again or aborted.
    pub async fn complete(
        &self,
        session: &mut MultipartSession,
    ) -> Result<S3Response<CompleteMultipartOutput>, S3Error> {
        session.ensure_open()?;
        if session.parts.is_empty() {
            warn!(
                upload_id = %session.upload_id,
                "Completing multipart upload with no recorded parts"
            );
        }

        let manifest = Bytes::from(session.manifest());
        let headers = vec![("content-type".to_string(), "application/xml".to_string())];

        let response = self
            .executor
            .post(
                &session.object_path(&self.executor),
                &session.upload_query(),
                headers,
                RequestBody::Bytes(manifest),
                |raw| xml::parse_complete_multipart_upload(&raw.text()),
            )
            .await?;

        if response.result.is_success() {
            session.state = SessionState::Completed;
            debug!(
                upload_id = %session.upload_id,
                parts = session.parts.len(),
                "Multipart upload completed"
            );
        }
        Ok(response)
    }

    /// Abort a session.
    pub async fn abort(&self, session: &mut MultipartSession) -> Result<S3Response<()>, S3Error> {
        session.ensure_open()?;

        let response = self
            .executor
            .delete(
                &session.object_path(&self.executor),
                &session.upload_query(),
                Vec::new(),
                |_| Ok(()),
            )
            .await?;

        if response.result.is_success() {
            session.state = SessionState::Aborted;
            debug!(upload_id = %session.upload_id, "Multipart upload aborted");
        }
        Ok(response)
    }

    /// List in-progress uploads of a bucket.
    pub async fn list_uploads(
        &self,
        bucket: &str,
        options: &ListUploadsOptions,
    ) -> Result<S3Response<ListUploadsOutput>, S3Error> {
        let mut query = QueryParams::new().with("uploads", "");
        query
            .push_opt("prefix", options.prefix.as_deref())
            .push_opt("key-marker", options.key_marker.as_deref())
            .push_opt("upload-id-marker", options.upload_id_marker.as_deref())
            .push_opt("max-uploads", options.max_uploads);

        self.executor
            .get(
                &self.executor.config().bucket_path(bucket),
                &query,
                Vec::new(),
                |raw| xml::parse_list_multipart_uploads(&raw.text()),
            )
            .await
    }

    /// List the parts the service holds for an upload.
    pub async fn list_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        options: &ListPartsOptions,
    ) -> Result<S3Response<ListPartsOutput>, S3Error> {
        let mut query = QueryParams::new().with("uploadId", upload_id);
        query
            .push_opt("part-number-marker", options.part_number_marker)
            .push_opt("max-parts", options.max_parts);

        self.executor
            .get(
                &self.executor.config().object_path(bucket, key),
                &query,
                Vec::new(),
                |raw| xml::parse_list_parts(&raw.text()),
            )
            .await
    }

    /// Upload a buffer as a multipart object.
    ///
    /// Parts are uploaded one after another. Any failure after the upload
    /// was created aborts it before the error is returned.
    pub async fn upload(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        part_size: usize,
        options: &CreateMultipartOptions,
    ) -> Result<CompleteMultipartOutput, S3Error> {
        if part_size == 0 {
            return Err(S3Error::Request(RequestError::Validation {
                message: "part size must be greater than zero".to_string(),
            }));
        }
        let part_count = data.len().div_ceil(part_size).max(1);
        if part_count > MAX_PART_NUMBER as usize {
            return Err(S3Error::Request(RequestError::Validation {
                message: format!(
                    "{} bytes in parts of {} bytes needs {} parts, more than {}",
                    data.len(),
                    part_size,
                    part_count,
                    MAX_PART_NUMBER
                ),
            }));
        }

        let mut session = self.create(bucket, key, options).await?.into_result()?;

        match self.upload_parts(&mut session, &data, part_size).await {
            Ok(output) => Ok(output),
            Err(e) => {
                if !session.state.is_terminal() {
                    if let Err(abort_error) = self.abort(&mut session).await {
                        warn!(
                            upload_id = %session.upload_id,
                            error = %abort_error,
                            "Failed to abort multipart upload"
                        );
                    }
                }
                Err(e)
            }
        }
    }

    async fn upload_parts(
        &self,
        session: &mut MultipartSession,
        data: &Bytes,
        part_size: usize,
    ) -> Result<CompleteMultipartOutput, S3Error> {
        let mut offset = 0;
        let mut part_number = MIN_PART_NUMBER;

        loop {
            let end = (offset + part_size).min(data.len());
            let part = self
                .upload_part(session, part_number, data.slice(offset..end))
                .await?
                .into_result()?;
            session.record_part(part)?;

            offset = end;
            part_number += 1;
            if offset >= data.len() {
                break;
            }
        }

        self.complete(session).await?.into_result()
    }
}

impl fmt::Debug for MultipartCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipartCoordinator").finish_non_exhaustive()
    }
}
