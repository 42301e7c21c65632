//! S3 Client module
//!
//! [`S3Client`] implements [`ObjectUploader`] on top of the AWS SDK for Rust.
//! One SDK client (and its connection pool) is shared by every upload task.
//!
//! # Features
//!
//! - **Static credentials**: access/secret key pair, no provider chain
//! - **Path-style addressing**: bucket in the URL path, as MinIO expects
//! - **No retries**: a failed request fails the upload
//! - **Multipart**: payloads larger than the part size are split
//!
//! # Example
//!
//! ```no_run
//! use s3_parallel_put::config::S3Config;
//! use s3_parallel_put::s3::{Credentials, S3Client};
//! use s3_parallel_put::upload::{Metadata, ObjectUploader};
//! use bytes::Bytes;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = S3Config {
//!     endpoint: "http://localhost:9000".to_string(),
//!     bucket: "bench".to_string(),
//!     region: "us-east-1".to_string(),
//!     credentials: Credentials::new("minioadmin", "minioadmin"),
//!     part_size: 64 * 1024 * 1024,
//! };
//!
//! let client = S3Client::connect(&config).await?;
//! let result = client
//!     .upload("object1", Bytes::from_static(b"hello"), &Metadata::new())
//!     .await?;
//! println!("ETag: {:?}", result.etag);
//! # Ok(())
//! # }
//! ```
//!
//! # Tracing
//!
//! | Operation | Span Name | Attributes |
//! |-----------|-----------|------------|
//! | PutObject | `s3.put_object` | bucket, key, bytes, etag |
//! | Multipart | `s3.multipart_upload` | bucket, key, bytes, upload_id, parts_count |
//! | UploadPart | `s3.upload_part` | upload_id, part_number, bytes |

use crate::config::S3Config;
use crate::metrics;
use crate::upload::multipart::{needs_multipart, plan_parts, PART_CONCURRENCY};
use crate::upload::{Metadata, ObjectUploader, UploadError, UploadMethod, UploadResult};
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use bytes::Bytes;
use futures::stream::{self, StreamExt, TryStreamExt};
use thiserror::Error;

mod credentials;

pub use credentials::Credentials;

/// S3 client errors
#[derive(Error, Debug)]
pub enum S3ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Flatten an SDK error, including its source chain, into an upload error
fn s3_error<E: std::error::Error>(err: E) -> UploadError {
    UploadError::S3Error(DisplayErrorContext(err).to_string())
}

/// Only send the metadata header set when there is something to send
fn metadata_header(metadata: &Metadata) -> Option<Metadata> {
    (!metadata.is_empty()).then(|| metadata.clone())
}

/// S3 Client
#[derive(Debug, Clone)]
pub struct S3Client {
    client: aws_sdk_s3::Client,
    bucket: String,
    part_size: usize,
}

impl S3Client {
    /// Create a client for the configured endpoint and bucket.
    ///
    /// No request is sent; connection problems surface on the first upload.
    pub async fn connect(config: &S3Config) -> Result<Self, S3ClientError> {
        if config.part_size == 0 {
            return Err(S3ClientError::ConfigError(
                "part size must be greater than zero".into(),
            ));
        }

        let credentials: aws_credential_types::Credentials = (&config.credentials).into();

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint)
            .credentials_provider(credentials)
            .retry_config(RetryConfig::disabled())
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        tracing::debug!(
            endpoint = %config.endpoint,
            bucket = %config.bucket,
            region = %config.region,
            part_size = config.part_size,
            "S3 client configured"
        );

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            part_size: config.part_size,
        })
    }

    /// Get the bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Get the multipart part size
    pub fn part_size(&self) -> usize {
        self.part_size
    }

    /// Upload an object with a single PutObject request
    #[tracing::instrument(
        name = "s3.put_object",
        skip(self, body, metadata),
        fields(
            s3.bucket = %self.bucket,
            s3.key = %key,
            upload.bytes = body.len(),
            s3.etag = tracing::field::Empty
        ),
        err
    )]
    pub async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        metadata: &Metadata,
    ) -> Result<UploadResult, UploadError> {
        let bytes_written = body.len() as u64;

        let output = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .set_metadata(metadata_header(metadata))
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(s3_error)?;

        let etag = output.e_tag().map(str::to_string);
        if let Some(etag) = &etag {
            tracing::Span::current().record("s3.etag", etag.as_str());
        }

        Ok(UploadResult {
            etag,
            method: UploadMethod::PutObject,
            parts: 1,
            bytes_written,
        })
    }

    /// Upload an object in `part_size` chunks.
    ///
    /// A failed part or completion aborts the multipart upload before the
    /// error is returned, so no orphaned parts are left behind.
    #[tracing::instrument(
        name = "s3.multipart_upload",
        skip(self, body, metadata),
        fields(
            s3.bucket = %self.bucket,
            s3.key = %key,
            upload.bytes = body.len(),
            s3.upload_id = tracing::field::Empty,
            parts_count = tracing::field::Empty
        ),
        err
    )]
    pub async fn multipart_upload(
        &self,
        key: &str,
        body: Bytes,
        metadata: &Metadata,
    ) -> Result<UploadResult, UploadError> {
        let plan = plan_parts(body.len(), self.part_size)?;
        let span = tracing::Span::current();
        span.record("parts_count", plan.len());

        let created = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .set_metadata(metadata_header(metadata))
            .send()
            .await
            .map_err(s3_error)?;

        let upload_id = created
            .upload_id()
            .ok_or(UploadError::MissingField("UploadId"))?
            .to_string();
        span.record("s3.upload_id", upload_id.as_str());

        let parts = stream::iter(plan)
            .map(|part| {
                self.upload_part(
                    key,
                    &upload_id,
                    part.part_number,
                    body.slice(part.offset..part.end()),
                )
            })
            .buffered(PART_CONCURRENCY)
            .try_collect::<Vec<_>>()
            .await;

        let parts = match parts {
            Ok(parts) => parts,
            Err(err) => {
                metrics::record_multipart_upload_failure();
                self.abort_multipart_upload(key, &upload_id).await;
                return Err(err);
            }
        };
        let parts_count = parts.len();

        let completed = self
            .client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(&upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .await;

        let output = match completed {
            Ok(output) => output,
            Err(err) => {
                metrics::record_multipart_upload_failure();
                self.abort_multipart_upload(key, &upload_id).await;
                return Err(s3_error(err));
            }
        };

        metrics::record_multipart_upload_success(parts_count);

        Ok(UploadResult {
            etag: output.e_tag().map(str::to_string),
            method: UploadMethod::Multipart,
            parts: parts_count,
            bytes_written: body.len() as u64,
        })
    }

    #[tracing::instrument(
        name = "s3.upload_part",
        skip_all,
        fields(
            s3.upload_id = %upload_id,
            s3.part_number = part_number,
            upload.bytes = body.len()
        ),
        err
    )]
    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        body: Bytes,
    ) -> Result<CompletedPart, UploadError> {
        let output = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(s3_error)?;

        Ok(CompletedPart::builder()
            .part_number(part_number)
            .set_e_tag(output.e_tag().map(str::to_string))
            .build())
    }

    /// Best effort; a failure here is logged and otherwise ignored
    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) {
        let result = self
            .client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await;

        match result {
            Ok(_) => tracing::info!(key = key, upload_id = upload_id, "Aborted multipart upload"),
            Err(err) => tracing::warn!(
                key = key,
                upload_id = upload_id,
                error = %DisplayErrorContext(&err),
                "Failed to abort multipart upload"
            ),
        }
    }
}

#[async_trait]
impl ObjectUploader for S3Client {
    async fn upload(
        &self,
        key: &str,
        body: Bytes,
        metadata: &Metadata,
    ) -> Result<UploadResult, UploadError> {
        if needs_multipart(body.len(), self.part_size) {
            self.multipart_upload(key, body, metadata).await
        } else {
            self.put_object(key, body, metadata).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(part_size: usize) -> S3Config {
        S3Config {
            endpoint: "http://localhost:9000".into(),
            bucket: "test-bucket".into(),
            region: "us-east-1".into(),
            credentials: Credentials::new("test-access", "test-secret"),
            part_size,
        }
    }

    #[tokio::test]
    async fn test_s3_client_creation() {
        let client = S3Client::connect(&test_config(8 * 1024 * 1024)).await.unwrap();
        assert_eq!(client.bucket(), "test-bucket");
        assert_eq!(client.part_size(), 8 * 1024 * 1024);
    }

    #[tokio::test]
    async fn test_zero_part_size_rejected() {
        let result = S3Client::connect(&test_config(0)).await;
        assert!(matches!(result, Err(S3ClientError::ConfigError(_))));
    }

    #[test]
    fn test_empty_metadata_not_sent() {
        assert!(metadata_header(&Metadata::new()).is_none());

        let mut metadata = Metadata::new();
        metadata.insert("test-metadata-key-1".into(), "value".into());
        assert_eq!(metadata_header(&metadata), Some(metadata.clone()));
    }
}
