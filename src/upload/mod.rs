//! Upload module
//!
//! The capability the benchmark drives: store one object under a key with a
//! set of metadata entries. [`crate::s3::S3Client`] is the production
//! implementation; tests substitute their own.

use bytes::Bytes;
use std::collections::HashMap;
use thiserror::Error;

pub mod multipart;

/// User metadata attached to every uploaded object
pub type Metadata = HashMap<String, String>;

/// Upload errors
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("S3 error: {0}")]
    S3Error(String),

    #[error("Missing {0} in S3 response")]
    MissingField(&'static str),

    #[error("Part size must be greater than zero")]
    InvalidPartSize,

    #[error("Upload needs {parts} parts, more than the {max} S3 allows")]
    TooManyParts { parts: usize, max: usize },
}

/// How an object was sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMethod {
    PutObject,
    Multipart,
}

impl UploadMethod {
    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadMethod::PutObject => "put_object",
            UploadMethod::Multipart => "multipart",
        }
    }
}

/// Upload result
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub etag: Option<String>,
    pub method: UploadMethod,
    pub parts: usize,
    pub bytes_written: u64,
}

/// Object upload capability
#[async_trait::async_trait]
pub trait ObjectUploader: Send + Sync {
    /// Upload `body` under `key` with `metadata`
    async fn upload(
        &self,
        key: &str,
        body: Bytes,
        metadata: &Metadata,
    ) -> Result<UploadResult, UploadError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_method_labels() {
        assert_eq!(UploadMethod::PutObject.as_str(), "put_object");
        assert_eq!(UploadMethod::Multipart.as_str(), "multipart");
    }

    #[test]
    fn test_too_many_parts_message() {
        let err = UploadError::TooManyParts {
            parts: 10001,
            max: 10000,
        };
        assert_eq!(
            err.to_string(),
            "Upload needs 10001 parts, more than the 10000 S3 allows"
        );
    }
}
