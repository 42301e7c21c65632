//! Benchmark driver
//!
//! Builds the workload once (payload, object names, metadata), uploads every
//! object concurrently with one task per object, and measures the wall-clock
//! time until the last upload finishes.
//!
//! A run with a failed upload is not a valid measurement: the first error
//! aborts the remaining tasks and is returned instead of a report.
//!
//! # Example
//!
//! ```no_run
//! use s3_parallel_put::bench::{self, Workload};
//! use s3_parallel_put::config::{BenchOptions, Config};
//! use s3_parallel_put::s3::S3Client;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::load(BenchOptions::default(), None)?;
//! let client = S3Client::connect(&config.s3).await?;
//! let workload = Workload::generate(&config.bench);
//! let report = bench::run(Arc::new(client), &workload).await?;
//! println!("{:.2} objs/sec", report.stats.objects_per_sec);
//! # Ok(())
//! # }
//! ```

use crate::config::BenchConfig;
use crate::metrics;
use crate::upload::{Metadata, ObjectUploader, UploadError, UploadResult};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinSet;

pub mod report;

pub use report::{OutputFormat, RunStats};

/// Byte the payload is filled with
pub const FILLER_BYTE: u8 = b'a';

/// Prefix of every metadata key
pub const METADATA_KEY_PREFIX: &str = "test-metadata-key";

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Benchmark errors
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Upload of '{key}' failed: {source}")]
    Upload {
        key: String,
        #[source]
        source: UploadError,
    },

    #[error("Upload task failed: {0}")]
    TaskFailed(String),
}

/// Everything the upload tasks share, built once per run
#[derive(Debug, Clone)]
pub struct Workload {
    pub object_names: Vec<String>,
    pub payload: Bytes,
    pub metadata: Arc<Metadata>,
}

impl Workload {
    /// Generate the workload described by `config`
    pub fn generate(config: &BenchConfig) -> Self {
        Self {
            object_names: object_names(config.concurrency, config.node.as_deref()),
            payload: payload(config.object_size),
            metadata: Arc::new(metadata(config.meta_count, config.meta_size)),
        }
    }

    /// Number of objects in the run
    pub fn len(&self) -> usize {
        self.object_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_names.is_empty()
    }
}

/// Object keys `object1..objectN`, prefixed with `<node>-` when a node is set
pub fn object_names(count: usize, node: Option<&str>) -> Vec<String> {
    (1..=count)
        .map(|index| match node {
            Some(node) => format!("{}-object{}", node, index),
            None => format!("object{}", index),
        })
        .collect()
}

/// A payload of `size` filler bytes
pub fn payload(size: usize) -> Bytes {
    Bytes::from(vec![FILLER_BYTE; size])
}

/// `count` entries keyed `test-metadata-key-1..=count`, each with its own
/// random value of `value_size` letters
pub fn metadata(count: usize, value_size: usize) -> Metadata {
    (1..=count)
        .map(|index| {
            (
                format!("{}-{}", METADATA_KEY_PREFIX, index),
                random_letters(value_size),
            )
        })
        .collect()
}

/// Random ASCII letters from a non-cryptographic RNG
pub fn random_letters(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| LETTERS[rng.random_range(0..LETTERS.len())] as char)
        .collect()
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub objects: usize,
    pub object_size: usize,
    pub stats: RunStats,
}

/// Upload every object of `workload` concurrently and time the whole batch.
///
/// All tasks are spawned up front with no cap on in-flight uploads. On the
/// first failure the remaining tasks are aborted and that error is returned.
#[tracing::instrument(
    name = "bench.run",
    skip_all,
    fields(objects = workload.len(), object_size = workload.payload.len())
)]
pub async fn run(
    uploader: Arc<dyn ObjectUploader>,
    workload: &Workload,
) -> Result<RunReport, BenchError> {
    let started_at = Utc::now();
    let start = Instant::now();

    let mut tasks = JoinSet::new();
    for key in &workload.object_names {
        tasks.spawn(upload_object(
            Arc::clone(&uploader),
            key.clone(),
            workload.payload.clone(),
            Arc::clone(&workload.metadata),
        ));
    }

    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.map_err(|e| BenchError::TaskFailed(e.to_string()));
        if let Err(err) = outcome.and_then(|result| result) {
            tasks.abort_all();
            tracing::error!(error = %err, in_flight = tasks.len(), "Aborting run");
            return Err(err);
        }
    }

    let elapsed = start.elapsed();
    let finished_at = Utc::now();
    let stats = RunStats::compute(workload.len(), workload.payload.len(), elapsed);
    metrics::record_run(
        stats.elapsed_secs,
        stats.objects_per_sec,
        stats.mb_per_sec,
    );

    tracing::info!(
        objects = workload.len(),
        elapsed_secs = stats.elapsed_secs,
        objects_per_sec = stats.objects_per_sec,
        mb_per_sec = stats.mb_per_sec,
        "Run completed"
    );

    Ok(RunReport {
        started_at,
        finished_at,
        elapsed,
        objects: workload.len(),
        object_size: workload.payload.len(),
        stats,
    })
}

async fn upload_object(
    uploader: Arc<dyn ObjectUploader>,
    key: String,
    body: Bytes,
    metadata: Arc<Metadata>,
) -> Result<UploadResult, BenchError> {
    let start = Instant::now();

    match uploader.upload(&key, body, &metadata).await {
        Ok(result) => {
            let duration = start.elapsed().as_secs_f64();
            metrics::record_upload_success(result.bytes_written);
            metrics::record_upload_duration(result.method.as_str(), duration);
            tracing::debug!(
                key = %key,
                method = result.method.as_str(),
                parts = result.parts,
                duration_secs = duration,
                "Upload completed"
            );
            Ok(result)
        }
        Err(source) => {
            metrics::record_upload_failure();
            Err(BenchError::Upload { key, source })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_object_names_unique() {
        let names = object_names(100, None);
        assert_eq!(names.len(), 100);
        assert_eq!(names[0], "object1");
        assert_eq!(names[99], "object100");

        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), 100);
    }

    #[test]
    fn test_object_names_with_node() {
        let names = object_names(2, Some("node7"));
        assert_eq!(names, vec!["node7-object1", "node7-object2"]);
    }

    #[test]
    fn test_object_names_empty() {
        assert!(object_names(0, Some("node7")).is_empty());
    }

    #[test]
    fn test_payload_length() {
        for size in [0, 1, 1024, 10 * 1024 * 1024] {
            let payload = payload(size);
            assert_eq!(payload.len(), size);
            assert!(payload.iter().all(|b| *b == FILLER_BYTE));
        }
    }

    #[test]
    fn test_metadata_shape() {
        let metadata = metadata(5, 64);
        assert_eq!(metadata.len(), 5);
        for index in 1..=5 {
            let value = &metadata[&format!("test-metadata-key-{}", index)];
            assert_eq!(value.len(), 64);
            assert!(value.chars().all(|c| c.is_ascii_alphabetic()));
        }
    }

    #[test]
    fn test_metadata_empty() {
        assert!(metadata(0, 1024).is_empty());
    }

    #[test]
    fn test_metadata_zero_size_values() {
        let metadata = metadata(3, 0);
        assert_eq!(metadata.len(), 3);
        assert!(metadata.values().all(|v| v.is_empty()));
    }

    #[test]
    fn test_workload_generate() {
        let config = BenchConfig {
            concurrency: 4,
            object_size: 2048,
            meta_count: 2,
            meta_size: 16,
            node: None,
        };
        let workload = Workload::generate(&config);

        assert_eq!(workload.len(), 4);
        assert_eq!(workload.payload.len(), 2048);
        assert_eq!(workload.metadata.len(), 2);
    }
}
