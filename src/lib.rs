//! s3-parallel-put Library
//!
//! Concurrent upload benchmark for S3-compatible object stores.
//!
//! # Features
//!
//! - **Fan-out**: one upload task per object, all in flight at once
//! - **Fail fast**: any failed upload invalidates and aborts the run
//! - **S3 Compatible**: path-style addressing, works against MinIO
//! - **Multipart**: large payloads are split into 64MB parts
//! - **Machine-readable output**: record line or JSON for log collectors
//!
//! # Example
//!
//! ```no_run
//! use s3_parallel_put::bench::{self, report, OutputFormat, Workload};
//! use s3_parallel_put::config::{BenchOptions, Config};
//! use s3_parallel_put::s3::S3Client;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(BenchOptions::default(), None)?;
//!     let client = S3Client::connect(&config.s3).await?;
//!     let workload = Workload::generate(&config.bench);
//!     let run = bench::run(Arc::new(client), &workload).await?;
//!     println!("{}", report::render(OutputFormat::Human, &config.bench, &run)?);
//!     Ok(())
//! }
//! ```

pub mod bench;
pub mod config;
pub mod metrics;
pub mod s3;
pub mod upload;

// Re-export commonly used types
pub use bench::{BenchError, RunReport, Workload};
pub use config::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
