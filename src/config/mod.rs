//! Configuration module for s3-parallel-put
//!
//! The benchmark reads its configuration exactly once at startup: sizing from
//! CLI flags, connection parameters from the environment (optionally backed by
//! a YAML connection file), and the required `CONCURRENCY` variable. The
//! resulting [`Config`] is immutable and passed by reference to the driver.

use crate::s3::Credentials;
use crate::upload::multipart::{DEFAULT_PART_SIZE, MIN_PART_SIZE};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Environment variable holding the number of parallel uploads
pub const ENV_CONCURRENCY: &str = "CONCURRENCY";
/// Environment variable holding the access key
pub const ENV_ACCESS_KEY: &str = "ACCESSKEY";
/// Environment variable holding the secret key
pub const ENV_SECRET_KEY: &str = "SECRETKEY";
/// Environment variable holding the target endpoint
pub const ENV_ENDPOINT: &str = "ENDPOINT";
/// Environment variable holding the target bucket
pub const ENV_BUCKET: &str = "BUCKET";
/// Environment variable holding the signing region
pub const ENV_REGION: &str = "REGION";
/// Environment variable holding the node identifier
pub const ENV_NODE: &str = "NODE";

/// Default object size (10MB)
pub const DEFAULT_OBJECT_SIZE: usize = 10 * 1024 * 1024;
/// Default number of metadata entries per object
pub const DEFAULT_META_COUNT: usize = 1;
/// Default size of each metadata value
pub const DEFAULT_META_SIZE: usize = 1024;
/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

// ============================================================================
// Validation Helpers
// ============================================================================

/// Validate that a URL starts with http:// or https://
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Turn a bare `host[:port]` endpoint into a URL.
///
/// MinIO-style deployments usually export `ENDPOINT=host:9000`, so a missing
/// scheme defaults to plain HTTP.
fn normalize_endpoint(endpoint: &str) -> String {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("Invalid CONCURRENCY value '{value}': {reason}")]
    InvalidConcurrency { value: String, reason: String },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Sizing options taken from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchOptions {
    pub object_size: usize,
    pub meta_count: usize,
    pub meta_size: usize,
    pub part_size: usize,
}

impl Default for BenchOptions {
    fn default() -> Self {
        Self {
            object_size: DEFAULT_OBJECT_SIZE,
            meta_count: DEFAULT_META_COUNT,
            meta_size: DEFAULT_META_SIZE,
            part_size: DEFAULT_PART_SIZE,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    pub bench: BenchConfig,
    pub s3: S3Config,
}

/// Workload shape of a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    /// Number of objects uploaded in parallel
    pub concurrency: usize,
    /// Payload size of every object in bytes
    pub object_size: usize,
    /// Number of metadata entries attached to every object
    pub meta_count: usize,
    /// Length of every metadata value
    pub meta_size: usize,
    /// Namespaces object keys when several harness instances share a bucket
    pub node: Option<String>,
}

/// S3 connection configuration
#[derive(Debug, Clone)]
pub struct S3Config {
    pub endpoint: String,
    pub bucket: String,
    pub region: String,
    pub credentials: Credentials,
    pub part_size: usize,
}

/// Connection settings read from an optional YAML file.
///
/// Every field is optional; environment variables win over file values.
///
/// ```yaml
/// endpoint: "${MINIO_HOST:-localhost:9000}"
/// bucket: bench
/// access_key: minioadmin
/// secret_key: minioadmin
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionFile {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub node: Option<String>,
}

/// Parse the `CONCURRENCY` value.
///
/// Zero is accepted and produces an empty run.
pub fn parse_concurrency(value: Option<&str>) -> Result<usize, ConfigError> {
    let value = value.ok_or(ConfigError::MissingVar(ENV_CONCURRENCY))?;
    value
        .trim()
        .parse::<usize>()
        .map_err(|e| ConfigError::InvalidConcurrency {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

impl Config {
    /// Build the configuration from the process environment
    pub fn load(
        options: BenchOptions,
        connection_file: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        Self::from_lookup(options, connection_file, |name| std::env::var(name).ok())
    }

    /// Build the configuration using `lookup` in place of the environment.
    ///
    /// `CONCURRENCY` is checked before anything else so a bad value fails
    /// without touching the connection file.
    pub fn from_lookup<F>(
        options: BenchOptions,
        connection_file: Option<&Path>,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let concurrency = parse_concurrency(lookup(ENV_CONCURRENCY).as_deref())?;

        let file = match connection_file {
            Some(path) => ConfigLoader::load_with(path, &lookup)?,
            None => ConnectionFile::default(),
        };

        let pick = |name: &'static str, fallback: Option<String>| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .or(fallback)
        };

        let endpoint =
            pick(ENV_ENDPOINT, file.endpoint).ok_or(ConfigError::MissingVar(ENV_ENDPOINT))?;
        let bucket = pick(ENV_BUCKET, file.bucket).ok_or(ConfigError::MissingVar(ENV_BUCKET))?;
        let access_key = pick(ENV_ACCESS_KEY, file.access_key)
            .ok_or(ConfigError::MissingVar(ENV_ACCESS_KEY))?;
        let secret_key = pick(ENV_SECRET_KEY, file.secret_key)
            .ok_or(ConfigError::MissingVar(ENV_SECRET_KEY))?;
        let region = pick(ENV_REGION, file.region).unwrap_or_else(|| DEFAULT_REGION.to_string());
        let node = pick(ENV_NODE, file.node);

        let config = Config {
            bench: BenchConfig {
                concurrency,
                object_size: options.object_size,
                meta_count: options.meta_count,
                meta_size: options.meta_size,
                node,
            },
            s3: S3Config {
                endpoint: normalize_endpoint(&endpoint),
                bucket,
                region,
                credentials: Credentials::new(access_key, secret_key),
                part_size: options.part_size,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_http_url(&self.s3.endpoint) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid endpoint '{}': must be host[:port] or an http(s) URL",
                self.s3.endpoint
            )));
        }

        if self.s3.bucket.trim().is_empty() {
            return Err(ConfigError::ValidationError("Bucket name cannot be empty".into()));
        }

        if self.s3.part_size == 0 {
            return Err(ConfigError::ValidationError("Part size must be greater than zero".into()));
        }

        if self.s3.part_size < MIN_PART_SIZE && self.bench.object_size > self.s3.part_size {
            tracing::warn!(
                part_size = self.s3.part_size,
                min_part_size = MIN_PART_SIZE,
                "Part size is below the S3 minimum; real S3 endpoints will reject the upload"
            );
        }

        if let Some(node) = &self.bench.node {
            if node.contains('/') {
                return Err(ConfigError::ValidationError(format!(
                    "Node identifier '{}' must not contain '/'",
                    node
                )));
            }
        }

        Ok(())
    }
}
