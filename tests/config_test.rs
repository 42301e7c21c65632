//! Configuration Integration Tests
//!
//! Loading the YAML connection file from disk and merging it with the
//! environment.

use s3_parallel_put::config::{BenchOptions, Config, ConfigError, ConfigLoader};
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

mod tests {
    use super::*;

    #[test]
    fn test_file_supplies_connection() {
        let file = write_file(
            r#"
endpoint: "${BENCH_MINIO:-localhost:9000}"
bucket: from-file
region: eu-central-1
access_key: file-access
secret_key: file-secret
node: file-node
"#,
        );

        let config = Config::from_lookup(
            BenchOptions::default(),
            Some(file.path()),
            env(&[("CONCURRENCY", "4")]),
        )
        .unwrap();

        assert_eq!(config.bench.concurrency, 4);
        assert_eq!(config.bench.node.as_deref(), Some("file-node"));
        assert_eq!(config.s3.endpoint, "http://localhost:9000");
        assert_eq!(config.s3.bucket, "from-file");
        assert_eq!(config.s3.region, "eu-central-1");
        assert_eq!(config.s3.credentials.access_key_id(), "file-access");
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = write_file(
            r#"
endpoint: localhost:9000
bucket: from-file
access_key: file-access
secret_key: file-secret
"#,
        );

        let config = Config::from_lookup(
            BenchOptions::default(),
            Some(file.path()),
            env(&[
                ("CONCURRENCY", "1"),
                ("BUCKET", "from-env"),
                ("ENDPOINT", "https://s3.example.com"),
            ]),
        )
        .unwrap();

        assert_eq!(config.s3.bucket, "from-env");
        assert_eq!(config.s3.endpoint, "https://s3.example.com");
        assert_eq!(config.s3.credentials.secret_access_key(), "file-secret");
    }

    #[test]
    fn test_file_expansion_uses_lookup() {
        let file = write_file("endpoint: \"${BENCH_MINIO}\"\nbucket: b\n");
        let loaded =
            ConfigLoader::load_with(file.path(), &env(&[("BENCH_MINIO", "minio:9000")])).unwrap();

        assert_eq!(loaded.endpoint.as_deref(), Some("minio:9000"));
        assert_eq!(loaded.bucket.as_deref(), Some("b"));
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::load("/nonexistent/s3-parallel-put.yaml");
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_bad_concurrency_wins_over_missing_file() {
        let result = Config::from_lookup(
            BenchOptions::default(),
            Some(std::path::Path::new("/nonexistent/s3-parallel-put.yaml")),
            env(&[("CONCURRENCY", "ten")]),
        );
        assert!(matches!(result, Err(ConfigError::InvalidConcurrency { .. })));
    }
}
