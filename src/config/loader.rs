//! Connection file loader with environment variable expansion

use super::{ConfigError, ConnectionFile};
use lazy_static::lazy_static;
use regex_lite::Regex;
use std::path::Path;

lazy_static! {
    // ${VAR} or ${VAR:-default}
    static ref ENV_VAR: Regex =
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}").expect("valid env var pattern");
}

/// Connection file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a connection file, expanding variables from the process environment
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ConnectionFile, ConfigError> {
        Self::load_with(path, &|name: &str| std::env::var(name).ok())
    }

    /// Load a connection file, expanding variables through `lookup`
    pub fn load_with<P, F>(path: P, lookup: &F) -> Result<ConnectionFile, ConfigError>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, lookup)
    }

    /// Parse connection file content
    pub fn parse<F>(content: &str, lookup: &F) -> Result<ConnectionFile, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let expanded = Self::expand_env_vars(content, lookup);
        if expanded.trim().is_empty() {
            return Ok(ConnectionFile::default());
        }
        Ok(serde_yaml::from_str(&expanded)?)
    }

    /// Expand `${VAR}` and `${VAR:-default}`.
    ///
    /// An unset variable without a default keeps its placeholder.
    fn expand_env_vars<F>(content: &str, lookup: &F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        ENV_VAR
            .replace_all(content, |cap: &regex_lite::Captures<'_>| {
                match lookup(&cap[1]) {
                    Some(value) => value,
                    None => cap
                        .get(2)
                        .map(|default| default.as_str().to_string())
                        .unwrap_or_else(|| cap[0].to_string()),
                }
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "MINIO_HOST" => Some("minio:9000".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_expand_env_vars() {
        let expanded = ConfigLoader::expand_env_vars("endpoint: ${MINIO_HOST}", &lookup);
        assert_eq!(expanded, "endpoint: minio:9000");
    }

    #[test]
    fn test_expand_default() {
        let expanded = ConfigLoader::expand_env_vars("bucket: ${BENCH_BUCKET:-bench}", &lookup);
        assert_eq!(expanded, "bucket: bench");
    }

    #[test]
    fn test_unset_without_default_kept() {
        let expanded = ConfigLoader::expand_env_vars("bucket: ${NOT_SET}", &lookup);
        assert_eq!(expanded, "bucket: ${NOT_SET}");
    }

    #[test]
    fn test_parse_connection_file() {
        let content = r#"
endpoint: "${MINIO_HOST}"
bucket: bench
access_key: minioadmin
secret_key: minioadmin
"#;
        let file = ConfigLoader::parse(content, &lookup).unwrap();
        assert_eq!(file.endpoint.as_deref(), Some("minio:9000"));
        assert_eq!(file.bucket.as_deref(), Some("bench"));
        assert!(file.region.is_none());
        assert!(file.node.is_none());
    }

    #[test]
    fn test_parse_empty_file() {
        let file = ConfigLoader::parse("", &lookup).unwrap();
        assert!(file.endpoint.is_none());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = ConfigLoader::parse("concurrency: 10\n", &lookup);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
