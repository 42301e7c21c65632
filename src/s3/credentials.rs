//! S3 Credentials Module
//!
//! Static credentials read once at startup. The secret is redacted from
//! `Debug` output so configuration can be logged safely.
//!
//! # Example
//!
//! ```
//! use s3_parallel_put::s3::Credentials;
//!
//! let creds = Credentials::new("access-key", "secret-key");
//! assert_eq!(creds.access_key_id(), "access-key");
//! assert!(!format!("{:?}", creds).contains("secret-key"));
//! ```

use std::fmt;

/// Provider name reported to the AWS SDK
const PROVIDER_NAME: &str = "s3-parallel-put-static";

/// Static access key / secret key pair
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
}

impl Credentials {
    /// Create new credentials
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    /// Get the access key ID
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Get the secret access key
    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

impl From<&Credentials> for aws_credential_types::Credentials {
    fn from(creds: &Credentials) -> Self {
        aws_credential_types::Credentials::new(
            creds.access_key_id.clone(),
            creds.secret_access_key.clone(),
            None,
            None,
            PROVIDER_NAME,
        )
    }
}
