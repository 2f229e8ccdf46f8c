//! Access engine configuration.
//!
//! Provides [`AccessConfig`] for tuning the enforcement engine. Values are
//! loaded from environment variables, falling back to S3-compatible defaults.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Access engine configuration.
///
/// # Examples
///
/// ```
/// use bucketgate_access::config::AccessConfig;
///
/// let config = AccessConfig::default();
/// assert_eq!(config.max_presigned_expires, 604_800);
/// assert!(!config.content_aware_block_public_policy);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct AccessConfig {
    /// Longest pre-signed URL lifetime accepted, in seconds.
    #[builder(default = 604_800)]
    pub max_presigned_expires: i64,

    /// When `true`, `BlockPublicPolicy` rejects only public policies instead
    /// of every policy write.
    #[builder(default = false)]
    pub content_aware_block_public_policy: bool,

    /// Maximum number of rules in a CORS configuration.
    #[builder(default = 100)]
    pub max_cors_rules: usize,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            max_presigned_expires: 604_800,
            content_aware_block_public_policy: false,
            max_cors_rules: 100,
        }
    }
}

impl AccessConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `BUCKETGATE_MAX_PRESIGNED_EXPIRES` | `604800` |
    /// | `BUCKETGATE_CONTENT_AWARE_BLOCK_PUBLIC_POLICY` | `false` |
    /// | `BUCKETGATE_MAX_CORS_RULES` | `100` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("BUCKETGATE_MAX_PRESIGNED_EXPIRES") {
            if let Ok(n) = v.parse::<i64>() {
                config.max_presigned_expires = n;
            }
        }
        if let Ok(v) = std::env::var("BUCKETGATE_CONTENT_AWARE_BLOCK_PUBLIC_POLICY") {
            config.content_aware_block_public_policy = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("BUCKETGATE_MAX_CORS_RULES") {
            if let Ok(n) = v.parse::<usize>() {
                config.max_cors_rules = n;
            }
        }

        config
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
