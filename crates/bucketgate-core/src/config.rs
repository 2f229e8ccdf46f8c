//! Engine-wide configuration.
//!
//! Configuration is driven by environment variables (`LOG_LEVEL`, `LOG_FORMAT`).

/// Global configuration for bucketgate.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketgateConfig {
    /// Log level filter used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text.
    pub json_logs: bool,
}

impl Default for BucketgateConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            json_logs: false,
        }
    }
}

impl BucketgateConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `LOG_LEVEL` | `info` |
    /// | `LOG_FORMAT` | `text` (`json` enables JSON lines) |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Ok(v) = std::env::var("LOG_FORMAT") {
            config.json_logs = v.eq_ignore_ascii_case("json");
        }

        config
    }
}
