//! bucketgate - offline checks for S3 access configuration.
//!
//! Validates bucket policies and CORS configurations with the same rules
//! the access engine applies on `Put`, and evaluates CORS preflights.
//!
//! # Usage
//!
//! ```text
//! bucketgate policy <policy.json> <bucket>
//! bucketgate cors <cors.json> [<origin> <method> [<header>...]]
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `LOG_FORMAT` | `text` | `json` emits JSON lines |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |
//! | `BUCKETGATE_MAX_CORS_RULES` | `100` | Maximum CORS rules per bucket |

use std::path::Path;

use anyhow::{Context, Result, bail};
use bucketgate_access::{AccessConfig, BucketPolicy, CorsConfiguration, CorsMatcher};
use bucketgate_core::BucketgateConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage:\n  bucketgate policy <policy.json> <bucket>\n  bucketgate cors <cors.json> [<origin> <method> [<header>...]]";

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(config: &BucketgateConfig) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(&config.log_level)
            .with_context(|| format!("invalid log level filter: {}", config.log_level))?
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if config.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}

fn read_file(path: &str) -> Result<String> {
    std::fs::read_to_string(Path::new(path)).with_context(|| format!("failed to read {path}"))
}

fn check_policy(path: &str, bucket: &str) -> Result<()> {
    let text = read_file(path)?;
    let policy =
        BucketPolicy::parse(&text, bucket).with_context(|| format!("invalid policy {path}"))?;

    info!(
        bucket = %bucket,
        statements = policy.statements().len(),
        "policy is valid"
    );
    println!(
        "valid: {} statement(s), public: {}",
        policy.statements().len(),
        policy.is_public()
    );
    Ok(())
}

fn check_cors(path: &str, rest: &[String], config: &AccessConfig) -> Result<()> {
    let text = read_file(path)?;
    let cors: CorsConfiguration =
        serde_json::from_str(&text).with_context(|| format!("failed to parse {path}"))?;
    let matcher = cors
        .compile(config.max_cors_rules)
        .with_context(|| format!("invalid CORS configuration {path}"))?;

    info!(rules = matcher.configuration().rules.len(), "CORS configuration is valid");

    let [origin, method, headers @ ..] = rest else {
        println!("valid: {} rule(s)", matcher.configuration().rules.len());
        return Ok(());
    };

    let preflight = CorsMatcher::evaluate_preflight(
        Some(&matcher),
        Some(origin.as_str()),
        Some(method.as_str()),
        headers,
    );
    match preflight {
        Ok(allowed) => {
            for (name, value) in &allowed.to_header_map() {
                println!("{name}: {}", value.to_str().unwrap_or_default());
            }
        }
        Err(e) => println!("denied: {e}"),
    }
    Ok(())
}

fn main() -> Result<()> {
    let config = BucketgateConfig::from_env();
    init_tracing(&config)?;
    let access = AccessConfig::from_env();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [cmd, path, bucket] if cmd == "policy" => check_policy(path, bucket),
        [cmd, path, rest @ ..] if cmd == "cors" => check_cors(path, rest, &access),
        _ => bail!("{USAGE}"),
    }
}
