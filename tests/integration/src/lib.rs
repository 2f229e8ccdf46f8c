//! Integration tests for the bucketgate access-control engine.
//!
//! These tests drive [`AccessService`] end to end through its public
//! operations, the way an S3 front end would. They need no server and run
//! with a plain `cargo test -p bucketgate-integration`.

use std::sync::{Arc, Once};

use bucketgate_access::{AccessConfig, AccessService, RequestContext};
use bucketgate_auth::StaticCredentialProvider;
use bucketgate_core::{CanonicalUserId, Owner};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Access key of [`alice`], who owns the test buckets.
pub const ALICE_KEY: &str = "AKIDALICE";
/// Access key of [`bob`].
pub const BOB_KEY: &str = "AKIDBOB";
/// Email address registered for [`bob`].
pub const BOB_EMAIL: &str = "bob@example.com";

fn user(n: u8, name: &str) -> Owner {
    let id = CanonicalUserId::new(format!("{n:064x}"))
        .unwrap_or_else(|e| panic!("invalid canonical id for {name}: {e}"));
    Owner::new(id, name)
}

/// The first test user.
#[must_use]
pub fn alice() -> Owner {
    user(0xa1, "alice")
}

/// The second test user.
#[must_use]
pub fn bob() -> Owner {
    user(0xb0, "bob")
}

/// A canonical id no credential provider knows about.
#[must_use]
pub fn stranger_id() -> CanonicalUserId {
    CanonicalUserId::new("f".repeat(64)).unwrap_or_else(|e| panic!("invalid canonical id: {e}"))
}

/// Create a service that knows [`alice`] and [`bob`].
#[must_use]
pub fn service_with(config: AccessConfig) -> AccessService {
    init_tracing();

    let provider = StaticCredentialProvider::new(vec![
        (ALICE_KEY.to_owned(), alice()),
        (BOB_KEY.to_owned(), bob()),
    ])
    .with_email(BOB_EMAIL, bob().id);

    AccessService::new(config, Arc::new(provider))
}

/// Create a service with the default configuration.
#[must_use]
pub fn service() -> AccessService {
    service_with(AccessConfig::default())
}

/// Generate a unique bucket name for a test.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Create a private bucket owned by [`alice`] and return its name.
pub fn create_test_bucket(service: &AccessService, prefix: &str) -> String {
    let name = test_bucket_name(prefix);
    service
        .create_bucket(&RequestContext::user(alice()), &name, None, None)
        .unwrap_or_else(|e| panic!("failed to create bucket {name}: {e}"));
    name
}

mod test_acl;
mod test_cors;
mod test_policy;
mod test_presigned;
