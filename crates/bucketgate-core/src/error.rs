//! Error types for the bucketgate core.

/// Core error type for bucketgate infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum BucketgateError {
    /// Invalid canonical user ID format.
    #[error("invalid canonical user ID: {0} (must be a 64-character hex string)")]
    InvalidCanonicalId(String),
}
