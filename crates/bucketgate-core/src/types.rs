//! Identity types shared across the access-control crates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::BucketgateError;

/// S3 canonical user ID (64 hex characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalUserId(String);

impl CanonicalUserId {
    /// Canonical ID of the default account owner.
    pub const DEFAULT: &str = "75aa57f09aa0c8caeab4f8c24e99d10f8e7faeebf76c078efc7c6caea54ba06a";

    /// Length of a canonical user ID.
    pub const LEN: usize = 64;

    /// Create a new canonical user ID from a string.
    ///
    /// # Errors
    /// Returns an error if the ID is not a 64-character hex string.
    pub fn new(id: impl Into<String>) -> Result<Self, BucketgateError> {
        let id = id.into();
        if id.len() != Self::LEN || !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(BucketgateError::InvalidCanonicalId(id));
        }
        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Get the canonical ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CanonicalUserId {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for CanonicalUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CanonicalUserId {
    type Error = BucketgateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CanonicalUserId> for String {
    fn from(value: CanonicalUserId) -> Self {
        value.0
    }
}

/// The owner of a bucket or object, or the identity behind a set of credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    /// The canonical user ID of the owner.
    pub id: CanonicalUserId,
    /// The display name of the owner.
    pub display_name: String,
}

impl Owner {
    /// Create a new owner.
    #[must_use]
    pub fn new(id: CanonicalUserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}

impl Default for Owner {
    fn default() -> Self {
        Self {
            id: CanonicalUserId::default(),
            display_name: "webfile".to_owned(),
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.display_name, self.id)
    }
}
