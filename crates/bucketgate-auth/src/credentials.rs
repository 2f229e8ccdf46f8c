//! Credential provider trait and implementations.
//!
//! A [`CredentialProvider`] answers two questions for the engine: which
//! canonical user stands behind an access key ID, and whether a canonical ID
//! or email address named in an ACL grant refers to a known user.

use std::collections::HashMap;

use bucketgate_core::{CanonicalUserId, Owner};

use crate::error::AuthError;

/// Trait for resolving identities from access key IDs and grantee references.
///
/// Implementations may back this with a database, configuration file,
/// or any other credential store.
pub trait CredentialProvider: Send + Sync {
    /// Resolve the canonical user behind an access key ID.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AccessKeyNotFound`] if the access key ID is not recognized.
    fn identify(&self, access_key_id: &str) -> Result<Owner, AuthError>;

    /// Look up a user by canonical ID.
    fn user_by_id(&self, id: &CanonicalUserId) -> Option<Owner>;

    /// Look up a user by email address (legacy email grantees).
    fn user_by_email(&self, email: &str) -> Option<Owner>;
}

/// A simple in-memory credential provider backed by a `HashMap`.
///
/// Email addresses resolve only after being registered through
/// [`StaticCredentialProvider::with_email`].
///
/// # Examples
///
/// ```
/// use bucketgate_auth::credentials::{CredentialProvider, StaticCredentialProvider};
/// use bucketgate_core::Owner;
///
/// let provider = StaticCredentialProvider::new(vec![("AKID".to_owned(), Owner::default())]);
///
/// let owner = provider.identify("AKID").unwrap();
/// assert_eq!(owner.display_name, "webfile");
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialProvider {
    by_access_key: HashMap<String, Owner>,
    by_email: HashMap<String, CanonicalUserId>,
}

impl StaticCredentialProvider {
    /// Create a new provider from an iterable of (access_key_id, owner) pairs.
    pub fn new(credentials: impl IntoIterator<Item = (String, Owner)>) -> Self {
        Self {
            by_access_key: credentials.into_iter().collect(),
            by_email: HashMap::new(),
        }
    }

    /// Register an email address for an existing canonical user.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>, id: CanonicalUserId) -> Self {
        self.by_email.insert(email.into().to_ascii_lowercase(), id);
        self
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn identify(&self, access_key_id: &str) -> Result<Owner, AuthError> {
        self.by_access_key
            .get(access_key_id)
            .cloned()
            .ok_or_else(|| AuthError::AccessKeyNotFound(access_key_id.to_owned()))
    }

    fn user_by_id(&self, id: &CanonicalUserId) -> Option<Owner> {
        self.by_access_key
            .values()
            .find(|owner| &owner.id == id)
            .cloned()
    }

    fn user_by_email(&self, email: &str) -> Option<Owner> {
        let id = self.by_email.get(&email.to_ascii_lowercase())?;
        self.user_by_id(id)
    }
}
