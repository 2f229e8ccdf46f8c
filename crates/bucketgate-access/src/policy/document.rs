//! Bucket policy documents.
//!
//! A policy is parsed once, when it is written, into closed types. Unknown
//! fields, wrongly cased effects, foreign resources and unknown condition
//! operators are rejected with [`AccessError::MalformedPolicy`] so evaluation
//! never has to interpret raw JSON.

use std::collections::BTreeMap;

use bucketgate_auth::Principal;
use bucketgate_core::CanonicalUserId;
use serde::Deserialize;
use serde_json::Value;

use super::PolicyRequest;
use super::condition::Condition;
use super::wildcard;
use crate::error::{AccessError, AccessResult};

/// Versions accepted in the `Version` field.
const SUPPORTED_VERSIONS: [&str; 2] = ["2012-10-17", "2008-10-17"];

/// Prefix of every S3 resource ARN.
pub const S3_ARN_PREFIX: &str = "arn:aws:s3:::";

// ---------------------------------------------------------------------------
// Raw document
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
struct RawPolicy {
    version: Option<String>,
    id: Option<String>,
    statement: OneOrMany<RawStatement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
struct RawStatement {
    sid: Option<String>,
    effect: Effect,
    principal: Option<RawPrincipal>,
    not_principal: Option<RawPrincipal>,
    action: Option<OneOrMany<String>>,
    not_action: Option<OneOrMany<String>>,
    resource: Option<OneOrMany<String>>,
    not_resource: Option<OneOrMany<String>>,
    condition: Option<BTreeMap<String, BTreeMap<String, Value>>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPrincipal {
    Wildcard(String),
    Map(BTreeMap<String, OneOrMany<String>>),
}

// ---------------------------------------------------------------------------
// Compiled document
// ---------------------------------------------------------------------------

/// Statement effect. Case-sensitive on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Effect {
    /// Grant access.
    Allow,
    /// Refuse access, overriding any grant.
    Deny,
}

/// The principals a statement names.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PrincipalSet {
    /// `"*"` or `{"AWS": "*"}`: everyone, including anonymous callers.
    Any,
    Listed {
        aws: Vec<String>,
        canonical: Vec<CanonicalUserId>,
    },
}

impl PrincipalSet {
    fn matches(&self, principal: &Principal) -> bool {
        match self {
            Self::Any => true,
            Self::Listed { aws, canonical } => {
                let Some(id) = principal.id() else {
                    return false;
                };
                let root_arn = format!("arn:aws:iam::{id}:root");
                canonical.contains(id)
                    || aws
                        .iter()
                        .any(|entry| entry == id.as_str() || *entry == root_arn)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Clause<T> {
    Only(T),
    Except(T),
}

/// One compiled policy statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sid: Option<String>,
    effect: Effect,
    principals: Clause<PrincipalSet>,
    actions: Clause<Vec<String>>,
    resources: Clause<Vec<String>>,
    conditions: Vec<Condition>,
}

impl Statement {
    /// The statement ID, if any.
    #[must_use]
    pub fn sid(&self) -> Option<&str> {
        self.sid.as_deref()
    }

    /// The statement effect.
    #[must_use]
    pub fn effect(&self) -> Effect {
        self.effect
    }

    /// Whether the statement applies to a request.
    #[must_use]
    pub fn applies_to(&self, request: &PolicyRequest<'_>) -> bool {
        let principal_hit = match &self.principals {
            Clause::Only(set) => set.matches(request.principal),
            Clause::Except(set) => !set.matches(request.principal),
        };
        let action_hit = match &self.actions {
            Clause::Only(list) => list
                .iter()
                .any(|p| wildcard::is_match_ignore_case(p, request.action)),
            Clause::Except(list) => !list
                .iter()
                .any(|p| wildcard::is_match_ignore_case(p, request.action)),
        };
        let resource_hit = match &self.resources {
            Clause::Only(list) => list.iter().any(|p| wildcard::is_match(p, request.resource)),
            Clause::Except(list) => !list.iter().any(|p| wildcard::is_match(p, request.resource)),
        };

        principal_hit
            && action_hit
            && resource_hit
            && self.conditions.iter().all(|c| c.evaluate(request.context))
    }

    /// An unconditional `Allow` for every principal (or all but a few).
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.effect == Effect::Allow
            && self.conditions.is_empty()
            && matches!(
                self.principals,
                Clause::Only(PrincipalSet::Any) | Clause::Except(_)
            )
    }
}

/// A validated bucket policy.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketPolicy {
    raw: String,
    version: Option<String>,
    id: Option<String>,
    statements: Vec<Statement>,
}

impl BucketPolicy {
    /// Parse and validate a policy document for `bucket`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::MalformedPolicy`] when the text is not JSON,
    /// has unknown or missing fields, or names actions, resources,
    /// principals or conditions the engine cannot evaluate.
    pub fn parse(text: &str, bucket: &str) -> AccessResult<Self> {
        let raw: RawPolicy = serde_json::from_str(text)
            .map_err(|e| {
                AccessError::malformed_policy(format!("Policies must be valid JSON: {e}"))
            })?;

        if let Some(version) = &raw.version {
            if !SUPPORTED_VERSIONS.contains(&version.as_str()) {
                return Err(AccessError::malformed_policy(format!(
                    "The policy must contain a valid version string, got {version}"
                )));
            }
        }

        let statements = raw
            .statement
            .into_vec()
            .into_iter()
            .map(|s| compile_statement(s, bucket))
            .collect::<AccessResult<Vec<_>>>()?;
        if statements.is_empty() {
            return Err(AccessError::malformed_policy(
                "Policy statement must not be empty",
            ));
        }

        Ok(Self {
            raw: text.to_owned(),
            version: raw.version,
            id: raw.id,
            statements,
        })
    }

    /// The document as it was written.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The policy language version.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The policy ID.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Statements in document order.
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }
}

fn compile_statement(raw: RawStatement, bucket: &str) -> AccessResult<Statement> {
    let principals = match (raw.principal, raw.not_principal) {
        (Some(p), None) => Clause::Only(compile_principal(p)?),
        (None, Some(p)) => Clause::Except(compile_principal(p)?),
        _ => {
            return Err(AccessError::malformed_policy(
                "Statement must contain exactly one of Principal or NotPrincipal",
            ));
        }
    };

    let actions = match (raw.action, raw.not_action) {
        (Some(a), None) => Clause::Only(compile_actions(a)?),
        (None, Some(a)) => Clause::Except(compile_actions(a)?),
        _ => {
            return Err(AccessError::malformed_policy(
                "Statement must contain exactly one of Action or NotAction",
            ));
        }
    };

    let resources = match (raw.resource, raw.not_resource) {
        (Some(r), None) => Clause::Only(compile_resources(r, bucket)?),
        (None, Some(r)) => Clause::Except(compile_resources(r, bucket)?),
        _ => {
            return Err(AccessError::malformed_policy(
                "Statement must contain exactly one of Resource or NotResource",
            ));
        }
    };

    let mut conditions = Vec::new();
    for (operator, entries) in raw.condition.unwrap_or_default() {
        for (key, value) in &entries {
            conditions.push(Condition::parse(&operator, key, value)?);
        }
    }

    Ok(Statement {
        sid: raw.sid,
        effect: raw.effect,
        principals,
        actions,
        resources,
        conditions,
    })
}

fn compile_principal(raw: RawPrincipal) -> AccessResult<PrincipalSet> {
    let map = match raw {
        RawPrincipal::Wildcard(s) if s == "*" => return Ok(PrincipalSet::Any),
        RawPrincipal::Wildcard(s) => {
            return Err(AccessError::malformed_policy(format!(
                "Invalid principal in policy: {s}"
            )));
        }
        RawPrincipal::Map(map) => map,
    };

    let mut aws = Vec::new();
    let mut canonical = Vec::new();
    for (kind, values) in map {
        let values = values.into_vec();
        match kind.as_str() {
            "AWS" => {
                for value in values {
                    if value == "*" {
                        return Ok(PrincipalSet::Any);
                    }
                    if !is_valid_aws_principal(&value) {
                        return Err(AccessError::malformed_policy(format!(
                            "Invalid principal in policy: {value}"
                        )));
                    }
                    aws.push(value);
                }
            }
            "CanonicalUser" => {
                for value in values {
                    canonical.push(CanonicalUserId::new(&value).map_err(|_| {
                        AccessError::malformed_policy(format!(
                            "Invalid principal in policy: {value}"
                        ))
                    })?);
                }
            }
            // Service principals never match a caller of this engine.
            "Service" => {}
            other => {
                return Err(AccessError::malformed_policy(format!(
                    "Invalid principal type in policy: {other}"
                )));
            }
        }
    }

    Ok(PrincipalSet::Listed { aws, canonical })
}

fn is_valid_aws_principal(value: &str) -> bool {
    (value.len() == 12 && value.bytes().all(|b| b.is_ascii_digit()))
        || value.starts_with("arn:aws:iam::")
        || value.starts_with("arn:aws:sts::")
        || CanonicalUserId::new(value).is_ok()
}

fn compile_actions(raw: OneOrMany<String>) -> AccessResult<Vec<String>> {
    let actions = raw.into_vec();
    if actions.is_empty() {
        return Err(AccessError::malformed_policy("Action must not be empty"));
    }
    for action in &actions {
        let valid = action == "*"
            || action
                .get(..3)
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case("s3:"));
        if !valid {
            return Err(AccessError::malformed_policy(format!(
                "Policy has invalid action: {action}"
            )));
        }
    }
    Ok(actions)
}

fn compile_resources(raw: OneOrMany<String>, bucket: &str) -> AccessResult<Vec<String>> {
    let resources = raw.into_vec();
    if resources.is_empty() {
        return Err(AccessError::malformed_policy("Resource must not be empty"));
    }
    for resource in &resources {
        if resource == "*" {
            continue;
        }
        let in_bucket = resource.strip_prefix(S3_ARN_PREFIX).is_some_and(|path| {
            let bucket_part = path.split('/').next().unwrap_or_default();
            wildcard::is_match(bucket_part, bucket)
        });
        if !in_bucket {
            return Err(AccessError::malformed_policy(format!(
                "Policy has invalid resource: {resource}"
            )));
        }
    }
    Ok(resources)
}
