//! Fetch-layer error taxonomy.
//!
//! Every provider failure is classified exactly once, at the fetch boundary,
//! into one of two kinds: scoped to a single entity, or loop-wide transient.
//! Call sites branch on [`FetchErrorKind`] instead of re-matching message
//! substrings.

use thiserror::Error;

/// How a fetch failure affects the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Scoped to one entity's API call; renders as that entity's error
    /// lines and leaves siblings and the loop untouched.
    Entity,
    /// Credential/auth-shaped failure affecting the whole loop; reported on
    /// the transient error row, and the loop backs off before retrying.
    Transient,
}

/// A fetch-layer failure, distinct from a pipeline-level "Failed" status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

/// Message fragments that mark a credential/auth-shaped failure.
const TRANSIENT_MARKERS: &[&str] = &[
    "expired",
    "token",
    "credential",
    "unauthorized",
    "access denied",
    "accessdenied",
    "sso",
];

/// Message fragments for "entity does not exist", which is a snapshot
/// variant rather than an error.
const NOT_FOUND_MARKERS: &[&str] = &["notfoundexception", "does not exist", "not found"];

impl FetchError {
    /// Create an entity-scoped fetch error.
    pub fn entity(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Entity,
            message: message.into(),
        }
    }

    /// Create a loop-scoped transient error.
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Transient,
            message: message.into(),
        }
    }

    /// Classify a raw provider error message.
    ///
    /// Credential/auth-shaped messages become [`FetchErrorKind::Transient`];
    /// everything else stays scoped to the entity whose call failed.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();

        if TRANSIENT_MARKERS.iter().any(|m| lowered.contains(m)) {
            Self::transient(message)
        } else {
            Self::entity(message)
        }
    }

    /// Returns true if this error should trigger loop backoff.
    pub fn is_transient(&self) -> bool {
        self.kind == FetchErrorKind::Transient
    }

    /// Returns true if the underlying failure means the entity does not
    /// exist; callers turn this into an empty snapshot instead of an error.
    pub fn is_not_found(&self) -> bool {
        let lowered = self.message.to_lowercase();
        NOT_FOUND_MARKERS.iter().any(|m| lowered.contains(m))
    }
}
