//! Shared type definitions used across PipeWatch crates.
//!
//! A [`MonitoredEntity`] identifies one pipeline or build project; a
//! [`StatusSnapshot`] is the normalized result of one status fetch for one
//! entity. Snapshots are recomputed every poll cycle and never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp type used throughout PipeWatch.
pub type Timestamp = DateTime<Utc>;

/// Get the current UTC timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Kind of AWS entity being monitored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A CodePipeline pipeline
    Pipeline,
    /// A CodeBuild project
    Build,
}

impl EntityKind {
    /// Name of the AWS console to point users at in error hints.
    pub fn console_name(&self) -> &'static str {
        match self {
            Self::Pipeline => "CodePipeline",
            Self::Build => "CodeBuild",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pipeline => write!(f, "pipeline"),
            Self::Build => write!(f, "build"),
        }
    }
}

/// A monitored pipeline or build project, identified by name.
///
/// The ordered entity list is built from configuration at startup and stays
/// immutable for the session; it defines both iteration order and layout
/// order, never reshuffled mid-session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredEntity {
    /// Entity name, unique within its kind
    pub name: String,
    /// Whether this is a pipeline or a build project
    pub kind: EntityKind,
}

impl MonitoredEntity {
    /// Create a pipeline entity.
    pub fn pipeline(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntityKind::Pipeline,
        }
    }

    /// Create a build project entity.
    pub fn build(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntityKind::Build,
        }
    }
}

impl std::fmt::Display for MonitoredEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}

/// Normalized result of one status fetch for one entity.
///
/// `status` carries the raw provider string ("InProgress", "IN_PROGRESS",
/// "Failed", "SUCCEEDED", ...); the formatter derives the effective display
/// status from it. Fetch-layer failures are not part of the snapshot; they
/// travel as errors alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Raw status string from the provider
    pub status: String,

    /// Human label of the active or failed stage-action / build phase,
    /// or "Completed" when step analysis shows everything done
    #[serde(default)]
    pub current_step: Option<String>,

    /// When the execution started
    #[serde(default)]
    pub started_at: Option<Timestamp>,

    /// When the execution reached a terminal state
    #[serde(default)]
    pub ended_at: Option<Timestamp>,

    /// Source revision id driving the execution
    #[serde(default)]
    pub commit_hash: Option<String>,

    /// Source revision summary; may be a JSON blob from some providers
    #[serde(default)]
    pub commit_message: Option<String>,

    /// Structured failure details, at most two short strings
    #[serde(default)]
    pub error_details: Vec<String>,
}

impl StatusSnapshot {
    /// Create a snapshot with just a raw status.
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            current_step: None,
            started_at: None,
            ended_at: None,
            commit_hash: None,
            commit_message: None,
            error_details: Vec::new(),
        }
    }

    /// Snapshot for an entity with no executions yet.
    ///
    /// "Not found" and "no executions" are ordinary snapshot variants, never
    /// fetch errors.
    pub fn empty(reason: impl Into<String>) -> Self {
        Self::new(reason)
    }

    /// Set the current step and return self for chaining.
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.current_step = Some(step.into());
        self
    }

    /// Set start/end timestamps and return self for chaining.
    pub fn with_times(mut self, started_at: Option<Timestamp>, ended_at: Option<Timestamp>) -> Self {
        self.started_at = started_at;
        self.ended_at = ended_at;
        self
    }

    /// Set commit info and return self for chaining.
    pub fn with_commit(mut self, hash: Option<String>, message: Option<String>) -> Self {
        self.commit_hash = hash;
        self.commit_message = message;
        self
    }

    /// Set error details and return self for chaining.
    pub fn with_errors(mut self, details: Vec<String>) -> Self {
        self.error_details = details;
        self
    }
}
