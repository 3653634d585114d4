//! CodeBuild status fetching.
//!
//! One fetch lists the project's most recent build id, then pulls that
//! build's detail via `batch-get-builds` and folds it into a
//! [`StatusSnapshot`].

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use pipewatch_core::types::{MonitoredEntity, StatusSnapshot, Timestamp};

use crate::StatusFetcher;
use crate::awscli::AwsCli;
use crate::awstime::deserialize_aws_time;
use crate::error::FetchError;

/// Fetches build project status via the `aws codebuild` CLI.
#[derive(Debug, Clone)]
pub struct BuildFetcher {
    aws: AwsCli,
}

impl BuildFetcher {
    pub fn new(aws: AwsCli) -> Self {
        Self { aws }
    }
}

#[async_trait]
impl StatusFetcher for BuildFetcher {
    #[instrument(level = "debug", skip_all, fields(project = %entity.name))]
    async fn fetch(&self, entity: &MonitoredEntity) -> Result<StatusSnapshot, FetchError> {
        let ids: BuildIdList = match self
            .aws
            .call(
                "codebuild",
                &[
                    "list-builds-for-project",
                    "--project-name",
                    &entity.name,
                    "--sort-order",
                    "DESCENDING",
                    "--max-items",
                    "1",
                ],
            )
            .await
        {
            Ok(ids) => ids,
            Err(e) if e.is_not_found() => return Ok(StatusSnapshot::empty("Not found")),
            Err(e) => return Err(e),
        };

        let Some(id) = ids.ids.first() else {
            return Ok(StatusSnapshot::empty("No builds"));
        };

        let batch: BuildBatch = self
            .aws
            .call("codebuild", &["batch-get-builds", "--ids", id])
            .await?;

        match batch.builds.first() {
            Some(build) => Ok(snapshot(build)),
            None => Ok(StatusSnapshot::empty("No builds")),
        }
    }
}

// =========================================================================
// AWS CLI response shapes
// =========================================================================

#[derive(Debug, Deserialize)]
struct BuildIdList {
    #[serde(default)]
    ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BuildBatch {
    #[serde(default)]
    builds: Vec<Build>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Build {
    #[serde(default)]
    build_status: Option<String>,
    #[serde(default)]
    current_phase: Option<String>,
    #[serde(default, deserialize_with = "deserialize_aws_time")]
    start_time: Option<Timestamp>,
    #[serde(default, deserialize_with = "deserialize_aws_time")]
    end_time: Option<Timestamp>,
    #[serde(default)]
    source_version: Option<String>,
    #[serde(default)]
    resolved_source_version: Option<String>,
    #[serde(default)]
    phases: Vec<BuildPhase>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildPhase {
    #[serde(default)]
    phase_type: Option<String>,
    #[serde(default)]
    phase_status: Option<String>,
    #[serde(default)]
    contexts: Vec<PhaseContext>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhaseContext {
    #[serde(default)]
    message: Option<String>,
}

// =========================================================================
// Normalization
// =========================================================================

fn failed_phase(build: &Build) -> Option<&BuildPhase> {
    build.phases.iter().find(|p| {
        p.phase_status
            .as_ref()
            .is_some_and(|s| s.eq_ignore_ascii_case("FAILED"))
    })
}

/// The failed phase wins; a finished build reads "Completed"; otherwise the
/// raw current phase passes through as the step label.
fn current_step(build: &Build) -> Option<String> {
    if let Some(phase) = failed_phase(build) {
        return phase.phase_type.clone();
    }

    match build.current_phase.as_deref() {
        Some(phase) if phase.eq_ignore_ascii_case("COMPLETED") => Some("Completed".to_string()),
        other => other.map(str::to_string),
    }
}

fn error_details(build: &Build) -> Vec<String> {
    let Some(phase) = failed_phase(build) else {
        return Vec::new();
    };

    phase
        .contexts
        .iter()
        .filter_map(|c| c.message.clone())
        .take(2)
        .collect()
}

fn snapshot(build: &Build) -> StatusSnapshot {
    StatusSnapshot {
        status: build
            .build_status
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        current_step: current_step(build),
        started_at: build.start_time,
        ended_at: build.end_time,
        commit_hash: build
            .resolved_source_version
            .clone()
            .or_else(|| build.source_version.clone()),
        // CodeBuild does not carry the commit message
        commit_message: None,
        error_details: error_details(build),
    }
}
