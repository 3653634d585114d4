//! CodePipeline status fetching.
//!
//! One fetch issues `get-pipeline-state` for step analysis plus
//! `list-pipeline-executions` for the latest execution's status, timestamps,
//! and source revision, and folds both into a [`StatusSnapshot`].

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use pipewatch_core::types::{MonitoredEntity, StatusSnapshot, Timestamp};

use crate::StatusFetcher;
use crate::awscli::AwsCli;
use crate::awstime::deserialize_aws_time;
use crate::error::FetchError;

/// Fetches pipeline status via the `aws codepipeline` CLI.
#[derive(Debug, Clone)]
pub struct PipelineFetcher {
    aws: AwsCli,
}

impl PipelineFetcher {
    pub fn new(aws: AwsCli) -> Self {
        Self { aws }
    }
}

#[async_trait]
impl StatusFetcher for PipelineFetcher {
    #[instrument(level = "debug", skip_all, fields(pipeline = %entity.name))]
    async fn fetch(&self, entity: &MonitoredEntity) -> Result<StatusSnapshot, FetchError> {
        let state: PipelineState = match self
            .aws
            .call("codepipeline", &["get-pipeline-state", "--name", &entity.name])
            .await
        {
            Ok(state) => state,
            Err(e) if e.is_not_found() => return Ok(StatusSnapshot::empty("Not found")),
            Err(e) => return Err(e),
        };

        let executions: ExecutionList = self
            .aws
            .call(
                "codepipeline",
                &[
                    "list-pipeline-executions",
                    "--pipeline-name",
                    &entity.name,
                    "--max-items",
                    "1",
                ],
            )
            .await?;

        Ok(snapshot(
            &state,
            executions.pipeline_execution_summaries.first(),
        ))
    }
}

// =========================================================================
// AWS CLI response shapes
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipelineState {
    #[serde(default)]
    stage_states: Vec<StageState>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StageState {
    stage_name: String,
    #[serde(default)]
    latest_execution: Option<StageExecution>,
    #[serde(default)]
    action_states: Vec<ActionState>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StageExecution {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActionState {
    action_name: String,
    #[serde(default)]
    latest_execution: Option<ActionExecution>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActionExecution {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    error_details: Option<ErrorDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetails {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecutionList {
    #[serde(default)]
    pipeline_execution_summaries: Vec<ExecutionSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecutionSummary {
    #[serde(default)]
    status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_aws_time")]
    start_time: Option<Timestamp>,
    #[serde(default, deserialize_with = "deserialize_aws_time")]
    last_update_time: Option<Timestamp>,
    #[serde(default)]
    source_revisions: Vec<SourceRevision>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SourceRevision {
    #[serde(default)]
    revision_id: Option<String>,
    #[serde(default)]
    revision_summary: Option<String>,
}

// =========================================================================
// Normalization
// =========================================================================

fn status_is(status: Option<&String>, expected: &str) -> bool {
    status.is_some_and(|s| s.eq_ignore_ascii_case(expected))
}

/// Resolve the current step from stage/action states.
///
/// The active action wins, then the most recent failed action; "Completed"
/// only when every stage reports Succeeded. Anything else is inconclusive
/// and the caller falls back to the execution-level status.
fn current_step(state: &PipelineState) -> Option<String> {
    for stage in &state.stage_states {
        for action in &stage.action_states {
            let status = action.latest_execution.as_ref().and_then(|e| e.status.as_ref());
            if status_is(status, "InProgress") {
                return Some(format!("{}:{}", stage.stage_name, action.action_name));
            }
        }
    }

    for stage in &state.stage_states {
        for action in &stage.action_states {
            let status = action.latest_execution.as_ref().and_then(|e| e.status.as_ref());
            if status_is(status, "Failed") {
                return Some(format!("{}:{}", stage.stage_name, action.action_name));
            }
        }
    }

    let all_succeeded = !state.stage_states.is_empty()
        && state.stage_states.iter().all(|stage| {
            status_is(
                stage.latest_execution.as_ref().and_then(|e| e.status.as_ref()),
                "Succeeded",
            )
        });

    all_succeeded.then(|| "Completed".to_string())
}

/// Failure details from the first failed action: the direct error message
/// first, the action summary second.
fn error_details(state: &PipelineState) -> Vec<String> {
    let mut details = Vec::new();

    for stage in &state.stage_states {
        for action in &stage.action_states {
            let Some(execution) = &action.latest_execution else {
                continue;
            };
            if !status_is(execution.status.as_ref(), "Failed") {
                continue;
            }

            if let Some(message) = execution.error_details.as_ref().and_then(|d| d.message.clone()) {
                details.push(message);
            }
            if let Some(summary) = execution.summary.clone() {
                details.push(summary);
            }

            details.truncate(2);
            return details;
        }
    }

    details
}

fn snapshot(state: &PipelineState, latest: Option<&ExecutionSummary>) -> StatusSnapshot {
    let Some(execution) = latest else {
        return StatusSnapshot::empty("No executions");
    };

    let status = execution.status.clone().unwrap_or_else(|| "Unknown".to_string());
    let in_progress = status.eq_ignore_ascii_case("InProgress");
    let ended_at = (!in_progress).then_some(execution.last_update_time).flatten();

    let revision = execution.source_revisions.first();

    StatusSnapshot {
        current_step: current_step(state),
        started_at: execution.start_time,
        ended_at,
        commit_hash: revision.and_then(|r| r.revision_id.clone()),
        commit_message: revision.and_then(|r| r.revision_summary.clone()),
        error_details: error_details(state),
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUNNING_STATE: &str = r#"{
        "pipelineName": "web-app",
        "stageStates": [
            {
                "stageName": "Source",
                "latestExecution": {"pipelineExecutionId": "x", "status": "Succeeded"},
                "actionStates": [
                    {"actionName": "Checkout", "latestExecution": {"status": "Succeeded"}}
                ]
            },
            {
                "stageName": "Build",
                "latestExecution": {"pipelineExecutionId": "x", "status": "InProgress"},
                "actionStates": [
                    {"actionName": "Compile", "latestExecution": {"status": "InProgress"}}
                ]
            }
        ]
    }"#;

    const EXECUTIONS: &str = r#"{
        "pipelineExecutionSummaries": [
            {
                "pipelineExecutionId": "x",
                "status": "InProgress",
                "startTime": "2026-08-05T12:00:00+00:00",
                "lastUpdateTime": "2026-08-05T12:02:05+00:00",
                "sourceRevisions": [
                    {
                        "actionName": "Checkout",
                        "revisionId": "0123456789abcdef0123456789abcdef01234567",
                        "revisionSummary": "{\"ProviderType\":\"GitHub\",\"CommitMessage\":\"Fix login flow\"}"
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_running_pipeline_snapshot() {
        let state: PipelineState = serde_json::from_str(RUNNING_STATE).unwrap();
        let executions: ExecutionList = serde_json::from_str(EXECUTIONS).unwrap();

        let snap = snapshot(&state, executions.pipeline_execution_summaries.first());
        assert_eq!(snap.status, "InProgress");
        assert_eq!(snap.current_step.as_deref(), Some("Build:Compile"));
        assert!(snap.started_at.is_some());
        // Still running: no end time even though lastUpdateTime is present
        assert!(snap.ended_at.is_none());
        assert_eq!(
            snap.commit_hash.as_deref(),
            Some("0123456789abcdef0123456789abcdef01234567")
        );
        assert!(snap.commit_message.unwrap().contains("CommitMessage"));
    }

    #[test]
    fn test_failed_action_step_and_details() {
        let state: PipelineState = serde_json::from_str(
            r#"{
                "stageStates": [
                    {
                        "stageName": "Deploy",
                        "latestExecution": {"status": "Failed"},
                        "actionStates": [
                            {
                                "actionName": "Run",
                                "latestExecution": {
                                    "status": "Failed",
                                    "summary": "Deployment rolled back",
                                    "errorDetails": {"message": "Insufficient permissions on target"}
                                }
                            }
                        ]
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(current_step(&state).as_deref(), Some("Deploy:Run"));
        let details = error_details(&state);
        assert_eq!(details.len(), 2);
        assert_eq!(details[0], "Insufficient permissions on target");
        assert_eq!(details[1], "Deployment rolled back");
    }

    #[test]
    fn test_all_stages_succeeded_resolves_completed() {
        let state: PipelineState = serde_json::from_str(
            r#"{
                "stageStates": [
                    {"stageName": "Source", "latestExecution": {"status": "Succeeded"}, "actionStates": []},
                    {"stageName": "Build", "latestExecution": {"status": "Succeeded"}, "actionStates": []}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(current_step(&state).as_deref(), Some("Completed"));
    }

    #[test]
    fn test_inconclusive_step_analysis_is_none() {
        // One stage succeeded, one has no latestExecution yet: inconclusive,
        // the raw execution status must win downstream.
        let state: PipelineState = serde_json::from_str(
            r#"{
                "stageStates": [
                    {"stageName": "Source", "latestExecution": {"status": "Succeeded"}, "actionStates": []},
                    {"stageName": "Build", "actionStates": []}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(current_step(&state), None);
    }

    #[test]
    fn test_no_executions_snapshot() {
        let state: PipelineState = serde_json::from_str(r#"{"stageStates": []}"#).unwrap();
        let snap = snapshot(&state, None);
        assert_eq!(snap.status, "No executions");
        assert!(snap.current_step.is_none());
    }

    #[test]
    fn test_terminal_execution_gets_end_time() {
        let state: PipelineState = serde_json::from_str(r#"{"stageStates": []}"#).unwrap();
        let executions: ExecutionList = serde_json::from_str(
            r#"{
                "pipelineExecutionSummaries": [
                    {
                        "status": "Succeeded",
                        "startTime": 1754392800.0,
                        "lastUpdateTime": 1754392925.0,
                        "sourceRevisions": []
                    }
                ]
            }"#,
        )
        .unwrap();

        let snap = snapshot(&state, executions.pipeline_execution_summaries.first());
        assert_eq!(snap.status, "Succeeded");
        let elapsed = snap.ended_at.unwrap() - snap.started_at.unwrap();
        assert_eq!(elapsed.num_seconds(), 125);
    }
}
