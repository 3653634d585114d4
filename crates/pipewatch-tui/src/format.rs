//! Snapshot formatting: raw fetch results into colored display lines.
//!
//! The formatter owns the one piece of business logic that must hold
//! exactly: step-level completion is trusted over an execution-level
//! "in progress" when they disagree, but an execution-level "failed" or
//! "stopped" is never overridden.

use pipewatch_core::timefmt::{elapsed_secs, format_duration};
use pipewatch_core::types::{MonitoredEntity, StatusSnapshot, Timestamp};
use pipewatch_fetch::FetchOutcome;

use crate::record::{DisplayRecord, StyledLine};
use crate::theme::ColorTag;

/// Marker prefixed to each rendered error detail line.
const ERROR_MARKER: &str = "\u{26a0} ";

/// Truncation limit for direct error messages.
const ERROR_MESSAGE_MAX: usize = 120;

/// Truncation limit for summary-type messages (second error line, commit
/// summaries).
const SUMMARY_MAX: usize = 80;

/// Commit hashes display as their first 8 characters.
const SHORT_HASH_LEN: usize = 8;

/// Status used for display, reconciled from the raw provider status and the
/// step analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveStatus {
    Succeeded,
    Failed,
    InProgress,
    Stopped,
    Unknown,
}

impl EffectiveStatus {
    /// Parse a raw provider status ("InProgress", "IN_PROGRESS", "Failed",
    /// "SUCCEEDED", ...) case-insensitively.
    fn from_raw(raw: &str) -> Self {
        let normalized: String = raw
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            "inprogress" => Self::InProgress,
            "stopped" | "stopping" => Self::Stopped,
            _ => Self::Unknown,
        }
    }

    /// Reconcile the raw status with the step analysis.
    ///
    /// A provider may report the parent execution "in progress" after every
    /// sub-step completed (eventual consistency); step-level completion wins
    /// there. Failed and stopped are never overridden, and an inconclusive
    /// step analysis falls back to the raw status.
    pub fn reconcile(raw: &str, current_step: Option<&str>) -> Self {
        let effective = Self::from_raw(raw);
        if effective == Self::InProgress && current_step == Some("Completed") {
            Self::Succeeded
        } else {
            effective
        }
    }
}

/// Turns one fetch outcome into the display record for its entity slot.
#[derive(Debug, Clone)]
pub struct SnapshotFormatter {
    line_budget: usize,
}

impl SnapshotFormatter {
    pub fn new(lines_per_entity: u16) -> Self {
        Self {
            line_budget: lines_per_entity as usize,
        }
    }

    /// Format a fetch outcome. Fetch errors produce a two-line record;
    /// snapshots produce name, status/step, commit, and error lines. Either
    /// way the record is padded to the fixed line budget.
    pub fn format(
        &self,
        entity: &MonitoredEntity,
        outcome: &FetchOutcome,
        now: Timestamp,
    ) -> DisplayRecord {
        let lines = match outcome {
            Err(e) => vec![
                StyledLine::new(ColorTag::Header, &entity.name),
                StyledLine::new(ColorTag::Bad, format!("Error: {}", e.message)),
            ],
            Ok(snapshot) => self.snapshot_lines(entity, snapshot, now),
        };

        DisplayRecord::from_lines(lines, self.line_budget)
    }

    fn snapshot_lines(
        &self,
        entity: &MonitoredEntity,
        snapshot: &StatusSnapshot,
        now: Timestamp,
    ) -> Vec<StyledLine> {
        let effective = EffectiveStatus::reconcile(&snapshot.status, snapshot.current_step.as_deref());

        let mut lines = vec![
            StyledLine::new(ColorTag::Header, &entity.name),
            status_line(snapshot, effective, now),
            commit_line(snapshot),
        ];

        if effective == EffectiveStatus::Failed {
            lines.extend(error_lines(entity, snapshot));
        }

        lines
    }
}

fn step_label(snapshot: &StatusSnapshot) -> String {
    snapshot
        .current_step
        .clone()
        .unwrap_or_else(|| snapshot.status.clone())
}

fn status_line(snapshot: &StatusSnapshot, effective: EffectiveStatus, now: Timestamp) -> StyledLine {
    let duration = format_duration(elapsed_secs(snapshot.started_at, snapshot.ended_at, now));

    match effective {
        EffectiveStatus::Succeeded => StyledLine::new(
            ColorTag::Good,
            format!("Completed | {duration} (completed)"),
        ),
        EffectiveStatus::Failed => StyledLine::new(
            ColorTag::Bad,
            format!("{} (FAILED) | {duration} (failed)", step_label(snapshot)),
        ),
        EffectiveStatus::InProgress => StyledLine::new(
            ColorTag::Active,
            format!("{} | {duration} (running)", step_label(snapshot)),
        ),
        EffectiveStatus::Stopped => StyledLine::new(
            ColorTag::Halted,
            format!("{} | {duration} (stopped)", step_label(snapshot)),
        ),
        // Raw passthrough for statuses we do not recognize
        EffectiveStatus::Unknown => StyledLine::new(ColorTag::Other, snapshot.status.clone()),
    }
}

fn commit_line(snapshot: &StatusSnapshot) -> StyledLine {
    let Some(hash) = snapshot.commit_hash.as_deref() else {
        return StyledLine::plain("N/A");
    };

    let short = short_hash(hash);
    match snapshot.commit_message.as_deref() {
        Some(message) => StyledLine::plain(format!("{short}: {}", commit_summary(message))),
        None => StyledLine::plain(short),
    }
}

fn error_lines(entity: &MonitoredEntity, snapshot: &StatusSnapshot) -> Vec<StyledLine> {
    if snapshot.error_details.is_empty() {
        // No structured details from the provider
        return vec![
            StyledLine::new(
                ColorTag::Bad,
                format!("{ERROR_MARKER}{} failed", step_label(snapshot)),
            ),
            StyledLine::new(
                ColorTag::Bad,
                format!(
                    "{ERROR_MARKER}Check the {} console for details",
                    entity.kind.console_name()
                ),
            ),
        ];
    }

    // First entry is the direct error message, second the provider summary;
    // each gets its own truncation limit.
    snapshot
        .error_details
        .iter()
        .take(2)
        .enumerate()
        .map(|(i, detail)| {
            let max = if i == 0 { ERROR_MESSAGE_MAX } else { SUMMARY_MAX };
            StyledLine::new(
                ColorTag::Bad,
                format!("{ERROR_MARKER}{}", truncate_ellipsis(detail, max)),
            )
        })
        .collect()
}

/// First 8 characters of a commit hash, or the whole string if shorter.
fn short_hash(hash: &str) -> String {
    hash.chars().take(SHORT_HASH_LEN).collect()
}

/// Truncate to `max` characters, appending "..." when anything was cut.
fn truncate_ellipsis(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}...")
    }
}

/// Resolve the displayable commit summary from a raw revision summary.
///
/// Some source providers emit the revision summary as a JSON blob carrying a
/// `CommitMessage` field; unwrap it when present, otherwise use the raw
/// string. Only the first line survives, truncated to the summary limit.
fn commit_summary(message: &str) -> String {
    let resolved = if message.trim_start().starts_with('{') {
        serde_json::from_str::<serde_json::Value>(message)
            .ok()
            .and_then(|v| v.get("CommitMessage")?.as_str().map(str::to_string))
            .unwrap_or_else(|| message.to_string())
    } else {
        message.to_string()
    };

    let first_line = resolved.lines().next().unwrap_or_default();
    truncate_ellipsis(first_line, SUMMARY_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pipewatch_core::types::now;
    use pipewatch_fetch::FetchError;

    fn formatter() -> SnapshotFormatter {
        SnapshotFormatter::new(6)
    }

    fn web_app() -> MonitoredEntity {
        MonitoredEntity::pipeline("web-app")
    }

    #[test]
    fn test_reconcile_step_completion_wins_over_in_progress() {
        assert_eq!(
            EffectiveStatus::reconcile("InProgress", Some("Completed")),
            EffectiveStatus::Succeeded
        );
        assert_eq!(
            EffectiveStatus::reconcile("IN_PROGRESS", Some("Completed")),
            EffectiveStatus::Succeeded
        );
    }

    #[test]
    fn test_reconcile_keeps_running_step() {
        assert_eq!(
            EffectiveStatus::reconcile("InProgress", Some("Deploy:Run")),
            EffectiveStatus::InProgress
        );
    }

    #[test]
    fn test_reconcile_never_overrides_failed_or_stopped() {
        assert_eq!(
            EffectiveStatus::reconcile("Failed", Some("Completed")),
            EffectiveStatus::Failed
        );
        assert_eq!(
            EffectiveStatus::reconcile("Stopped", Some("Completed")),
            EffectiveStatus::Stopped
        );
    }

    #[test]
    fn test_reconcile_inconclusive_falls_back_to_raw() {
        assert_eq!(
            EffectiveStatus::reconcile("InProgress", None),
            EffectiveStatus::InProgress
        );
        assert_eq!(
            EffectiveStatus::reconcile("SUCCEEDED", None),
            EffectiveStatus::Succeeded
        );
    }

    #[test]
    fn test_running_status_line() {
        let now = now();
        let snapshot = StatusSnapshot::new("InProgress")
            .with_step("Build:Compile")
            .with_times(Some(now - Duration::seconds(125)), None);

        let record = formatter().format(&web_app(), &Ok(snapshot), now);
        let status = &record.lines()[1];
        assert_eq!(status.text, "Build:Compile | 2m 5s (running)");
        assert_eq!(status.tag, ColorTag::Active);
    }

    #[test]
    fn test_reconciled_success_status_line() {
        let now = now();
        let snapshot = StatusSnapshot::new("InProgress")
            .with_step("Completed")
            .with_times(Some(now - Duration::seconds(125)), None);

        let record = formatter().format(&web_app(), &Ok(snapshot), now);
        let status = &record.lines()[1];
        assert_eq!(status.text, "Completed | 2m 5s (completed)");
        assert_eq!(status.tag, ColorTag::Good);
    }

    #[test]
    fn test_failed_status_line_and_generic_error_pair() {
        let now = now();
        let snapshot = StatusSnapshot::new("Failed")
            .with_step("Deploy:Run")
            .with_times(Some(now - Duration::seconds(60)), Some(now));

        let record = formatter().format(&web_app(), &Ok(snapshot), now);
        let status = &record.lines()[1];
        assert!(status.text.starts_with("Deploy:Run (FAILED)"));
        assert_eq!(status.tag, ColorTag::Bad);

        // No structured details: generic pair pointing at the console
        assert!(record.lines()[3].text.contains("Deploy:Run failed"));
        assert!(record.lines()[4].text.contains("CodePipeline console"));
        assert_eq!(record.lines()[4].tag, ColorTag::Bad);
    }

    #[test]
    fn test_error_lines_capped_at_two() {
        let now = now();
        let details: Vec<String> = (0..5).map(|i| format!("error {i}")).collect();
        let snapshot = StatusSnapshot::new("Failed")
            .with_step("Build:Test")
            .with_errors(details);

        let record = formatter().format(&web_app(), &Ok(snapshot), now);
        let error_count = record
            .lines()
            .iter()
            .filter(|l| l.text.starts_with(ERROR_MARKER))
            .count();
        assert_eq!(error_count, 2);
    }

    #[test]
    fn test_error_line_truncation_limits() {
        let now = now();
        let snapshot = StatusSnapshot::new("Failed")
            .with_step("Build:Test")
            .with_errors(vec!["d".repeat(150), "s".repeat(150)]);

        let record = formatter().format(&web_app(), &Ok(snapshot), now);
        let direct = &record.lines()[3].text;
        let summary = &record.lines()[4].text;

        assert!(direct.ends_with("..."));
        assert_eq!(direct.chars().count(), ERROR_MARKER.chars().count() + 123);
        assert_eq!(summary.chars().count(), ERROR_MARKER.chars().count() + 83);
    }

    #[test]
    fn test_succeeded_record_has_no_error_lines() {
        let now = now();
        let snapshot = StatusSnapshot::new("Succeeded")
            .with_step("Completed")
            .with_errors(vec!["stale detail".into()]);

        let record = formatter().format(&web_app(), &Ok(snapshot), now);
        assert!(record.lines()[3].is_blank());
        assert!(record.lines()[4].is_blank());
    }

    #[test]
    fn test_commit_hash_shortened_to_eight() {
        let now = now();
        let snapshot = StatusSnapshot::new("Succeeded").with_commit(
            Some("0123456789abcdef0123456789abcdef01234567".into()),
            None,
        );

        let record = formatter().format(&web_app(), &Ok(snapshot), now);
        assert_eq!(record.lines()[2].text, "01234567");
    }

    #[test]
    fn test_short_hash_kept_whole() {
        assert_eq!(short_hash("abc123"), "abc123");
    }

    #[test]
    fn test_commit_message_truncated_with_ellipsis() {
        let now = now();
        let snapshot = StatusSnapshot::new("Succeeded").with_commit(
            Some("0123456789abcdef".into()),
            Some("m".repeat(150)),
        );

        let record = formatter().format(&web_app(), &Ok(snapshot), now);
        let line = &record.lines()[2].text;
        assert!(line.starts_with("01234567: "));
        let message = &line["01234567: ".len()..];
        assert!(message.chars().count() <= 83);
        assert!(message.ends_with("..."));
    }

    #[test]
    fn test_commit_summary_unwraps_provider_json() {
        let summary =
            commit_summary(r#"{"ProviderType":"GitHub","CommitMessage":"Fix login flow"}"#);
        assert_eq!(summary, "Fix login flow");
    }

    #[test]
    fn test_commit_summary_falls_back_on_broken_json() {
        let raw = r#"{"CommitMessage": unterminated"#;
        assert_eq!(commit_summary(raw), raw);
    }

    #[test]
    fn test_commit_summary_uses_first_line_only() {
        assert_eq!(
            commit_summary("Fix login flow\n\nLonger body text"),
            "Fix login flow"
        );
    }

    #[test]
    fn test_no_commit_renders_na() {
        let record = formatter().format(&web_app(), &Ok(StatusSnapshot::new("Succeeded")), now());
        assert_eq!(record.lines()[2].text, "N/A");
    }

    #[test]
    fn test_fetch_error_record() {
        let outcome = Err(FetchError::entity("throttled"));
        let record = formatter().format(&web_app(), &outcome, now());

        assert_eq!(record.lines()[0].text, "web-app");
        assert_eq!(record.lines()[1].text, "Error: throttled");
        assert_eq!(record.lines()[1].tag, ColorTag::Bad);
        // No commit/step lines, padded with blanks to the budget
        assert_eq!(record.len(), 6);
        assert!(record.lines()[2..].iter().all(|l| l.is_blank()));
    }

    #[test]
    fn test_unknown_status_passthrough() {
        let record = formatter().format(&web_app(), &Ok(StatusSnapshot::new("Superseded")), now());
        let status = &record.lines()[1];
        assert_eq!(status.text, "Superseded");
        assert_eq!(status.tag, ColorTag::Other);
    }

    #[test]
    fn test_stopped_status_line() {
        let now = now();
        let snapshot = StatusSnapshot::new("Stopped")
            .with_step("Deploy:Run")
            .with_times(Some(now - Duration::seconds(45)), Some(now));

        let record = formatter().format(&web_app(), &Ok(snapshot), now);
        let status = &record.lines()[1];
        assert_eq!(status.text, "Deploy:Run | 45s (stopped)");
        assert_eq!(status.tag, ColorTag::Halted);
    }

    #[test]
    fn test_missing_start_time_renders_na_duration() {
        let record = formatter().format(
            &web_app(),
            &Ok(StatusSnapshot::new("InProgress").with_step("Build:Compile")),
            now(),
        );
        assert_eq!(record.lines()[1].text, "Build:Compile | N/A (running)");
    }
}
