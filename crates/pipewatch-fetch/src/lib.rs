//! # pipewatch-fetch
//!
//! Status fetching for PipeWatch.
//!
//! This crate provides:
//! - [`StatusFetcher`] - The narrow interface the poll loop consumes:
//!   given an entity, return a normalized [`StatusSnapshot`] or a
//!   classified [`FetchError`]
//! - [`PipelineFetcher`] / [`BuildFetcher`] - Independent AWS-CLI-backed
//!   implementations for pipelines and build projects, unified behind
//!   [`FetcherSet`]
//! - [`fetch_all`] - Concurrent per-cycle fan-out with a per-fetch timeout
//!
//! "Not found" and "no executions" are ordinary snapshot variants; only
//! fetch-layer failures (auth, network, rate limit, timeout) surface as
//! errors, pre-classified as entity-scoped or loop-transient.

pub mod awscli;
mod awstime;
pub mod build;
pub mod error;
pub mod pipeline;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use tracing::debug;

use pipewatch_core::types::{EntityKind, MonitoredEntity, StatusSnapshot};

pub use awscli::AwsCli;
pub use build::BuildFetcher;
pub use error::{FetchError, FetchErrorKind};
pub use pipeline::PipelineFetcher;

/// Outcome of one fetch for one entity.
pub type FetchOutcome = Result<StatusSnapshot, FetchError>;

/// Per-entity status source.
///
/// Implementations must not fail for ordinary "not found"/"no executions"
/// cases; those are snapshot variants. Fetch-layer failures come back as
/// [`FetchError`] with the loop-impact classification already applied.
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    async fn fetch(&self, entity: &MonitoredEntity) -> FetchOutcome;
}

/// Routes each entity to the fetcher for its kind.
pub struct FetcherSet {
    pipeline: Arc<dyn StatusFetcher>,
    build: Arc<dyn StatusFetcher>,
}

impl FetcherSet {
    pub fn new(pipeline: Arc<dyn StatusFetcher>, build: Arc<dyn StatusFetcher>) -> Self {
        Self { pipeline, build }
    }

    /// Build the AWS-CLI-backed fetcher pair sharing one region/profile.
    pub fn aws(aws: AwsCli) -> Self {
        Self::new(
            Arc::new(PipelineFetcher::new(aws.clone())),
            Arc::new(BuildFetcher::new(aws)),
        )
    }
}

#[async_trait]
impl StatusFetcher for FetcherSet {
    async fn fetch(&self, entity: &MonitoredEntity) -> FetchOutcome {
        match entity.kind {
            EntityKind::Pipeline => self.pipeline.fetch(entity).await,
            EntityKind::Build => self.build.fetch(entity).await,
        }
    }
}

/// Fetch every entity concurrently, one future per entity, each bounded by
/// `timeout`. Results come back aligned with `entities` order; the caller
/// renders only after all fetches complete, so a slow entity never
/// interleaves with a stale cycle's output.
///
/// A timed-out fetch is treated identically to an entity-scoped fetch error.
pub async fn fetch_all(
    fetcher: &dyn StatusFetcher,
    entities: &[MonitoredEntity],
    timeout: Duration,
) -> Vec<FetchOutcome> {
    let fetches = entities.iter().map(|entity| async move {
        match tokio::time::timeout(timeout, fetcher.fetch(entity)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(FetchError::entity(format!(
                "status fetch timed out after {}s",
                timeout.as_secs()
            ))),
        }
    });

    let outcomes = join_all(fetches).await;
    debug!(
        entities = entities.len(),
        failures = outcomes.iter().filter(|o| o.is_err()).count(),
        "cycle fetch complete"
    );
    outcomes
}
