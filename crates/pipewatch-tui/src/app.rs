//! The steady-state poll loop: fetch, format, diff-render, sleep.
//!
//! A [`WatchSession`] owns the fetchers, the formatter, and the renderer's
//! previous-display cache; there is exactly one writer, so no locking is
//! involved. All fetches for a cycle complete before any rendering starts,
//! and a single interrupt cancels in-flight fetches, restores the cursor,
//! and exits cleanly.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use rand::Rng;
use tracing::{debug, error, info, warn};

use pipewatch_core::config::{Config, TRANSIENT_BACKOFF_SECS};
use pipewatch_core::error::Result;
use pipewatch_core::types::{self, MonitoredEntity, Timestamp};
use pipewatch_fetch::{StatusFetcher, fetch_all};

use crate::diff::DiffRenderer;
use crate::format::SnapshotFormatter;
use crate::layout::{HEADER_ROWS, LINES_PER_ENTITY, Layout};
use crate::terminal::Terminal;

/// Lifecycle of a watch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Validating configuration and building the layout
    Starting,
    /// Polling on the fixed cadence
    Running,
    /// Interrupt received; cursor restored, exiting cleanly
    ShuttingDown,
    /// A loop-fatal error ended the session
    Failed,
}

/// What a completed cycle asks of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Sleep out the remainder of the poll interval
    Normal,
    /// Loop-scoped failure: back off before retrying
    Backoff,
}

/// The poll loop driving the whole watch display.
pub struct WatchSession<T: Terminal> {
    entities: Vec<MonitoredEntity>,
    fetcher: Arc<dyn StatusFetcher>,
    formatter: SnapshotFormatter,
    renderer: DiffRenderer<T>,
    poll_interval: Duration,
    fetch_timeout: Duration,
    state: SessionState,
}

impl<T: Terminal> std::fmt::Debug for WatchSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSession")
            .field("entities", &self.entities)
            .field("poll_interval", &self.poll_interval)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<T: Terminal> WatchSession<T> {
    /// Validate the configuration, fix the layout, and prepare the session.
    ///
    /// Any failure here is fatal; the caller exits non-zero without ever
    /// entering the poll loop.
    pub fn new(config: &Config, fetcher: Arc<dyn StatusFetcher>, term: T) -> Result<Self> {
        config.validate()?;

        let entities = config.entities();
        let names: Vec<String> = entities.iter().map(|e| e.name.clone()).collect();
        let layout = Layout::plan(&names, LINES_PER_ENTITY, HEADER_ROWS)?;

        Ok(Self {
            entities,
            fetcher,
            formatter: SnapshotFormatter::new(LINES_PER_ENTITY),
            renderer: DiffRenderer::new(term, layout),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            state: SessionState::Starting,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run until an interrupt signal arrives or a loop-fatal error occurs.
    pub async fn run(&mut self) -> Result<()> {
        info!(entities = self.entities.len(), "entering watch loop");
        self.renderer.draw_skeleton()?;
        // The header is part of the static skeleton; entity slots stay
        // blank until the first fetches land.
        self.renderer.render_header_timestamp(Local::now())?;
        self.state = SessionState::Running;

        let result = tokio::select! {
            r = self.poll_forever() => r,
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupt received, cancelling in-flight fetches");
                Ok(())
            }
        };

        self.state = match &result {
            Ok(()) => SessionState::ShuttingDown,
            Err(e) => {
                error!(error = %e, "watch loop failed");
                SessionState::Failed
            }
        };

        self.renderer.restore_cursor()?;
        if self.state == SessionState::ShuttingDown {
            println!("pipewatch stopped.");
            info!("watch session shut down cleanly");
        }

        result
    }

    async fn poll_forever(&mut self) -> Result<()> {
        loop {
            // The cadence is measured start-of-cycle to start-of-cycle;
            // fetch and render time count against the interval. Overruns
            // are accepted, not compensated.
            let cycle_started = Instant::now();
            let outcome = self.run_cycle(types::now()).await?;

            let delay = match outcome {
                CycleOutcome::Normal => {
                    self.poll_interval.saturating_sub(cycle_started.elapsed())
                }
                CycleOutcome::Backoff => backoff_delay(),
            };
            tokio::time::sleep(delay).await;
        }
    }

    /// One poll cycle: fetch every entity concurrently, then render.
    ///
    /// An entity-scoped failure degrades to that entity's error record; a
    /// transient (credential-shaped) failure leaves the slots untouched,
    /// shows up on the reserved bottom row, and requests backoff.
    pub async fn run_cycle(&mut self, now: Timestamp) -> Result<CycleOutcome> {
        let outcomes = fetch_all(self.fetcher.as_ref(), &self.entities, self.fetch_timeout).await;

        // Every fetch is in; rendering for this cycle starts only now.
        self.renderer
            .render_header_timestamp(now.with_timezone(&Local))?;

        let mut transient: Option<String> = None;
        for (entity, outcome) in self.entities.iter().zip(&outcomes) {
            match outcome {
                Err(e) if e.is_transient() => {
                    if transient.is_none() {
                        transient = Some(e.message.clone());
                    }
                }
                _ => {
                    let record = self.formatter.format(entity, outcome, now);
                    self.renderer.render(&entity.name, record)?;
                }
            }
        }

        match transient {
            Some(message) => {
                warn!(%message, "transient loop error, backing off");
                self.renderer.render_transient_error(&message)?;
                Ok(CycleOutcome::Backoff)
            }
            None => {
                self.renderer.clear_transient_error()?;
                Ok(CycleOutcome::Normal)
            }
        }
    }

    #[cfg(test)]
    fn renderer_mut(&mut self) -> &mut DiffRenderer<T> {
        &mut self.renderer
    }
}

/// Transient backoff with a little jitter so a fleet of watchers does not
/// hammer the API in lockstep after a shared credential expiry.
fn backoff_delay() -> Duration {
    let jitter_ms = rand::rng().random_range(0..500);
    Duration::from_secs(TRANSIENT_BACKOFF_SECS) + Duration::from_millis(jitter_ms)
}
