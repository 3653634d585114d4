//! # pipewatch-core
//!
//! Core types, errors, and configuration for the PipeWatch status watcher.
//!
//! This crate provides:
//! - [`WatchError`] - Error types shared by all PipeWatch crates
//! - [`config`] - Watch configuration loaded from `~/.pipewatch/config.yaml`
//! - [`logging`] - Tracing setup and log management utilities
//! - [`types`] - Monitored entities and status snapshots
//! - [`timefmt`] - Elapsed-time formatting for the status display
//!
//! ## Example
//!
//! ```no_run
//! use pipewatch_core::{Config, WatchError};
//!
//! fn main() -> pipewatch_core::Result<()> {
//!     let config = Config::load_default()?;
//!     config.validate()?;
//!     for entity in config.entities() {
//!         println!("watching {} ({})", entity.name, entity.kind);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod timefmt;
pub mod types;

// Re-export main types for convenience
pub use config::Config;
pub use error::{Result, WatchError};
pub use logging::{LogGuard, init_logging};
pub use types::{EntityKind, MonitoredEntity, StatusSnapshot, Timestamp};
