//! Thin wrapper around the `aws` CLI.
//!
//! AWS access stays behind this seam so the watcher core never links the
//! SDK: callers hand it a service subcommand and get parsed JSON back.
//! Failed invocations are classified once here, from the CLI's stderr.

use serde::de::DeserializeOwned;
use tokio::process::Command;
use tracing::debug;

use crate::error::FetchError;

/// Handle for invoking the `aws` CLI with a fixed region/profile.
#[derive(Debug, Clone, Default)]
pub struct AwsCli {
    region: Option<String>,
    profile: Option<String>,
}

impl AwsCli {
    /// Create a handle. `region` and `profile` fall back to the ambient AWS
    /// configuration when unset.
    pub fn new(region: Option<String>, profile: Option<String>) -> Self {
        Self { region, profile }
    }

    /// Run `aws <service> <args...> --output json` and parse the response.
    pub async fn call<T: DeserializeOwned>(
        &self,
        service: &str,
        args: &[&str],
    ) -> Result<T, FetchError> {
        let mut cmd = Command::new("aws");
        cmd.arg(service)
            .args(args)
            .args(["--output", "json"])
            // Dropping the in-flight future must not leave a fetch running
            // past the shutdown decision.
            .kill_on_drop(true);

        if let Some(region) = &self.region {
            cmd.args(["--region", region]);
        }
        if let Some(profile) = &self.profile {
            cmd.args(["--profile", profile]);
        }

        debug!(service, ?args, "invoking aws cli");

        let output = cmd.output().await.map_err(|e| {
            // A missing or broken `aws` binary takes down every fetch, so it
            // is loop-scoped rather than entity-scoped.
            FetchError::transient(format!("failed to run aws cli: {e}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::classify(stderr.trim().to_string()));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| FetchError::entity(format!("unexpected aws response: {e}")))
    }
}
