//! Channel Launcher
//!
//! Hands the order deep link to the messaging channel by opening it.

use std::{io, process::ExitStatus};

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Errors raised while opening a deep link.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The opener program could not be started.
    #[error("failed to start {program}")]
    Spawn {
        /// Program that was run.
        program: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The opener program exited unsuccessfully.
    #[error("{program} exited with {status}")]
    Exit {
        /// Program that was run.
        program: String,
        /// Exit status.
        status: ExitStatus,
    },
}

/// Opens deep links.
#[automock]
#[async_trait]
pub trait ChannelLauncher: Send + Sync {
    /// Open `url` in the messaging channel.
    async fn launch(&self, url: &str) -> Result<(), LaunchError>;
}

/// Opens links with the platform's URL opener.
#[derive(Debug, Clone)]
pub struct SystemLauncher {
    program: String,
    args: Vec<String>,
}

impl SystemLauncher {
    /// The opener for the current platform.
    #[must_use]
    pub fn new() -> Self {
        if cfg!(target_os = "macos") {
            Self::with_program("open", [])
        } else if cfg!(target_os = "windows") {
            Self::with_program("cmd", ["/C", "start", ""])
        } else {
            Self::with_program("xdg-open", [])
        }
    }

    /// Open links with `program`, passing `args` before the URL.
    #[must_use]
    pub fn with_program<const N: usize>(program: &str, args: [&str; N]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(ToString::to_string).collect(),
        }
    }
}

impl Default for SystemLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChannelLauncher for SystemLauncher {
    async fn launch(&self, url: &str) -> Result<(), LaunchError> {
        debug!(program = %self.program, "opening deep link");

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .status()
            .await
            .map_err(|source| LaunchError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(LaunchError::Exit {
                program: self.program.clone(),
                status,
            });
        }

        Ok(())
    }
}

/// Never opens anything; the caller shows the link instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledLauncher;

#[async_trait]
impl ChannelLauncher for DisabledLauncher {
    async fn launch(&self, url: &str) -> Result<(), LaunchError> {
        info!(url, "link opening disabled");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_opener_launches() -> TestResult {
        SystemLauncher::with_program("true", [])
            .launch("https://wa.me/1?text=hi")
            .await?;

        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_opener_reports_exit_status() {
        let result = SystemLauncher::with_program("false", [])
            .launch("https://wa.me/1?text=hi")
            .await;

        assert!(
            matches!(result, Err(LaunchError::Exit { .. })),
            "expected Exit, got {result:?}"
        );
    }

    #[tokio::test]
    async fn missing_opener_reports_spawn_failure() {
        let result = SystemLauncher::with_program("storefront-no-such-opener", [])
            .launch("https://wa.me/1?text=hi")
            .await;

        assert!(
            matches!(result, Err(LaunchError::Spawn { .. })),
            "expected Spawn, got {result:?}"
        );
    }
}
