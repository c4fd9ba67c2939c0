use std::path::PathBuf;

use chrono::NaiveDateTime;
use tokio_util::sync::CancellationToken;

use crate::{
    attempt::CaptureAttempt,
    config::SupervisorConfig,
    error::KirokuResult,
    layout::{find_outputs, prepare_dirs, relocate_log},
    tool::{CaptureOutcome, CaptureTool},
};

/// Result of a single attempt, mostly useful for logging and tests.
#[derive(Debug)]
pub struct AttemptReport {
    pub attempt: CaptureAttempt,
    pub outcome: CaptureOutcome,
    /// New location of the log file, if it was moved.
    pub relocated_log: Option<PathBuf>,
}

/// ```text
///            ┌───────────┐  exit   ┌──────────┐
///  start ───►│ Capturing ├────────►│ Checking │── output? ──► move log
///            └─────▲─────┘         └────┬─────┘
///                  │      sleep         │
///                  └────────────────────┘
/// ```
///
/// Runs the capture tool again and again until cancelled or until
/// `max_attempts` is reached. Failures of a single attempt never stop the loop.
pub struct Supervisor<T> {
    config: SupervisorConfig,
    channel: String,
    tool: T,
}

impl<T> Supervisor<T>
where
    T: CaptureTool,
{
    pub fn new<S>(config: SupervisorConfig, channel: S, tool: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            config,
            channel: channel.into(),
            tool,
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub async fn prepare(&self) -> KirokuResult<()> {
        prepare_dirs(&self.config).await
    }

    /// Capture once with file names derived from `at`.
    pub async fn run_attempt(
        &self,
        at: NaiveDateTime,
        cancel: &CancellationToken,
    ) -> KirokuResult<AttemptReport> {
        let attempt = CaptureAttempt::new(&self.config, &self.channel, at)?;
        tracing::info!(
            "Start capturing {} as {}, log: {}",
            self.config.url,
            attempt.label(),
            attempt.log_path().display()
        );

        let outcome = match self.tool.capture(&attempt, cancel).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Failed to run capture tool: {e}");
                CaptureOutcome {
                    outputs: find_outputs(&attempt).await.unwrap_or_default(),
                    ..Default::default()
                }
            }
        };
        match outcome.status {
            Some(status) => tracing::info!("Capture tool exited with {status}"),
            None => tracing::debug!("Capture tool exit status unknown"),
        }

        let relocated_log = if outcome.produced_output() {
            for output in &outcome.outputs {
                tracing::info!("Recorded {}", output.display());
            }
            relocate_log(&attempt).await
        } else {
            tracing::info!(
                "No output recorded for {}, log kept at {}",
                attempt.label(),
                attempt.log_path().display()
            );
            None
        };

        Ok(AttemptReport {
            attempt,
            outcome,
            relocated_log,
        })
    }

    /// Prepare the directories, then loop. Returns the number of attempts made.
    pub async fn run(&self, cancel: CancellationToken) -> KirokuResult<u64> {
        self.prepare().await?;

        let interval = self.config.restart_interval();
        let mut attempts = 0;
        loop {
            if cancel.is_cancelled() || self.exhausted(attempts) {
                break;
            }

            let at = chrono::Local::now().naive_local();
            let report = self.run_attempt(at, &cancel).await?;
            attempts += 1;

            if report.outcome.cancelled || cancel.is_cancelled() {
                break;
            }
            if self.exhausted(attempts) {
                tracing::info!("Reached {attempts} attempt(s), stopping.");
                break;
            }

            tracing::debug!("Restarting in {interval:?}");
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = cancel.cancelled() => break,
            }
        }

        Ok(attempts)
    }

    fn exhausted(&self, attempts: u64) -> bool {
        self.config.max_attempts.is_some_and(|max| attempts >= max)
    }
}
