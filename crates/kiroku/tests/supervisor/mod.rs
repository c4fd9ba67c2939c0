use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::{NaiveDate, NaiveDateTime};
use kiroku::{
    layout::find_outputs, CaptureAttempt, CaptureOutcome, CaptureTool, KirokuError, KirokuResult,
    Supervisor,
};
use tokio_util::sync::CancellationToken;

use crate::{test_config, AssertWrapper};

/// Behaves like the capture tool from the file system's point of view.
#[derive(Clone, Default)]
struct FakeTool {
    /// Write a recording named after this author.
    author: Option<&'static str>,
    /// Report a failure after touching the file system.
    fail: bool,
    /// Keep running until cancelled.
    hang: bool,
    calls: Arc<AtomicUsize>,
}

impl FakeTool {
    fn recording(author: &'static str) -> Self {
        Self {
            author: Some(author),
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CaptureTool for FakeTool {
    async fn capture(
        &self,
        attempt: &CaptureAttempt,
        cancel: &CancellationToken,
    ) -> KirokuResult<CaptureOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::fs::write(attempt.log_path(), "[cli][info] Opening stream").await?;

        if let Some(author) = self.author {
            // the tool resolves the capture time itself: 20240101_120000
            let capture_time = attempt.label().replace('-', "_");
            let output = attempt
                .output_dir()
                .join(format!("twitch_chatnoir_{author}_{capture_time}_Hello.ts"));
            tokio::fs::write(output, b"\x47").await?;
        }

        if self.fail {
            return Err(KirokuError::IOError(std::io::Error::other("crashed")));
        }

        let cancelled = if self.hang {
            cancel.cancelled().await;
            true
        } else {
            false
        };

        Ok(CaptureOutcome {
            status: None,
            cancelled,
            outputs: find_outputs(attempt).await?,
        })
    }
}

fn new_year_noon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

#[tokio::test]
async fn test_recorded_attempt_moves_log() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path());
    let supervisor = Supervisor::new(config.clone(), "mystream", FakeTool::recording("Alice"));
    supervisor.prepare().await.assert_success();

    let report = supervisor
        .run_attempt(new_year_noon(), &CancellationToken::new())
        .await
        .assert_success();

    let log_name = "twitch_chatnoir_mystream-20240101-120000.ts.log";
    assert_eq!(
        report.outcome.outputs,
        vec![config
            .output_dir
            .join("twitch_chatnoir_Alice_20240101_120000_Hello.ts")]
    );
    assert!(!config.log_dir.join(log_name).exists());
    assert!(config.output_dir.join(log_name).is_file());
    assert_eq!(
        report.relocated_log,
        Some(config.output_dir.join(log_name))
    );
}

#[tokio::test]
async fn test_empty_attempt_keeps_log() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path());
    let supervisor = Supervisor::new(config.clone(), "mystream", FakeTool::default());
    supervisor.prepare().await.assert_success();

    let report = supervisor
        .run_attempt(new_year_noon(), &CancellationToken::new())
        .await
        .assert_success();

    let log_name = "twitch_chatnoir_mystream-20240101-120000.ts.log";
    assert!(!report.outcome.produced_output());
    assert!(report.relocated_log.is_none());
    assert_eq!(
        std::fs::read_to_string(config.log_dir.join(log_name)).unwrap(),
        "[cli][info] Opening stream"
    );
    assert!(!config.output_dir.join(log_name).exists());
}

#[tokio::test]
async fn test_failed_tool_still_checks_outputs() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path());
    let tool = FakeTool {
        fail: true,
        ..FakeTool::recording("Bob")
    };
    let supervisor = Supervisor::new(config.clone(), "mystream", tool);
    supervisor.prepare().await.assert_success();

    let report = supervisor
        .run_attempt(new_year_noon(), &CancellationToken::new())
        .await
        .assert_success();

    assert!(report.outcome.status.is_none());
    assert!(report.outcome.produced_output());
    assert!(report.relocated_log.is_some());
    assert!(!report.attempt.log_path().exists());
}

#[tokio::test]
async fn test_other_attempt_output_is_ignored() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path());
    let supervisor = Supervisor::new(config.clone(), "mystream", FakeTool::default());
    supervisor.prepare().await.assert_success();
    std::fs::write(
        config
            .output_dir
            .join("twitch_chatnoir_Alice_20240101_115955_Hello.ts"),
        b"old",
    )
    .unwrap();

    let report = supervisor
        .run_attempt(new_year_noon(), &CancellationToken::new())
        .await
        .assert_success();

    assert!(report.relocated_log.is_none());
    assert!(report.attempt.log_path().exists());
}

#[tokio::test]
async fn test_run_stops_after_max_attempts() {
    let root = tempfile::tempdir().unwrap();
    let mut config = test_config(root.path());
    config.max_attempts = Some(3);
    let tool = FakeTool::default();
    let supervisor = Supervisor::new(config.clone(), "mystream", tool.clone());

    let attempts = supervisor
        .run(CancellationToken::new())
        .await
        .assert_success();

    assert_eq!(attempts, 3);
    assert_eq!(tool.calls(), 3);
    assert!(config.log_dir.is_dir());
}

#[tokio::test]
async fn test_run_without_attempts() {
    let root = tempfile::tempdir().unwrap();
    let mut config = test_config(root.path());
    config.max_attempts = Some(0);
    let tool = FakeTool::default();
    let supervisor = Supervisor::new(config, "mystream", tool.clone());

    assert_eq!(supervisor.run(CancellationToken::new()).await.assert_success(), 0);
    assert_eq!(tool.calls(), 0);
}

#[tokio::test]
async fn test_run_cancelled_before_start() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path());
    let tool = FakeTool::default();
    let supervisor = Supervisor::new(config.clone(), "mystream", tool.clone());

    let cancel = CancellationToken::new();
    cancel.cancel();

    assert_eq!(supervisor.run(cancel).await.assert_success(), 0);
    assert_eq!(tool.calls(), 0);
    // directories are prepared even if no attempt is made
    assert!(config.output_dir.is_dir());
    assert!(config.log_dir.is_dir());
}

#[tokio::test]
async fn test_run_cancelled_while_capturing() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config(root.path());
    let tool = FakeTool {
        hang: true,
        ..FakeTool::recording("Alice")
    };
    let supervisor = Supervisor::new(config.clone(), "mystream", tool.clone());

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let attempts = tokio::time::timeout(Duration::from_secs(5), supervisor.run(cancel))
        .await
        .expect("supervisor did not stop")
        .assert_success();

    assert_eq!(attempts, 1);
    assert_eq!(tool.calls(), 1);
    // the interrupted recording still takes its log along
    let logs: Vec<_> = std::fs::read_dir(&config.output_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".ts.log"))
        .collect();
    assert_eq!(logs.len(), 1);
}

#[tokio::test]
async fn test_run_cancelled_while_sleeping() {
    let root = tempfile::tempdir().unwrap();
    let mut config = test_config(root.path());
    config.restart_interval_secs = 3600.;
    let tool = FakeTool::default();
    let supervisor = Supervisor::new(config, "mystream", tool.clone());

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let attempts = tokio::time::timeout(Duration::from_secs(5), supervisor.run(cancel))
        .await
        .expect("supervisor did not stop")
        .assert_success();

    assert_eq!(attempts, 1);
    assert_eq!(tool.calls(), 1);
}

#[tokio::test]
async fn test_invalid_channel() {
    let root = tempfile::tempdir().unwrap();
    let supervisor = Supervisor::new(test_config(root.path()), "a/b", FakeTool::default());
    supervisor
        .run(CancellationToken::new())
        .await
        .assert_error();
}
