use std::{
    ffi::OsString,
    path::PathBuf,
    process::Stdio,
};

use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::{
    attempt::CaptureAttempt,
    config::SupervisorConfig,
    cookies::load_cookies,
    error::{KirokuError, KirokuResult},
    layout::find_outputs,
};

use super::{CaptureOutcome, CaptureTool};

/// Runs `streamlink` once per attempt.
#[derive(Debug, Clone)]
pub struct Streamlink {
    program: String,
    url: String,
    quality: String,

    retry_streams_secs: u64,
    retry_max: u32,
    retry_open: u32,
    loglevel: String,
    hls_live_restart: bool,

    cookies: Vec<(String, String)>,
    extra_args: Vec<String>,
}

impl Streamlink {
    pub fn new(config: &SupervisorConfig) -> KirokuResult<Self> {
        let tool = &config.tool;

        let cookies = match &tool.cookies_file {
            Some(path) => {
                let cookies = load_cookies(path)?;
                log::info!("Loaded {} cookies from {}", cookies.len(), path.display());
                cookies
            }
            None => Vec::new(),
        };

        let extra_args = match &tool.extra_args {
            Some(args) => shlex::split(args)
                .ok_or_else(|| KirokuError::InvalidArguments(args.to_string()))?,
            None => Vec::new(),
        };

        Ok(Self {
            program: tool.program.clone(),
            url: config.url.clone(),
            quality: config.quality.clone(),
            retry_streams_secs: tool.retry_streams_secs,
            retry_max: tool.retry_max,
            retry_open: tool.retry_open,
            loglevel: tool.loglevel.clone(),
            hls_live_restart: tool.hls_live_restart,
            cookies,
            extra_args,
        })
    }

    /// Resolve the program in `PATH`.
    pub fn probe(&self) -> KirokuResult<PathBuf> {
        Ok(which::which(&self.program)?)
    }

    pub fn args(&self, attempt: &CaptureAttempt) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--retry-streams".into(),
            self.retry_streams_secs.to_string().into(),
            "--retry-max".into(),
            self.retry_max.to_string().into(),
            "--retry-open".into(),
            self.retry_open.to_string().into(),
            "--loglevel".into(),
            self.loglevel.as_str().into(),
            "--logfile".into(),
            attempt.log_path().into(),
        ];
        if self.hls_live_restart {
            args.push("--hls-live-restart".into());
        }
        for (name, value) in &self.cookies {
            args.push("--http-cookie".into());
            args.push(format!("{name}={value}").into());
        }
        args.extend(self.extra_args.iter().map(OsString::from));

        args.push("-o".into());
        args.push(attempt.output_template().into());
        args.push(self.url.as_str().into());
        args.push(self.quality.as_str().into());
        args
    }
}

impl CaptureTool for Streamlink {
    async fn capture(
        &self,
        attempt: &CaptureAttempt,
        cancel: &CancellationToken,
    ) -> KirokuResult<CaptureOutcome> {
        let mut child = Command::new(&self.program)
            .args(self.args(attempt))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let mut cancelled = false;
        let status = tokio::select! {
            status = child.wait() => status?,
            _ = cancel.cancelled() => {
                log::info!("Stopping {}...", self.program);
                cancelled = true;
                child.start_kill()?;
                child.wait().await?
            }
        };

        let outputs = find_outputs(attempt).await?;
        Ok(CaptureOutcome {
            status: Some(status),
            cancelled,
            outputs,
        })
    }
}
