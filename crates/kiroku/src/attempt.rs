use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use regex::Regex;

use crate::{
    config::SupervisorConfig,
    error::{KirokuError, KirokuResult},
};

/// Format of the per-attempt label, e.g. `20240101-120000`.
pub const LABEL_FORMAT: &str = "%Y%m%d-%H%M%S";

/// One iteration of the supervisor: a single tool invocation and the file
/// names derived from its start time.
#[derive(Debug, Clone)]
pub struct CaptureAttempt {
    label: String,
    log_path: PathBuf,
    output_dir: PathBuf,
    output_template: PathBuf,
    output_matcher: Regex,
}

impl CaptureAttempt {
    pub fn new(config: &SupervisorConfig, channel: &str, at: NaiveDateTime) -> KirokuResult<Self> {
        if channel.contains(['/', '\\']) {
            return Err(KirokuError::InvalidChannel(channel.to_string()));
        }

        let label = at.format(LABEL_FORMAT).to_string();
        let prefix = &config.prefix;

        // {prefix}_{channel}-{label}.ts.log
        let log_path = config
            .log_dir
            .join(format!("{prefix}_{channel}-{label}.ts.log"));

        // author, capture time and title are resolved by the capture tool
        let output_template = config.output_dir.join(format!(
            "{prefix}_{{author}}_{label}_{{time:%Y%m%d_%H%M%S}}_{{title}}.ts"
        ));

        let output_matcher = output_matcher(prefix, &at)?;

        Ok(Self {
            label,
            log_path,
            output_dir: config.output_dir.clone(),
            output_template,
            output_matcher,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn output_template(&self) -> &Path {
        &self.output_template
    }

    /// Where the log file ends up once the attempt is known to have produced output.
    pub fn relocated_log_path(&self) -> PathBuf {
        match self.log_path.file_name() {
            Some(file_name) => self.output_dir.join(file_name),
            None => self.output_dir.clone(),
        }
    }

    /// Whether `file_name` looks like `{prefix}*{label}*.ts`.
    ///
    /// The date and time halves of the label may be joined by either `-` or
    /// `_`, so outputs named after the tool's own capture time also count.
    pub fn matches_output(&self, file_name: &str) -> bool {
        self.output_matcher.is_match(file_name)
    }
}

fn output_matcher(prefix: &str, at: &NaiveDateTime) -> KirokuResult<Regex> {
    let date = at.format("%Y%m%d");
    let time = at.format("%H%M%S");
    let pattern = format!(r"^{}.*{date}[-_]{time}.*\.ts$", regex::escape(prefix));
    Ok(Regex::new(&pattern)?)
}
