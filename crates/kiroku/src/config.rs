use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::error::KirokuResult;

/// Everything the supervisor needs to know before the first attempt.
///
/// Every field has a default, so an empty `config.toml` is valid and
/// behaves like the plain `record/` layout.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Live stream to capture.
    pub url: String,
    /// Quality selector passed to the capture tool.
    pub quality: String,
    /// File name prefix shared by outputs and logs.
    pub prefix: String,

    pub output_dir: PathBuf,
    pub log_dir: PathBuf,

    /// Pause between two attempts, in seconds.
    pub restart_interval_secs: f64,
    /// Stop after this many attempts. Runs forever when unset.
    pub max_attempts: Option<u64>,

    pub tool: ToolConfig,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            url: "https://www.twitch.tv/chatnoir".to_string(),
            quality: "best".to_string(),
            prefix: "twitch_chatnoir".to_string(),
            output_dir: PathBuf::from("record"),
            log_dir: PathBuf::from("record/twitch-log"),
            restart_interval_secs: 5.,
            max_attempts: None,
            tool: ToolConfig::default(),
        }
    }
}

impl SupervisorConfig {
    pub fn load<P>(path: P) -> KirokuResult<Self>
    where
        P: AsRef<Path>,
    {
        let data = std::fs::read_to_string(path)?;
        Self::from_toml(&data)
    }

    pub fn from_toml(data: &str) -> KirokuResult<Self> {
        let config = toml::from_str(data)?;
        Ok(config)
    }

    pub fn restart_interval(&self) -> Duration {
        if self.restart_interval_secs > 0. {
            Duration::try_from_secs_f64(self.restart_interval_secs).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        }
    }
}

/// Options forwarded to the external capture program.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ToolConfig {
    /// Program name or path. Bare names are looked up in `PATH`.
    pub program: String,

    /// `--retry-streams`: seconds between attempts to find a stream.
    pub retry_streams_secs: u64,
    /// `--retry-max`: stream lookups before giving up.
    pub retry_max: u32,
    /// `--retry-open`: attempts to open the stream once found.
    pub retry_open: u32,

    pub loglevel: String,
    pub hls_live_restart: bool,

    /// Netscape cookie jar forwarded as `--http-cookie` arguments.
    pub cookies_file: Option<PathBuf>,

    /// Extra arguments, split like a shell command line.
    pub extra_args: Option<String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: "streamlink".to_string(),
            retry_streams_secs: 15,
            retry_max: 5,
            retry_open: 3,
            loglevel: "trace".to_string(),
            hls_live_restart: true,
            cookies_file: None,
            extra_args: None,
        }
    }
}
