use std::path::PathBuf;

use clap::Parser;
use kiroku::{Streamlink, Supervisor, SupervisorConfig};
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct KirokuArgs {
    /// Config file in TOML format. Flags below override its values.
    #[clap(short, long, env = "KIROKU_CONFIG")]
    config: Option<PathBuf>,

    /// Live stream URL
    #[clap(long)]
    url: Option<String>,

    /// Stream quality passed to the capture tool
    #[clap(short, long)]
    quality: Option<String>,

    /// Directory for recordings
    #[clap(short, long)]
    output_dir: Option<PathBuf>,

    /// Directory for capture logs of unfinished attempts
    #[clap(long)]
    log_dir: Option<PathBuf>,

    /// Seconds to wait before restarting the capture tool
    #[clap(long)]
    restart_interval: Option<f64>,

    /// Stop after this many attempts
    #[clap(long, conflicts_with = "once")]
    max_attempts: Option<u64>,

    /// Capture once and exit
    #[clap(long)]
    once: bool,

    /// Netscape cookie file passed to the capture tool
    #[clap(long)]
    cookies: Option<PathBuf>,

    /// Capture program
    #[clap(long, env = "KIROKU_PROGRAM")]
    program: Option<String>,

    /// Debug output
    #[clap(short, long, alias = "debug")]
    verbose: bool,

    /// Tag used in log file names, usually the channel name
    channel: String,
}

impl KirokuArgs {
    fn into_config(self) -> anyhow::Result<(SupervisorConfig, String)> {
        let mut config = match &self.config {
            Some(path) => SupervisorConfig::load(path)?,
            None => SupervisorConfig::default(),
        };

        if let Some(url) = self.url {
            config.url = url;
        }
        if let Some(quality) = self.quality {
            config.quality = quality;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(log_dir) = self.log_dir {
            config.log_dir = log_dir;
        }
        if let Some(interval) = self.restart_interval {
            config.restart_interval_secs = interval;
        }
        if self.once {
            config.max_attempts = Some(1);
        } else if let Some(max_attempts) = self.max_attempts {
            config.max_attempts = Some(max_attempts);
        }
        if let Some(cookies) = self.cookies {
            config.tool.cookies_file = Some(cookies);
        }
        if let Some(program) = self.program {
            config.tool.program = program;
        }

        Ok((config, self.channel))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = KirokuArgs::parse();

    let default_level = if args.verbose {
        tracing_subscriber::filter::LevelFilter::DEBUG
    } else {
        tracing_subscriber::filter::LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let (config, channel) = args.into_config()?;
    let tool = Streamlink::new(&config)?;
    match tool.probe() {
        Ok(program) => log::debug!("Using capture tool at {}", program.display()),
        Err(e) => {
            log::error!(
                "Please make sure {} is installed and added to PATH: {e}",
                config.tool.program
            );
            std::process::exit(1);
        }
    }

    let cancel = CancellationToken::new();
    let ctrlc_cancel = cancel.clone();
    tokio::spawn(async move {
        // wait for the first ctrl-c to stop after the current attempt
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        log::info!("Ctrl-C received, stopping capture.");
        ctrlc_cancel.cancel();

        // wait for the second ctrl-c to force exit
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Ctrl-C received again, force exit.");
            std::process::exit(1);
        }
    });

    let supervisor = Supervisor::new(config, channel, tool);
    let attempts = supervisor.run(cancel).await?;
    log::info!("Stopped after {attempts} attempt(s).");

    Ok(())
}
