use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::{attempt::CaptureAttempt, config::SupervisorConfig, error::KirokuResult};

/// Create the output and log directories, parents included.
///
/// Calling this on an existing layout is a no-op.
pub async fn prepare_dirs(config: &SupervisorConfig) -> KirokuResult<()> {
    tokio::fs::create_dir_all(&config.output_dir).await?;
    tokio::fs::create_dir_all(&config.log_dir).await?;
    Ok(())
}

/// List the files in the output directory that belong to `attempt`, sorted by name.
pub async fn find_outputs(attempt: &CaptureAttempt) -> KirokuResult<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(attempt.output_dir()).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut outputs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !attempt.matches_output(&file_name) {
            continue;
        }
        if entry.file_type().await?.is_file() {
            outputs.push(entry.path());
        }
    }
    outputs.sort();

    Ok(outputs)
}

/// Move the attempt's log file next to its outputs.
///
/// Best effort: failures are logged and reported as `None`.
pub async fn relocate_log(attempt: &CaptureAttempt) -> Option<PathBuf> {
    let source = attempt.log_path();
    let target = attempt.relocated_log_path();

    if !tokio::fs::try_exists(source).await.unwrap_or_default() {
        log::warn!("Log file {} does not exist, skip moving.", source.display());
        return None;
    }

    match move_file(source, &target).await {
        Ok(()) => {
            log::info!("Moved log file to {}", target.display());
            Some(target)
        }
        Err(e) => {
            log::warn!(
                "Failed to move log file {} to {}: {e}",
                source.display(),
                target.display()
            );
            None
        }
    }
}

async fn move_file(source: &Path, target: &Path) -> std::io::Result<()> {
    let Err(rename_error) = tokio::fs::rename(source, target).await else {
        return Ok(());
    };

    // rename does not work across file systems
    if tokio::fs::copy(source, target).await.is_err() {
        return Err(rename_error);
    }
    tokio::fs::remove_file(source).await
}
