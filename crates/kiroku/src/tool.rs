use std::{future::Future, path::PathBuf, process::ExitStatus};

use tokio_util::sync::CancellationToken;

use crate::{attempt::CaptureAttempt, error::KirokuResult};

mod streamlink;

pub use streamlink::Streamlink;

/// What a capture tool left behind after it exited.
#[derive(Debug, Clone, Default)]
pub struct CaptureOutcome {
    /// `None` when the tool never started or its status is unknown.
    pub status: Option<ExitStatus>,
    /// The tool was stopped because the supervisor is shutting down.
    pub cancelled: bool,
    /// Output files of the attempt found after the tool exited.
    pub outputs: Vec<PathBuf>,
}

impl CaptureOutcome {
    pub fn produced_output(&self) -> bool {
        !self.outputs.is_empty()
    }
}

/// An external program recording one attempt of a live stream.
///
/// The exit status is informational only. Whether the attempt counts as
/// a recording is decided by [`CaptureOutcome::outputs`].
pub trait CaptureTool {
    /// Run the tool until it exits or `cancel` fires.
    fn capture(
        &self,
        attempt: &CaptureAttempt,
        cancel: &CancellationToken,
    ) -> impl Future<Output = KirokuResult<CaptureOutcome>> + Send;
}
