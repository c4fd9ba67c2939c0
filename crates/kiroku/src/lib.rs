//! Keep a live stream recorded by restarting an external capture tool.
//!
//! Every attempt gets its own timestamp label. The tool writes its log to
//! `<log_dir>/<prefix>_<channel>-<label>.ts.log` and its recording to
//! `<output_dir>/<prefix>_{author}_<label>_..._{title}.ts`. Once a recording
//! of the attempt shows up, the log is moved next to it.

pub mod attempt;
pub mod config;
pub mod cookies;
pub mod error;
pub mod layout;
pub mod supervisor;
pub mod tool;

pub use attempt::CaptureAttempt;
pub use config::{SupervisorConfig, ToolConfig};
pub use error::*;
pub use supervisor::{AttemptReport, Supervisor};
pub use tool::{CaptureOutcome, CaptureTool, Streamlink};
