//! Status and progress side channel.
//!
//! The flow reports two observable channels: a percentage and a status line.
//! Implement [`StatusSink`] to render them; [`TracingSink`] logs them.

use std::fmt;

/// Human-readable state of a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowStatus {
    /// The first attempt is being issued.
    Generating,
    /// A timed-out attempt is about to be reissued.
    Retrying { attempt: u32, max: u32 },
    /// A response arrived and is being decoded.
    Processing,
    /// Generated code is ready for display.
    Completed,
    /// The run failed; `message` is user-facing.
    Failed { message: String },
}

impl fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generating => f.write_str("AI is generating the game..."),
            Self::Retrying { attempt, max } => {
                write!(f, "request timed out, retrying ({attempt}/{max})...")
            }
            Self::Processing => f.write_str("processing AI response..."),
            Self::Completed => f.write_str("AI game generation complete!"),
            Self::Failed { message } => write!(f, "error: {message}"),
        }
    }
}

/// Receives progress and status updates from a running flow.
///
/// Calls arrive from the flow task and from the progress simulator task, so
/// implementations must be thread-safe.
pub trait StatusSink: Send + Sync {
    /// Displayed completion percentage changed (0..=100).
    fn progress(&self, percent: u8);

    /// Status line changed.
    fn status(&self, status: &FlowStatus);
}

/// A sink that forwards every update to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl StatusSink for TracingSink {
    fn progress(&self, percent: u8) {
        tracing::trace!(percent, "progress");
    }

    fn status(&self, status: &FlowStatus) {
        match status {
            FlowStatus::Failed { .. } => tracing::warn!(%status, "status"),
            _ => tracing::info!(%status, "status"),
        }
    }
}
