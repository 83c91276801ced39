//! Terminal rendering of the status and progress channels.

use std::io::Write;
use std::sync::Mutex;

use gamesmith_core::{FlowStatus, StatusSink};

/// Width of the progress bar in cells.
const BAR_WIDTH: usize = 30;

/// Draws a progress bar and status lines on stderr.
#[derive(Debug, Default)]
pub struct TerminalSink {
    /// Whether the current stderr line holds a partially drawn bar.
    bar_open: Mutex<bool>,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusSink for TerminalSink {
    fn progress(&self, percent: u8) {
        let mut open = self.bar_open.lock().unwrap_or_else(|e| e.into_inner());
        let mut err = std::io::stderr().lock();
        let _ = write!(err, "\r{}", render_bar(percent));
        let _ = err.flush();
        *open = true;
    }

    fn status(&self, status: &FlowStatus) {
        let mut open = self.bar_open.lock().unwrap_or_else(|e| e.into_inner());
        let mut err = std::io::stderr().lock();
        if *open {
            let _ = writeln!(err);
            *open = false;
        }
        let _ = writeln!(err, "{status}");
    }
}

/// Render `[#####.....]  50%` for `percent`.
pub fn render_bar(percent: u8) -> String {
    let percent = usize::from(percent.min(100));
    let filled = percent * BAR_WIDTH / 100;
    format!(
        "[{}{}] {percent:>3}%",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled)
    )
}
