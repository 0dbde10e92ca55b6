//! Status and recent logs for a single unit.

use crate::error::Result;
use crate::job_id::JobId;
use crate::supervisor::Supervisor;
use crate::ui::Palette;
use std::io::Write;
use tracing::debug;

/// Prints a unit's status followed by the tail of its logs.
pub struct StatusViewer<'a, S: Supervisor + ?Sized> {
    supervisor: &'a S,
    palette: &'a Palette,
    /// Number of log lines to show before following
    tail_lines: usize,
}

impl<'a, S: Supervisor + ?Sized> StatusViewer<'a, S> {
    pub fn new(supervisor: &'a S, palette: &'a Palette, tail_lines: usize) -> Self {
        Self {
            supervisor,
            palette,
            tail_lines,
        }
    }

    /// Show status and logs; with `follow`, block until interrupted.
    ///
    /// Inactive and failed units still get their logs shown.
    pub fn show<W: Write>(&self, out: &mut W, id: &JobId, follow: bool) -> Result<()> {
        let id = JobId::new(id.unit_name());
        debug!(unit = %id, follow, "showing status");

        self.heading(out, &format!("=== Status for {} ===", id), false);
        self.supervisor.show_status(&id)?;

        self.heading(out, "=== Recent logs ===", true);
        if follow {
            self.note(out, "(Following logs, press Ctrl+C to exit)");
        }
        self.supervisor.stream_logs(&id, self.tail_lines, follow)
    }

    fn heading<W: Write>(&self, out: &mut W, text: &str, spaced: bool) {
        let prefix = if spaced { "\n" } else { "" };
        // Headings are cosmetic; a closed stdout should not mask the supervisor output
        let _ = writeln!(out, "{}{}", prefix, self.palette.info(text)).and_then(|_| out.flush());
    }

    fn note<W: Write>(&self, out: &mut W, text: &str) {
        let _ = writeln!(out, "{}", self.palette.muted(text)).and_then(|_| out.flush());
    }
}
