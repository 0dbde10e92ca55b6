//! Plain-text rendering with optional ANSI colors.

use crate::registry::{StateGroup, UnitState};
use colored::{Color, Colorize};
use std::io::{self, Write};

/// Color switch threaded through everything that prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    #[cfg(test)]
    pub fn plain() -> Self {
        Self::new(false)
    }

    pub fn paint(&self, text: &str, color: Color) -> String {
        if self.enabled {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn success(&self, text: &str) -> String {
        self.paint(text, Color::Green)
    }

    pub fn failure(&self, text: &str) -> String {
        self.paint(text, Color::Red)
    }

    pub fn info(&self, text: &str) -> String {
        self.paint(text, Color::Blue)
    }

    pub fn muted(&self, text: &str) -> String {
        self.paint(text, Color::BrightBlack)
    }

    /// Check mark used for completed operations.
    pub fn check(&self) -> String {
        self.success("✓")
    }

    /// Cross used for per-target failures.
    pub fn cross(&self) -> String {
        self.failure("✗")
    }

    /// Heading color for a state group; other states stay uncolored.
    pub fn state(&self, state: &UnitState, text: &str) -> String {
        match state_color(state) {
            Some(color) => self.paint(text, color),
            None => text.to_string(),
        }
    }
}

fn state_color(state: &UnitState) -> Option<Color> {
    match state {
        UnitState::Running => Some(Color::Green),
        UnitState::Failed => Some(Color::Red),
        UnitState::Inactive => Some(Color::Yellow),
        UnitState::Dead => Some(Color::BrightBlack),
        UnitState::Other(_) => None,
    }
}

/// Print state groups as `STATE (n):` headings with one unit per line.
pub fn render_groups<W: Write>(
    out: &mut W,
    palette: &Palette,
    groups: &[StateGroup],
    verbose: bool,
) -> io::Result<()> {
    for group in groups {
        let heading = group.state.as_str().to_uppercase();
        writeln!(
            out,
            "\n{} ({}):",
            palette.state(&group.state, &heading),
            group.units.len()
        )?;
        for unit in &group.units {
            if verbose && !unit.description.is_empty() {
                writeln!(out, "  {} - {}", unit.name, palette.muted(&unit.description))?;
            } else {
                writeln!(out, "  {}", unit.name)?;
            }
        }
    }
    Ok(())
}
