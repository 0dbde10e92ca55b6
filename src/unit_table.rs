//! Parser for the unit table printed by `systemctl list-units`.
//!
//! The table is whitespace-delimited: `UNIT LOAD ACTIVE SUB DESCRIPTION...`.
//! Only units carrying the managed-job prefix are kept.

use crate::job_id::{has_prefix, JobId};
use crate::registry::UnitState;
use regex::Regex;
use std::sync::OnceLock;

/// Footer phrases that end the table.
const FOOTER_MARKERS: [&str; 2] = ["loaded units listed", "To show all"];

/// One unit as observed at query time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRecord {
    pub name: String,
    pub state: UnitState,
    pub description: String,
}

impl UnitRecord {
    pub fn job_id(&self) -> JobId {
        JobId::new(self.name.as_str())
    }
}

fn header_pattern() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| Regex::new(r"^(UNIT|●)").expect("header pattern is valid"))
}

/// Parse a single table row.
///
/// Returns `None` for rows with fewer than four fields or without the prefix.
pub fn parse_unit_line(line: &str, prefix: &str) -> Option<UnitRecord> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 {
        return None;
    }

    if !has_prefix(fields[0], prefix) {
        return None;
    }

    // fields[1] is LOAD, fields[3] is SUB
    let description = if fields.len() > 4 {
        fields[4..].join(" ")
    } else {
        String::new()
    };

    Some(UnitRecord {
        name: fields[0].to_string(),
        state: UnitState::from_token(fields[2]),
        description,
    })
}

/// Parse the full table, keeping input order.
pub fn parse_units(output: &str, prefix: &str) -> Vec<UnitRecord> {
    let header = header_pattern();
    let mut units = Vec::new();
    let mut in_header = true;

    for line in output.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }

        if in_header && header.is_match(line) {
            continue;
        }
        in_header = false;

        if FOOTER_MARKERS.iter().any(|marker| line.contains(marker)) {
            break;
        }

        if let Some(unit) = parse_unit_line(line, prefix) {
            units.push(unit);
        }
    }

    units
}
