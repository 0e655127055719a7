// Rendering and checking reports.
//
// - Text format:
//      # top zones
//      <zone>,<count>
//      # top slots
//      <zone>,<hour>,<count>
//
// - JSON format mirrors the Report struct.
//
// - A stored text report can be read back and compared against a fresh one, row by row.

use std::fmt;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::{
    aggregate::Aggregator,
    rank::{SlotCount, ZoneCount},
};

pub const ZONES_HEADING: &str = "# top zones";
pub const SLOTS_HEADING: &str = "# top slots";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub top_zones: Vec<ZoneCount>,
    pub top_slots: Vec<SlotCount>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("report is missing the '{0}' section")]
    MissingSection(&'static str),
    #[error("line {line}: row outside of any section: {text}")]
    RowOutsideSection { line: usize, text: String },
    #[error("line {line}: malformed row: {text}")]
    MalformedRow { line: usize, text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Zones,
    Slots,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Zones => f.write_str("zones"),
            Section::Slots => f.write_str("slots"),
        }
    }
}

/// One difference between a fresh report and a stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    RowCount { section: Section, expected: usize, actual: usize },
    Row { section: Section, rank: usize, expected: String, actual: String },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::RowCount { section, expected, actual } => {
                write!(f, "Incorrect number of {section}; expected {expected}, got {actual}!")
            }
            Mismatch::Row { section, rank, expected, actual } => {
                write!(f, "Row {rank} of {section} does not match, expected {expected}, got {actual}!")
            }
        }
    }
}

impl Report {
    pub fn from_aggregator(aggregator: &Aggregator, zones_k: usize, slots_k: usize) -> Self {
        Self {
            top_zones: aggregator.top_zones(zones_k),
            top_slots: aggregator.top_busy_slots(slots_k),
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(ZONES_HEADING);
        out.push('\n');
        for row in &self.top_zones {
            out.push_str(&zone_line(row));
            out.push('\n');
        }
        out.push_str(SLOTS_HEADING);
        out.push('\n');
        for row in &self.top_slots {
            out.push_str(&slot_line(row));
            out.push('\n');
        }
        return out;
    }

    pub fn render_json(&self) -> serde_json::Result<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        return Ok(out);
    }

    /// Reads back a report written by [`Report::render_text`].
    pub fn parse_text(text: &str) -> Result<Self, ReportError> {
        let zone_re = Regex::new(r"^([^,]+),(\d+)$").expect("zone row pattern is valid");
        let slot_re = Regex::new(r"^([^,]+),(\d{1,2}),(\d+)$").expect("slot row pattern is valid");

        let mut section = None;
        let mut seen_zones = false;
        let mut seen_slots = false;
        let mut top_zones = Vec::new();
        let mut top_slots = Vec::new();

        for (i, raw) in text.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            let line_no = i + 1;
            let malformed = || ReportError::MalformedRow { line: line_no, text: line.to_owned() };

            if line.trim().is_empty() {
                continue;
            }
            if line == ZONES_HEADING {
                section = Some(Section::Zones);
                seen_zones = true;
                continue;
            }
            if line == SLOTS_HEADING {
                section = Some(Section::Slots);
                seen_slots = true;
                continue;
            }

            match section {
                None => {
                    return Err(ReportError::RowOutsideSection { line: line_no, text: line.to_owned() });
                }
                Some(Section::Zones) => {
                    let caps = zone_re.captures(line).ok_or_else(malformed)?;
                    let count = caps[2].parse().map_err(|_| malformed())?;
                    top_zones.push(ZoneCount::new(&caps[1], count));
                }
                Some(Section::Slots) => {
                    let caps = slot_re.captures(line).ok_or_else(malformed)?;
                    let hour: u8 = caps[2].parse().map_err(|_| malformed())?;
                    if hour > 23 {
                        return Err(malformed());
                    }
                    let count = caps[3].parse().map_err(|_| malformed())?;
                    top_slots.push(SlotCount::new(&caps[1], hour, count));
                }
            }
        }

        if !seen_zones {
            return Err(ReportError::MissingSection(ZONES_HEADING));
        }
        if !seen_slots {
            return Err(ReportError::MissingSection(SLOTS_HEADING));
        }
        return Ok(Self { top_zones, top_slots });
    }

    /// Every way `self` differs from `expected`. Empty means they match.
    pub fn diff(&self, expected: &Report) -> Vec<Mismatch> {
        let mut mismatches = Vec::new();
        diff_section(
            Section::Zones,
            &expected.top_zones.iter().map(zone_line).collect::<Vec<_>>(),
            &self.top_zones.iter().map(zone_line).collect::<Vec<_>>(),
            &mut mismatches,
        );
        diff_section(
            Section::Slots,
            &expected.top_slots.iter().map(slot_line).collect::<Vec<_>>(),
            &self.top_slots.iter().map(slot_line).collect::<Vec<_>>(),
            &mut mismatches,
        );
        return mismatches;
    }
}

fn diff_section(section: Section, expected: &[String], actual: &[String], out: &mut Vec<Mismatch>) {
    if expected.len() != actual.len() {
        out.push(Mismatch::RowCount { section, expected: expected.len(), actual: actual.len() });
    }
    for (i, (e, a)) in expected.iter().zip(actual).enumerate() {
        if e != a {
            out.push(Mismatch::Row { section, rank: i + 1, expected: e.clone(), actual: a.clone() });
        }
    }
}

fn zone_line(row: &ZoneCount) -> String {
    format!("{},{}", row.zone, row.count)
}

fn slot_line(row: &SlotCount) -> String {
    format!("{},{},{}", row.zone, row.hour, row.count)
}
