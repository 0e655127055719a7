// Trip counters.
//
// - Two views fed from the same accepted records:
//      - zone totals: zone -> trips
//      - slot totals: (zone, hour) -> trips
//
// - Zone names are interned once. Slot keys are (zone id, hour) tuples, so the hot path
//   does not allocate once a zone has been seen.
//
// - Counters only ever go up. A new pass adds on top of what earlier passes counted.

use std::{collections::HashMap, fs::File, io::Read, path::Path};

use tracing::{debug, info, trace, warn};

use crate::{
    rank::{self, SlotCount, SlotRow, ZoneCount, ZoneRow},
    record::{self, HeaderGate},
    scan,
};

type ZoneId = usize;

/// What one ingest pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Lines read, blank ones included.
    pub lines: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub header_skipped: bool,
    /// Nothing could be read from the source, counters are untouched.
    pub source_unavailable: bool,
}

impl IngestStats {
    fn unavailable() -> Self {
        Self { source_unavailable: true, ..Self::default() }
    }
}

#[derive(Debug, Default)]
pub struct Aggregator {
    zone_ids: HashMap<String, ZoneId>,
    zone_names: Vec<String>,
    zone_totals: Vec<u64>,
    slot_totals: HashMap<(ZoneId, u8), u64>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every line of `source` into the counters.
    ///
    /// Malformed lines are skipped. A read error ends the pass early, keeping whatever was
    /// counted up to that point.
    pub fn ingest<R: Read>(&mut self, source: R) -> IngestStats {
        let mut pass = Pass::new(self);
        let result = scan::scan_lines(source, |line| pass.line(line));
        return pass.finish(result);
    }

    /// Opens `path` and streams it through [`Aggregator::ingest`]. A file that cannot be
    /// opened counts nothing.
    pub fn ingest_path(&mut self, path: impl AsRef<Path>) -> IngestStats {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "trip source unavailable, nothing ingested");
                return IngestStats::unavailable();
            }
        };
        return self.ingest(file);
    }

    /// Same as [`Aggregator::ingest_path`], but reads through a memory map instead of a
    /// buffered reader.
    pub fn ingest_path_mapped(&mut self, path: impl AsRef<Path>) -> IngestStats {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "trip source unavailable, nothing ingested");
                return IngestStats::unavailable();
            }
        };
        let mut pass = Pass::new(self);
        let result = scan::scan_mapped(&file, |line| pass.line(line));
        return pass.finish(result);
    }

    /// One pass over lines that are already split, eg from a test or another reader.
    pub fn ingest_lines<I, S>(&mut self, lines: I) -> IngestStats
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut pass = Pass::new(self);
        for line in lines {
            pass.line(line.as_ref().as_bytes());
        }
        return pass.finish(Ok(()));
    }

    /// Up to `k` zones, busiest first, ties by zone name.
    pub fn top_zones(&self, k: usize) -> Vec<ZoneCount> {
        let rows: Vec<ZoneRow> = self.zone_totals().collect();
        return rank::top_zones(rows, k);
    }

    /// Up to `k` (zone, hour) slots, busiest first, ties by zone name then hour.
    pub fn top_busy_slots(&self, k: usize) -> Vec<SlotCount> {
        let rows: Vec<SlotRow> = self.slot_totals().collect();
        return rank::top_slots(rows, k);
    }

    pub fn zone_count(&self, zone: &str) -> u64 {
        match self.zone_ids.get(zone) {
            Some(&id) => self.zone_totals[id],
            None => 0,
        }
    }

    pub fn slot_count(&self, zone: &str, hour: u8) -> u64 {
        self.zone_ids
            .get(zone)
            .and_then(|&id| self.slot_totals.get(&(id, hour)))
            .copied()
            .unwrap_or(0)
    }

    pub fn zone_totals(&self) -> impl Iterator<Item = ZoneRow<'_>> {
        self.zone_names
            .iter()
            .zip(&self.zone_totals)
            .map(|(zone, &count)| (zone.as_str(), count))
    }

    pub fn slot_totals(&self) -> impl Iterator<Item = SlotRow<'_>> {
        self.slot_totals
            .iter()
            .map(|(&(id, hour), &count)| (self.zone_names[id].as_str(), hour, count))
    }

    pub fn distinct_zones(&self) -> usize {
        self.zone_names.len()
    }

    pub fn distinct_slots(&self) -> usize {
        self.slot_totals.len()
    }

    pub fn total_trips(&self) -> u64 {
        self.zone_totals.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.zone_names.is_empty()
    }

    fn record(&mut self, zone: &str, hour: u8) {
        let id = match self.zone_ids.get(zone) {
            Some(&id) => id,
            None => {
                let id = self.zone_names.len();
                self.zone_ids.insert(zone.to_owned(), id);
                self.zone_names.push(zone.to_owned());
                self.zone_totals.push(0);
                id
            }
        };
        self.zone_totals[id] += 1;
        *self.slot_totals.entry((id, hour)).or_insert(0) += 1;
    }
}

/// State of one ingest pass: the header check and the running stats.
struct Pass<'a> {
    aggregator: &'a mut Aggregator,
    header_gate: HeaderGate,
    stats: IngestStats,
}

impl<'a> Pass<'a> {
    fn new(aggregator: &'a mut Aggregator) -> Self {
        Self { aggregator, header_gate: HeaderGate::new(), stats: IngestStats::default() }
    }

    fn line(&mut self, bytes: &[u8]) {
        self.stats.lines += 1;

        if record::is_blank(bytes) {
            return;
        }

        if self.header_gate.is_header(bytes) {
            debug!(line = self.stats.lines, "skipping header line");
            self.stats.header_skipped = true;
            return;
        }

        match record::parse_line(bytes) {
            Ok(slot) => {
                self.aggregator.record(slot.zone, slot.hour);
                self.stats.accepted += 1;
            }
            Err(rejection) => {
                trace!(line = self.stats.lines, %rejection, "skipping malformed trip record");
                self.stats.rejected += 1;
            }
        }
    }

    fn finish(mut self, result: std::io::Result<()>) -> IngestStats {
        if let Err(e) = result {
            warn!(error = %e, lines = self.stats.lines, "trip source failed mid-read, ending pass early");
            if self.stats.lines == 0 {
                self.stats.source_unavailable = true;
            }
        }
        info!(
            accepted = self.stats.accepted,
            rejected = self.stats.rejected,
            zones = self.aggregator.distinct_zones(),
            "ingest pass finished"
        );
        return self.stats;
    }
}
