// Top-K selection over the aggregates.
//
// - Zones: count desc, zone asc
// - Slots: count desc, zone asc, hour asc
//
// Zone names are unique and so are (zone, hour) pairs, so both orders are total and the
// output never depends on hash map iteration order.

use std::cmp::Ordering;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ZoneCount {
    pub zone: String,
    pub count: u64,
}

impl ZoneCount {
    pub fn new(zone: impl Into<String>, count: u64) -> Self {
        Self { zone: zone.into(), count }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SlotCount {
    pub zone: String,
    pub hour: u8,
    pub count: u64,
}

impl SlotCount {
    pub fn new(zone: impl Into<String>, hour: u8, count: u64) -> Self {
        Self { zone: zone.into(), hour, count }
    }
}

/// A zone row that still borrows its name from the aggregator.
pub type ZoneRow<'a> = (&'a str, u64);

/// A slot row that still borrows its name from the aggregator.
pub type SlotRow<'a> = (&'a str, u8, u64);

pub fn zone_order(a: &ZoneRow, b: &ZoneRow) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

pub fn slot_order(a: &SlotRow, b: &SlotRow) -> Ordering {
    b.2.cmp(&a.2)
        .then_with(|| a.0.cmp(b.0))
        .then_with(|| a.1.cmp(&b.1))
}

/// Keeps the `k` first rows under `order`, sorted.
///
/// Only the kept prefix gets fully sorted, the rest is partitioned away first.
pub fn top_k<T>(mut rows: Vec<T>, k: usize, order: impl Fn(&T, &T) -> Ordering) -> Vec<T> {
    if k == 0 {
        return Vec::new();
    }
    if k < rows.len() {
        rows.select_nth_unstable_by(k - 1, &order);
        rows.truncate(k);
    }
    rows.sort_unstable_by(&order);
    return rows;
}

pub(crate) fn top_zones(rows: Vec<ZoneRow>, k: usize) -> Vec<ZoneCount> {
    top_k(rows, k, zone_order)
        .into_iter()
        .map(|(zone, count)| ZoneCount::new(zone, count))
        .collect()
}

pub(crate) fn top_slots(rows: Vec<SlotRow>, k: usize) -> Vec<SlotCount> {
    top_k(rows, k, slot_order)
        .into_iter()
        .map(|(zone, hour, count)| SlotCount::new(zone, hour, count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zones_tie_break_on_name() {
        let rows = vec![("B", 3), ("A", 3), ("C", 5)];
        assert_eq!(
            top_zones(rows, 3),
            vec![ZoneCount::new("C", 5), ZoneCount::new("A", 3), ZoneCount::new("B", 3)]
        );
    }

    #[test]
    fn names_compare_by_bytes() {
        let rows = vec![("a", 1), ("B", 1), ("Z10", 1), ("Z2", 1)];
        let names: Vec<_> = top_zones(rows, 4).into_iter().map(|z| z.zone).collect();
        assert_eq!(names, vec!["B", "Z10", "Z2", "a"]);
    }

    #[test]
    fn slots_tie_break_on_zone_then_hour() {
        let rows = vec![("Z2", 8, 1), ("Z1", 9, 1), ("Z1", 8, 1), ("Z3", 0, 4)];
        assert_eq!(
            top_slots(rows, 10),
            vec![
                SlotCount::new("Z3", 0, 4),
                SlotCount::new("Z1", 8, 1),
                SlotCount::new("Z1", 9, 1),
                SlotCount::new("Z2", 8, 1),
            ]
        );
    }

    #[test]
    fn k_limits_output() {
        let rows: Vec<ZoneRow> = vec![("A", 1), ("B", 2), ("C", 3), ("D", 4)];
        assert!(top_zones(rows.clone(), 0).is_empty());
        assert_eq!(top_zones(rows.clone(), 2), vec![ZoneCount::new("D", 4), ZoneCount::new("C", 3)]);
        assert_eq!(top_zones(rows, 100).len(), 4);
    }

    #[test]
    fn partial_selection_matches_full_sort() {
        let rows: Vec<ZoneRow> = vec![
            ("q", 7), ("w", 2), ("e", 7), ("r", 9), ("t", 1), ("y", 7), ("u", 2), ("i", 0),
        ];
        let mut sorted = rows.clone();
        sorted.sort_by(zone_order);
        for k in 0..=rows.len() {
            assert_eq!(top_k(rows.clone(), k, zone_order), sorted[..k].to_vec(), "k = {k}");
        }
    }
}
