// # Trip records
//
// - Format of a trip line:
//      - `<trip id>,<pickup zone>,<dropoff zone>,<pickup date-time>,<distance km>,<fare>`
//      - eg: "1,Z1,Z2,2024-01-01 08:15,5.0,12.0"
//
// - Only the pickup zone and the hour of the pickup date-time are read, but all six
//   fields have to be there for the line to count.
//
// - Pickup date-time:
//      - `<date> <HH>:<rest>`, the date is not looked at
//      - HH is one or more ascii digits, 0 to 23
//
// - Fields are trimmed of spaces, tabs and line endings. Empty fields are kept so the
//   field count stays honest.

use memchr::{memchr, memmem};
use thiserror::Error;

const FIELD_COUNT: usize = 6;
const ZONE_FIELD: usize = 1;
const DATETIME_FIELD: usize = 3;

const HEADER_TOKEN: &[u8] = b"TripID";

/// The two values a trip line contributes to the aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickupSlot<'a> {
    pub zone: &'a str,
    pub hour: u8,
}

/// Why a line was left out of the aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("line is blank")]
    Blank,
    #[error("line is not valid UTF-8")]
    NotUtf8,
    #[error("expected at least 6 fields, found {found}")]
    TooFewFields { found: usize },
    #[error("pickup zone is empty")]
    EmptyZone,
    #[error("pickup date-time has no space before the hour")]
    MissingTime,
    #[error("pickup date-time has no colon after the hour")]
    MissingMinutes,
    #[error("pickup hour is not a number")]
    MalformedHour,
    #[error("pickup hour is outside 0..=23")]
    HourOutOfRange,
}

/// Parses a raw line, rejecting anything that is not UTF-8 before looking at fields.
pub fn parse_line(bytes: &[u8]) -> Result<PickupSlot<'_>, Rejection> {
    let line = std::str::from_utf8(bytes).map_err(|_| Rejection::NotUtf8)?;
    return parse_record(line);
}

/// Extracts the pickup zone and hour from one line with its terminator already removed.
pub fn parse_record(line: &str) -> Result<PickupSlot<'_>, Rejection> {
    let line = trim_field(line);
    if line.is_empty() {
        return Err(Rejection::Blank);
    }

    let mut zone = "";
    let mut datetime = "";
    let mut found = 0;

    // only the first six fields matter, anything after is ignored
    for (i, field) in Fields::new(line).take(FIELD_COUNT).enumerate() {
        match i {
            ZONE_FIELD => zone = field,
            DATETIME_FIELD => datetime = field,
            _ => {}
        }
        found += 1;
    }

    if found < FIELD_COUNT {
        return Err(Rejection::TooFewFields { found });
    }
    if zone.is_empty() {
        return Err(Rejection::EmptyZone);
    }

    let hour = parse_hour(datetime)?;
    return Ok(PickupSlot { zone, hour });
}

/// Reads the hour out of `<date> <HH>:<rest>`.
pub fn parse_hour(datetime: &str) -> Result<u8, Rejection> {
    let bytes = datetime.as_bytes();

    let space_pos = memchr(b' ', bytes).ok_or(Rejection::MissingTime)?;
    let after_space = &bytes[space_pos + 1..];
    let colon_pos = memchr(b':', after_space).ok_or(Rejection::MissingMinutes)?;

    // tolerate extra blanks between the date and the hour
    let digits = trim_blanks_start(&after_space[..colon_pos]);
    if !is_all_digits(digits) {
        return Err(Rejection::MalformedHour);
    }

    let mut hour: u32 = 0;
    for c in digits {
        hour = hour * 10 + (c - b'0') as u32;
        if hour > 23 {
            return Err(Rejection::HourOutOfRange);
        }
    }
    return Ok(hour as u8);
}

/// Splits a line on commas, trimming each field.
///
/// Unlike `str::split` followed by filtering, empty fields (including a trailing one after
/// a final comma) are yielded so the caller can count them.
pub struct Fields<'a> {
    rest: Option<&'a str>,
}

impl<'a> Fields<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { rest: Some(line) }
    }
}

impl<'a> Iterator for Fields<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest?;
        match memchr(b',', rest.as_bytes()) {
            Some(comma_pos) => {
                self.rest = Some(&rest[comma_pos + 1..]);
                Some(trim_field(&rest[..comma_pos]))
            }
            None => {
                self.rest = None;
                Some(trim_field(rest))
            }
        }
    }
}

/// Decides whether the first non-blank line of an ingest pass is a header.
///
/// The first line is a header when it contains `TripID` anywhere, or when its first field is
/// not made up entirely of ascii digits. Every later line is data.
///
/// The second rule is a known source of false positives: a genuine trip whose id is not
/// purely numeric is dropped when it happens to be the first line of a pass.
#[derive(Debug, Default)]
pub struct HeaderGate {
    decided: bool,
}

impl HeaderGate {
    pub fn new() -> Self {
        Self { decided: false }
    }

    /// Must be handed non-blank lines only, blank lines do not use up the header check.
    pub fn is_header(&mut self, line: &[u8]) -> bool {
        if self.decided {
            return false;
        }
        self.decided = true;
        return looks_like_header(line);
    }
}

pub fn looks_like_header(line: &[u8]) -> bool {
    if memmem::find(line, HEADER_TOKEN).is_some() {
        return true;
    }
    let first_field = match memchr(b',', line) {
        Some(comma_pos) => &line[..comma_pos],
        None => line,
    };
    return !is_all_digits(trim_bytes(first_field));
}

pub fn is_blank(line: &[u8]) -> bool {
    return trim_bytes(line).is_empty();
}

fn is_trim_byte(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n')
}

fn trim_field(s: &str) -> &str {
    s.trim_matches([' ', '\t', '\r', '\n'])
}

fn trim_bytes(mut bytes: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = bytes {
        if !is_trim_byte(*first) {
            break;
        }
        bytes = rest;
    }
    while let [rest @ .., last] = bytes {
        if !is_trim_byte(*last) {
            break;
        }
        bytes = rest;
    }
    bytes
}

fn trim_blanks_start(mut bytes: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = bytes {
        bytes = rest;
    }
    bytes
}

fn is_all_digits(bytes: &[u8]) -> bool {
    !bytes.is_empty() && bytes.iter().all(u8::is_ascii_digit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_trip() {
        let slot = parse_record("1,Z1,Z2,2024-01-01 08:15,5.0,12.0").unwrap();
        assert_eq!(slot, PickupSlot { zone: "Z1", hour: 8 });
    }

    #[test]
    fn trims_fields_and_line_endings() {
        let slot = parse_record("  7 , Midtown ,Z2, 2024-01-01 23:59 ,1,2\r").unwrap();
        assert_eq!(slot, PickupSlot { zone: "Midtown", hour: 23 });
    }

    #[test]
    fn rejects_blank_lines() {
        assert_eq!(parse_record(""), Err(Rejection::Blank));
        assert_eq!(parse_record(" \t \r"), Err(Rejection::Blank));
    }

    #[test]
    fn five_fields_is_too_few_even_if_values_parse() {
        assert_eq!(
            parse_record("1,Z1,Z2,2024-01-01 08:15,5.0"),
            Err(Rejection::TooFewFields { found: 5 })
        );
    }

    #[test]
    fn trailing_empty_field_still_counts() {
        let slot = parse_record("1,Z1,Z2,2024-01-01 08:15,5.0,").unwrap();
        assert_eq!(slot.hour, 8);
    }

    #[test]
    fn extra_fields_are_ignored() {
        let slot = parse_record("1,Z1,Z2,2024-01-01 04:00,5.0,12.0,cash,extra").unwrap();
        assert_eq!(slot, PickupSlot { zone: "Z1", hour: 4 });
    }

    #[test]
    fn empty_zone_is_rejected() {
        assert_eq!(parse_record("1, ,Z2,2024-01-01 08:15,5.0,12.0"), Err(Rejection::EmptyZone));
    }

    #[test]
    fn hour_boundaries() {
        assert_eq!(parse_hour("2024-01-01 00:00"), Ok(0));
        assert_eq!(parse_hour("2024-01-01 23:00"), Ok(23));
        assert_eq!(parse_hour("2024-01-01 24:00"), Err(Rejection::HourOutOfRange));
        assert_eq!(parse_hour("2024-01-01 9:30:00"), Ok(9));
        assert_eq!(parse_hour("2024-01-01 0000023:00"), Ok(23));
    }

    #[test]
    fn hour_shape_errors() {
        assert_eq!(parse_hour("2024-01-01T08:15"), Err(Rejection::MissingTime));
        assert_eq!(parse_hour("2024-01-01 0815"), Err(Rejection::MissingMinutes));
        assert_eq!(parse_hour("2024-01-01 ab:15"), Err(Rejection::MalformedHour));
        assert_eq!(parse_hour("2024-01-01 :15"), Err(Rejection::MalformedHour));
        assert_eq!(parse_hour("2024-01-01 +8:15"), Err(Rejection::MalformedHour));
        assert_eq!(parse_hour("2024-01-01 8a:15"), Err(Rejection::MalformedHour));
    }

    #[test]
    fn extra_blanks_before_hour_are_tolerated() {
        assert_eq!(parse_hour("2024-01-01  07:15"), Ok(7));
    }

    #[test]
    fn date_is_not_validated() {
        assert_eq!(parse_hour("yesterday 12:00"), Ok(12));
        assert_eq!(parse_hour(" 12:00"), Ok(12));
    }

    #[test]
    fn huge_hour_does_not_overflow() {
        assert_eq!(
            parse_hour("2024-01-01 99999999999999999999:00"),
            Err(Rejection::HourOutOfRange)
        );
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert_eq!(parse_line(b"1,Z\xff,Z2,2024-01-01 08:15,5,6"), Err(Rejection::NotUtf8));
    }

    #[test]
    fn fields_keep_empties() {
        let fields: Vec<_> = Fields::new("a,,b , ").collect();
        assert_eq!(fields, vec!["a", "", "b", ""]);
    }

    #[test]
    fn header_detection() {
        assert!(looks_like_header(b"TripID,PickupZoneID,DropoffZoneID,PickupDateTime,DistanceKm,FareAmount"));
        assert!(looks_like_header(b"id,zone,dropoff,time,km,fare"));
        assert!(looks_like_header(b"1,TripID,Z2,2024-01-01 08:15,5,6"));
        assert!(looks_like_header(b",Z1,Z2,2024-01-01 08:15,5,6"));
        assert!(!looks_like_header(b" 42 ,Z1,Z2,2024-01-01 08:15,5,6"));
    }

    #[test]
    fn header_gate_only_checks_once() {
        let mut gate = HeaderGate::new();
        assert!(gate.is_header(b"trip,zone,dropoff,time,km,fare"));
        assert!(!gate.is_header(b"trip,zone,dropoff,time,km,fare"));

        let mut gate = HeaderGate::new();
        assert!(!gate.is_header(b"1,Z1,Z2,2024-01-01 08:15,5,6"));
        assert!(!gate.is_header(b"TripID,PickupZoneID"));
    }
}
