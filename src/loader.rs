//! The raw course-data input contract (spec §6). Deserializes the JSON shape
//! a driver hands to the core and parses `TimeCode` strings into
//! `DayPatternTimeslot`s. This is the minimal stand-in for the real loader,
//! which is an external collaborator.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::error::EncodeError;
use crate::time_model::{Day, DayPatternTimeslot};

/// One `(room, time_code, _)` candidate meeting pattern for a section. The
/// third element is unused by the core; it is kept as opaque JSON so callers
/// can round-trip whatever metadata they attach to it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRoomTime(pub String, pub String, pub serde_json::Value);

/// The raw per-section record as supplied by the loader.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawSection {
    pub room_times: Vec<RawRoomTime>,
    #[serde(default)]
    pub hard: BTreeSet<String>,
    #[serde(default)]
    pub soft: BTreeMap<String, u32>,
}

/// The full raw instance: one record per section.
pub type RawCourseData = BTreeMap<String, RawSection>;

/// Parses a `TimeCode` of the form `<days><HHMM>+<DDD>`.
///
/// `<days>` is a run of weekday characters, `<HHMM>` a zero-padded 4-digit
/// clock time, `<DDD>` a duration in minutes. Both the clock time and the
/// duration are multiplied by 60 to land in seconds, matching the source's
/// `calculate_time_slot`: `start = HHMM * 60`, `end = start + DDD * 60`.
/// Preserved verbatim per spec's Open Question on whether this is a
/// double-scaling bug; the encoded domain only needs internal consistency.
pub fn parse_time_code(code: &str) -> Result<DayPatternTimeslot, EncodeError> {
    let plus = code.find('+').ok_or_else(|| {
        EncodeError::MalformedTimeCode(format!("missing '+' duration separator in '{code}'"))
    })?;

    if plus < 4 {
        return Err(EncodeError::MalformedTimeCode(format!(
            "TimeCode '{code}' too short for a 4-digit clock time"
        )));
    }

    let days_str = &code[..plus - 4];
    let hhmm_str = &code[plus - 4..plus];
    let duration_str = &code[plus + 1..];

    if days_str.is_empty() {
        return Err(EncodeError::MalformedTimeCode(format!(
            "TimeCode '{code}' has no day characters"
        )));
    }

    let mut days = BTreeSet::new();
    for c in days_str.chars() {
        days.insert(Day::from_char(c)?);
    }

    let hhmm: u32 = hhmm_str.parse().map_err(|_| {
        EncodeError::MalformedTimeCode(format!("bad clock time '{hhmm_str}' in '{code}'"))
    })?;
    let duration: u32 = duration_str.parse().map_err(|_| {
        EncodeError::MalformedTimeCode(format!("bad duration '{duration_str}' in '{code}'"))
    })?;

    let start_seconds = hhmm * 60;
    let end_seconds = start_seconds + duration * 60;

    DayPatternTimeslot::new(days, start_seconds, end_seconds)
}
