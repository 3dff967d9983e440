//! Core domain newtypes: sections, rooms, assignments, literals, buckets.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::time_model::DayPatternTimeslot;

/// A section identifier, e.g. `"CS 2420-01"`. Unique within an instance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Section(Arc<str>);

impl Section {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Section(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A room identifier, e.g. `"Smith 108"`. Unique within an instance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Room(Arc<str>);

impl Room {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Room(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A candidate placement of one section into a room at a day-pattern
/// timeslot. Referred to as "CRT" (course-room-time) in the original source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Assignment {
    pub section: Section,
    pub room: Room,
    pub timeslot: DayPatternTimeslot,
}

/// A penalty tier tag grouping soft-conflict section pairs, e.g. 100 for
/// hard conflicts, 99/60/45/32/30 for soft tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Bucket(pub u32);

/// The reserved bucket tag for hard (must-not-co-schedule) conflicts.
pub const HARD_BUCKET: Bucket = Bucket(100);

/// A positive SAT literal. Literal 0 is reserved by DIMACS and never
/// produced by this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal(u32);

impl Literal {
    pub fn new(value: u32) -> Self {
        assert!(value >= 1, "literal 0 is reserved by DIMACS");
        Literal(value)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn positive(self) -> i64 {
        self.0 as i64
    }

    pub fn negative(self) -> i64 {
        -(self.0 as i64)
    }
}
