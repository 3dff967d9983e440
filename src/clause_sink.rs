//! The deduplicating clause accumulator, grouped by provenance tag.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{Bucket, Section};
use crate::time_model::Timeslot;

/// Opaque provenance label attached to every clause an encoder emits.
/// Carries enough structure to debug-print a human-readable comment and to
/// give each encoder call-site a stable dedup key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tag {
    OneCoursePerSection(Section),
    RoomLiterals,
    AtMostOnePair(Bucket, Section, Section),
    AtMostOneWithAux(Bucket, Section, Section, Timeslot),
    Sequential(Bucket, u32),
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tag::OneCoursePerSection(s) => write!(f, "one course per section {s}"),
            Tag::RoomLiterals => write!(f, "room_literals"),
            Tag::AtMostOnePair(b, s1, s2) => write!(f, "atmost_one {} {s1} {s2}", b.0),
            Tag::AtMostOneWithAux(b, s1, s2, ts) => {
                write!(
                    f,
                    "atmost_one {} {s1} {s2} {}{}-{}",
                    b.0,
                    ts.day.as_char(),
                    ts.start_seconds,
                    ts.end_seconds
                )
            }
            Tag::Sequential(b, k) => write!(f, "{} {k} sequential", b.0),
        }
    }
}

/// A clause is a nonempty, ordered, nonzero signed-integer disjunction.
pub type Clause = Vec<i64>;

enum Dedup {
    /// One dedup set per tag; each tag's clauses are later written as a
    /// commented group, in first-seen tag order.
    PerTag {
        seen: BTreeMap<Tag, BTreeSet<Clause>>,
        order: Vec<Tag>,
    },
    /// A single global dedup set.
    Global(BTreeSet<Clause>),
}

/// Accumulates clauses, rejecting duplicates according to the active mode.
pub struct ClauseSink {
    dedup: Dedup,
    total_clauses: u64,
}

impl ClauseSink {
    pub fn new(debug: bool) -> Self {
        ClauseSink {
            dedup: if debug {
                Dedup::PerTag {
                    seen: BTreeMap::new(),
                    order: Vec::new(),
                }
            } else {
                Dedup::Global(BTreeSet::new())
            },
            total_clauses: 0,
        }
    }

    /// Adds one clause under `tag`. `clause` must be nonempty and contain no
    /// literal 0. Silently drops an exact duplicate (debug: per-tag;
    /// normal: global) without error.
    pub fn add(&mut self, clause: &[i64], tag: Tag) {
        debug_assert!(!clause.is_empty(), "clauses must be nonempty");
        debug_assert!(clause.iter().all(|&l| l != 0), "literal 0 is reserved");

        let clause: Clause = clause.to_vec();
        let accepted = match &mut self.dedup {
            Dedup::PerTag { seen, order } => {
                let set = seen.entry(tag.clone()).or_insert_with(|| {
                    order.push(tag.clone());
                    BTreeSet::new()
                });
                set.insert(clause)
            }
            Dedup::Global(set) => set.insert(clause),
        };
        if accepted {
            self.total_clauses += 1;
        }
    }

    /// Adds every clause in `clauses` under the same `tag`.
    pub fn add_many(&mut self, clauses: impl IntoIterator<Item = Clause>, tag: Tag) {
        for clause in clauses {
            self.add(&clause, tag.clone());
        }
    }

    pub fn total_clauses(&self) -> u64 {
        self.total_clauses
    }

    /// Iterates `(tag, clauses)` groups in first-seen tag order for debug
    /// mode, or a single unlabeled group for normal mode.
    pub fn groups(&self) -> Vec<(Option<&Tag>, Vec<&Clause>)> {
        match &self.dedup {
            Dedup::PerTag { seen, order } => order
                .iter()
                .map(|tag| (Some(tag), seen[tag].iter().collect()))
                .collect(),
            Dedup::Global(set) => vec![(None, set.iter().collect())],
        }
    }
}
