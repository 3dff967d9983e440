//! The Instance Index: the immutable, preprocessed view of the scheduling
//! instance built once from raw course data and frozen. Encoders read
//! through it but can never mutate it — accessors return borrowed views
//! rather than `defaultdict`-style implicit-insertion lookups.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;

use crate::error::EncodeError;
use crate::loader::RawCourseData;
use crate::loader::parse_time_code;
use crate::model::{Assignment, Bucket, Literal, Room, Section, HARD_BUCKET};
use crate::time_model::{Timeslot, TimeConflicts};

/// Fixed soft-conflict penalty tiers the source recognizes, beyond the
/// reserved hard-conflict tag 100.
pub const SOFT_TIERS: &[u32] = &[99, 60, 45, 32, 30];

#[derive(Debug, Default)]
struct EmptySets {
    assignments: BTreeSet<Assignment>,
    timeslots: BTreeSet<Timeslot>,
}

/// The frozen, read-only preprocessed view of a scheduling instance.
#[derive(Debug)]
pub struct InstanceIndex {
    course_to_literal: BTreeMap<Assignment, Literal>,
    literal_to_course: BTreeMap<u32, Assignment>,
    section_to_assignments: BTreeMap<Section, BTreeSet<Assignment>>,
    building_room_course: BTreeMap<Room, BTreeMap<Timeslot, BTreeSet<Assignment>>>,
    courses_by_time: BTreeMap<Timeslot, BTreeSet<Assignment>>,
    times_by_section: BTreeMap<Section, BTreeSet<Timeslot>>,
    time_conflicts: TimeConflicts,
    conflict_combinations: BTreeMap<Bucket, BTreeSet<(Section, Section)>>,
    current_literal: u32,
    empty: EmptySets,
}

fn unordered_pair(a: Section, b: Section) -> (Section, Section) {
    if a <= b { (a, b) } else { (b, a) }
}

impl InstanceIndex {
    /// Builds the full index in one pass over the raw course data, then
    /// freezes it. Fails on malformed TimeCodes, non-positive intervals, or
    /// a hard/soft conflict referencing a section that was never defined.
    pub fn build(raw: &RawCourseData) -> Result<Self, EncodeError> {
        for raw_section in raw.values() {
            for referenced in raw_section.hard.iter().chain(raw_section.soft.keys()) {
                if !raw.contains_key(referenced) {
                    return Err(EncodeError::UnknownSection(referenced.clone()));
                }
            }
        }

        let mut course_to_literal: BTreeMap<Assignment, Literal> = BTreeMap::new();
        let mut literal_to_course: BTreeMap<u32, Assignment> = BTreeMap::new();
        let mut section_to_assignments: BTreeMap<Section, BTreeSet<Assignment>> = BTreeMap::new();
        let mut building_room_course: BTreeMap<Room, BTreeMap<Timeslot, BTreeSet<Assignment>>> =
            BTreeMap::new();
        let mut courses_by_time: BTreeMap<Timeslot, BTreeSet<Assignment>> = BTreeMap::new();
        let mut times_by_section: BTreeMap<Section, BTreeSet<Timeslot>> = BTreeMap::new();
        let mut all_timeslots: BTreeSet<Timeslot> = BTreeSet::new();
        let mut current_literal: u32 = 1;

        // Sections are iterated in sorted key order (BTreeMap) so literal
        // assignment is deterministic across runs on the same input.
        for (section_str, raw_section) in raw.iter() {
            let section = Section::new(section_str.clone());

            for raw_rt in &raw_section.room_times {
                let room = Room::new(raw_rt.0.clone());
                let pattern = parse_time_code(&raw_rt.1)?;
                let assignment = Assignment {
                    section: section.clone(),
                    room: room.clone(),
                    timeslot: pattern.clone(),
                };

                let literal = Literal::new(current_literal);
                current_literal = current_literal
                    .checked_add(1)
                    .ok_or(EncodeError::LiteralOverflow {
                        attempted: current_literal as u64 + 1,
                    })?;
                course_to_literal.insert(assignment.clone(), literal);
                literal_to_course.insert(literal.get(), assignment.clone());

                section_to_assignments
                    .entry(section.clone())
                    .or_default()
                    .insert(assignment.clone());

                for day_slot in pattern.explode() {
                    all_timeslots.insert(day_slot);
                    building_room_course
                        .entry(room.clone())
                        .or_default()
                        .entry(day_slot)
                        .or_default()
                        .insert(assignment.clone());
                    courses_by_time
                        .entry(day_slot)
                        .or_default()
                        .insert(assignment.clone());
                    times_by_section
                        .entry(section.clone())
                        .or_default()
                        .insert(day_slot);
                }
            }
        }

        let time_conflicts = TimeConflicts::build(all_timeslots.iter().copied());

        let mut conflict_combinations: BTreeMap<Bucket, BTreeSet<(Section, Section)>> =
            BTreeMap::new();
        conflict_combinations.insert(HARD_BUCKET, BTreeSet::new());
        for &tier in SOFT_TIERS {
            conflict_combinations.insert(Bucket(tier), BTreeSet::new());
        }

        for (section1_str, section2_str) in raw.keys().tuple_combinations() {
            let section1 = Section::new(section1_str.clone());
            let section2 = Section::new(section2_str.clone());
            let raw1 = &raw[section1_str];
            let raw2 = &raw[section2_str];

            let pair = unordered_pair(section1.clone(), section2.clone());

            if raw1.hard.contains(section2_str) || raw2.hard.contains(section1_str) {
                conflict_combinations
                    .get_mut(&HARD_BUCKET)
                    .unwrap()
                    .insert(pair.clone());
            }

            for &tier in SOFT_TIERS {
                let matches = raw1.soft.get(section2_str) == Some(&tier)
                    || raw2.soft.get(section1_str) == Some(&tier);
                if matches {
                    conflict_combinations
                        .get_mut(&Bucket(tier))
                        .unwrap()
                        .insert(pair.clone());
                }
            }
        }

        Ok(InstanceIndex {
            course_to_literal,
            literal_to_course,
            section_to_assignments,
            building_room_course,
            courses_by_time,
            times_by_section,
            time_conflicts,
            conflict_combinations,
            current_literal,
            empty: EmptySets::default(),
        })
    }

    pub fn literal_of(&self, assignment: &Assignment) -> Option<Literal> {
        self.course_to_literal.get(assignment).copied()
    }

    pub fn assignment_of(&self, literal: u32) -> Option<&Assignment> {
        self.literal_to_course.get(&literal)
    }

    pub fn assignments_of_section(&self, section: &Section) -> &BTreeSet<Assignment> {
        self.section_to_assignments
            .get(section)
            .unwrap_or(&self.empty.assignments)
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.section_to_assignments.keys()
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.building_room_course.keys()
    }

    pub fn assignments_in_room_at(&self, room: &Room, ts: Timeslot) -> &BTreeSet<Assignment> {
        self.building_room_course
            .get(room)
            .and_then(|by_time| by_time.get(&ts))
            .unwrap_or(&self.empty.assignments)
    }

    pub fn timeslots_in_room(&self, room: &Room) -> impl Iterator<Item = Timeslot> + '_ {
        self.building_room_course
            .get(room)
            .into_iter()
            .flat_map(|by_time| by_time.keys().copied())
    }

    pub fn assignments_at_time(&self, ts: Timeslot) -> &BTreeSet<Assignment> {
        self.courses_by_time.get(&ts).unwrap_or(&self.empty.assignments)
    }

    pub fn times_of_section(&self, section: &Section) -> &BTreeSet<Timeslot> {
        self.times_by_section
            .get(section)
            .unwrap_or(&self.empty.timeslots)
    }

    pub fn conflicts_of(&self, ts: Timeslot) -> &BTreeSet<Timeslot> {
        self.time_conflicts.conflicts_of(ts)
    }

    pub fn conflict_combinations(&self) -> &BTreeMap<Bucket, BTreeSet<(Section, Section)>> {
        &self.conflict_combinations
    }

    pub fn current_literal(&self) -> u32 {
        self.current_literal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{RawRoomTime, RawSection};

    fn raw_with(entries: &[(&str, &str, &str)]) -> RawCourseData {
        let mut data = RawCourseData::new();
        for (section, room, time) in entries {
            data.entry(section.to_string())
                .or_insert_with(|| RawSection {
                    room_times: vec![],
                    hard: Default::default(),
                    soft: Default::default(),
                })
                .room_times
                .push(RawRoomTime(
                    room.to_string(),
                    time.to_string(),
                    serde_json::Value::Null,
                ));
        }
        data
    }

    #[test]
    fn literal_bijection_is_total_and_injective() {
        let raw = raw_with(&[
            ("CS 1000-01", "Room A", "MWF0900+050"),
            ("CS 1000-01", "Room B", "MWF1000+050"),
        ]);
        let index = InstanceIndex::build(&raw).unwrap();
        let section = Section::new("CS 1000-01");
        let assignments = index.assignments_of_section(&section);
        assert_eq!(assignments.len(), 2);
        let mut literals = BTreeSet::new();
        for a in assignments {
            let lit = index.literal_of(a).unwrap();
            assert_eq!(index.assignment_of(lit.get()).unwrap(), a);
            literals.insert(lit.get());
        }
        assert_eq!(literals.len(), 2);
        assert_eq!(index.current_literal(), 3);
    }

    #[test]
    fn hard_conflict_populates_bucket_100() {
        let mut raw = raw_with(&[
            ("A", "Room A", "MWF0900+050"),
            ("B", "Room A", "MWF1000+050"),
        ]);
        raw.get_mut("A").unwrap().hard.insert("B".to_string());
        let index = InstanceIndex::build(&raw).unwrap();
        let hard = index.conflict_combinations().get(&HARD_BUCKET).unwrap();
        assert!(hard.contains(&(Section::new("A"), Section::new("B"))));
    }

    #[test]
    fn unknown_section_in_hard_is_rejected() {
        let mut raw = raw_with(&[("A", "Room A", "MWF0900+050")]);
        raw.get_mut("A").unwrap().hard.insert("Ghost".to_string());
        assert!(InstanceIndex::build(&raw).is_err());
    }
}
