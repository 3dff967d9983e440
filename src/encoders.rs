//! The three constraint encoders (SectionChoice, RoomExclusion,
//! SoftConflict) plus the sequential-counter at-most-k subroutine they
//! share. All three translate Assignments to Literals via the Instance
//! Index before emitting clauses.

use std::collections::BTreeSet;

use crate::clause_sink::{ClauseSink, Tag};
use crate::config::EncodeConfig;
use crate::error::EncodeError;
use crate::index::InstanceIndex;
use crate::model::{Assignment, Bucket, Literal, Room};
use crate::time_model::Timeslot;

/// Owns the two pieces of mutable state the encoder pipeline threads
/// through every stage: the monotonically increasing literal counter and
/// the Clause Sink. Replaces the source's process-wide globals with
/// explicit state passed by value/reference.
pub struct EncoderContext<'a> {
    pub index: &'a InstanceIndex,
    pub sink: ClauseSink,
    pub current_literal: u32,
}

impl<'a> EncoderContext<'a> {
    pub fn new(index: &'a InstanceIndex, debug: bool) -> Self {
        EncoderContext {
            index,
            sink: ClauseSink::new(debug),
            current_literal: index.current_literal(),
        }
    }

    /// Allocates one fresh auxiliary literal, bumping the counter after use.
    fn alloc_literal(&mut self) -> Result<Literal, EncodeError> {
        let lit = Literal::new(self.current_literal);
        self.current_literal =
            self.current_literal
                .checked_add(1)
                .ok_or(EncodeError::LiteralOverflow {
                    attempted: self.current_literal as u64 + 1,
                })?;
        Ok(lit)
    }
}

fn literals_of(index: &InstanceIndex, assignments: &BTreeSet<Assignment>) -> Vec<Literal> {
    assignments
        .iter()
        .filter_map(|a| index.literal_of(a))
        .collect()
}

/// Emits `(-x1 v -x2)` for every `i < j` pair in `lits`, skipping pairs
/// whose literals coincide (duplicate candidates for the same assignment
/// should not happen but are defensively tolerated).
fn encode_at_most_one(sink: &mut ClauseSink, lits: &[Literal], tag: Tag) {
    for (i, &li) in lits.iter().enumerate() {
        for &lj in &lits[i + 1..] {
            if li == lj {
                continue;
            }
            sink.add(&[li.negative(), lj.negative()], tag.clone());
        }
    }
}

/// Emits `(-x v -y v aux?)` across the cross product `a x b`, excluding
/// identical-literal pairs.
fn encode_cross_exclusion(
    sink: &mut ClauseSink,
    a: &[Literal],
    b: &[Literal],
    aux: Option<Literal>,
    tag: Tag,
) {
    for &x in a {
        for &y in b {
            if x == y {
                continue;
            }
            let mut clause = vec![x.negative(), y.negative()];
            if let Some(aux) = aux {
                clause.push(aux.positive());
            }
            sink.add(&clause, tag.clone());
        }
    }
}

/// SectionChoice: exactly-one-candidate-per-section, for every section.
/// Tag: `("one course per section", section)`.
pub fn encode_section_choice(ctx: &mut EncoderContext) {
    for section in ctx.index.sections() {
        let assignments = ctx.index.assignments_of_section(section);
        let lits = literals_of(ctx.index, assignments);
        let tag = Tag::OneCoursePerSection(section.clone());

        let at_least_one: Vec<i64> = lits.iter().map(|l| l.positive()).collect();
        ctx.sink.add(&at_least_one, tag.clone());

        encode_at_most_one(&mut ctx.sink, &lits, tag);
    }
}

/// Canonical, order-independent key for the RoomExclusion dedup guard.
/// The source compares tuples of sets directly, which is order-sensitive
/// and misses dedups when the same pair of occupancy sets is visited in
/// the opposite order from a later timeslot; sorting each side by literal
/// value and storing the pair with the smaller side first fixes that.
fn canonical_pair_key(a: &[Literal], b: &[Literal]) -> (Vec<u32>, Vec<u32>) {
    let mut ka: Vec<u32> = a.iter().map(|l| l.get()).collect();
    let mut kb: Vec<u32> = b.iter().map(|l| l.get()).collect();
    ka.sort_unstable();
    kb.sort_unstable();
    if ka <= kb {
        (ka, kb)
    } else {
        (kb, ka)
    }
}

/// RoomExclusion: at-most-one assignment active per (room, overlapping
/// time) pair. Tag: a single `"room_literals"` tag for every such clause.
pub fn encode_room_exclusion(ctx: &mut EncoderContext) {
    let mut checked: BTreeSet<(Vec<u32>, Vec<u32>)> = BTreeSet::new();

    for room in ctx.index.rooms().cloned().collect::<Vec<Room>>() {
        let times_in_room: BTreeSet<Timeslot> = ctx.index.timeslots_in_room(&room).collect();

        for &t1 in &times_in_room {
            let c1 = ctx.index.assignments_in_room_at(&room, t1);
            if c1.is_empty() {
                continue;
            }
            let lits1 = literals_of(ctx.index, c1);

            let overlap: BTreeSet<Timeslot> = ctx
                .index
                .conflicts_of(t1)
                .intersection(&times_in_room)
                .copied()
                .collect();

            for t2 in overlap {
                let c2 = ctx.index.assignments_in_room_at(&room, t2);
                if c2.is_empty() {
                    continue;
                }
                let lits2 = literals_of(ctx.index, c2);

                let key = canonical_pair_key(&lits1, &lits2);
                if !checked.insert(key) {
                    continue;
                }

                if t1 == t2 {
                    encode_at_most_one(&mut ctx.sink, &lits1, Tag::RoomLiterals);
                } else {
                    encode_cross_exclusion(&mut ctx.sink, &lits1, &lits2, None, Tag::RoomLiterals);
                }
            }
        }
    }
}

/// Assignments of `section` that are active at some timeslot overlapping
/// `t` — i.e. the `conflicts1`/`conflicts2` sets from spec §4.4.3.
fn assignments_conflicting_at(
    index: &InstanceIndex,
    section: &crate::model::Section,
    t: Timeslot,
) -> BTreeSet<Assignment> {
    let own_times = index.times_of_section(section);
    let mut result = BTreeSet::new();
    for &overlapping_time in index.conflicts_of(t).intersection(own_times) {
        let at_time = index.assignments_at_time(overlapping_time);
        let own = index.assignments_of_section(section);
        result.extend(at_time.intersection(own).cloned());
    }
    result
}

/// SoftConflict(k): bounds how many pairs in `bucket` may be co-scheduled
/// on overlapping times, across the whole bucket, using the
/// sequential-counter cardinality family for `k >= 2`.
pub fn encode_soft_conflict(
    ctx: &mut EncoderContext,
    bucket: Bucket,
    k: u32,
) -> Result<(), EncodeError> {
    if k == 0 {
        return Ok(());
    }

    let pairs = match ctx.index.conflict_combinations().get(&bucket) {
        Some(p) => p.clone(),
        None => return Ok(()),
    };

    let mut aux_vars: Vec<Literal> = Vec::new();

    for (section1, section2) in pairs {
        let mutual_times: BTreeSet<Timeslot> = ctx
            .index
            .times_of_section(&section1)
            .union(ctx.index.times_of_section(&section2))
            .copied()
            .collect();

        for t in mutual_times {
            let conflicts1 = assignments_conflicting_at(ctx.index, &section1, t);
            let conflicts2 = assignments_conflicting_at(ctx.index, &section2, t);
            if conflicts1.is_empty() || conflicts2.is_empty() {
                continue;
            }

            let lits1 = literals_of(ctx.index, &conflicts1);
            let lits2 = literals_of(ctx.index, &conflicts2);

            if k == 1 {
                let tag = Tag::AtMostOnePair(bucket, section1.clone(), section2.clone());
                encode_cross_exclusion(&mut ctx.sink, &lits1, &lits2, None, tag);
            } else {
                let aux = ctx.alloc_literal()?;
                let tag =
                    Tag::AtMostOneWithAux(bucket, section1.clone(), section2.clone(), t);
                encode_cross_exclusion(&mut ctx.sink, &lits1, &lits2, Some(aux), tag);
                aux_vars.push(aux);
            }
        }
    }

    if aux_vars.len() > 1 {
        sequential_counter_at_most_k(ctx, &aux_vars, k, bucket)?;
    }

    Ok(())
}

/// The sequential-counter at-most-k encoding (Sinz). Given `x_1..x_n` and
/// bound `k`, introduces auxiliaries `s_i,j` (1<=i<=n, 1<=j<=k) allocated
/// fresh starting at the current literal counter; the counter ends at one
/// past the highest aux used.
fn sequential_counter_at_most_k(
    ctx: &mut EncoderContext,
    xs: &[Literal],
    k: u32,
    bucket: Bucket,
) -> Result<(), EncodeError> {
    let n = xs.len();
    let k = k as usize;
    debug_assert!(n >= 2, "sequential counter only invoked with >1 aux var");

    let mut s: Vec<Vec<Option<Literal>>> = vec![vec![None; k + 1]; n + 1];
    for i in 1..=n {
        for j in 1..=k {
            s[i][j] = Some(ctx.alloc_literal()?);
        }
    }
    let s = |i: usize, j: usize| s[i][j].expect("register allocated above");

    let tag = Tag::Sequential(bucket, k as u32);

    ctx.sink
        .add(&[xs[0].negative(), s(1, 1).positive()], tag.clone());
    for j in 2..=k {
        ctx.sink.add(&[s(1, j).negative()], tag.clone());
    }

    for i in 2..=n.saturating_sub(1) {
        ctx.sink
            .add(&[xs[i - 1].negative(), s(i, 1).positive()], tag.clone());
        ctx.sink
            .add(&[s(i - 1, 1).negative(), s(i, 1).positive()], tag.clone());
        for j in 2..=k {
            ctx.sink.add(
                &[xs[i - 1].negative(), s(i - 1, j - 1).negative(), s(i, j).positive()],
                tag.clone(),
            );
            ctx.sink
                .add(&[s(i - 1, j).negative(), s(i, j).positive()], tag.clone());
        }
    }

    for i in 2..=n {
        ctx.sink
            .add(&[xs[i - 1].negative(), s(i - 1, k).negative()], tag.clone());
    }

    Ok(())
}

/// The outcome of running all three encoders: the accumulated clauses plus
/// the literal counter's final value (one past the highest literal ever
/// allocated, including auxiliaries).
pub struct EncodeOutcome {
    pub sink: ClauseSink,
    pub final_literal: u32,
}

/// Runs all three encoders in the fixed order spec.md's reference
/// implementation uses: room exclusion, section choice, then soft
/// conflicts bucket-by-bucket.
pub fn encode_all(
    index: &InstanceIndex,
    config: &EncodeConfig,
) -> Result<EncodeOutcome, EncodeError> {
    let mut ctx = EncoderContext::new(index, config.debug);

    encode_room_exclusion(&mut ctx);
    encode_section_choice(&mut ctx);

    for &bucket in index.conflict_combinations().keys() {
        let k = config.bound_for(bucket);
        if k > 0 {
            encode_soft_conflict(&mut ctx, bucket, k)?;
        }
    }

    Ok(EncodeOutcome {
        sink: ctx.sink,
        final_literal: ctx.current_literal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{RawCourseData, RawRoomTime, RawSection};
    use crate::model::Section;
    use std::collections::BTreeMap;

    fn section(room_times: &[(&str, &str)]) -> RawSection {
        RawSection {
            room_times: room_times
                .iter()
                .map(|(r, t)| RawRoomTime(r.to_string(), t.to_string(), serde_json::Value::Null))
                .collect(),
            hard: Default::default(),
            soft: Default::default(),
        }
    }

    #[test]
    fn s1_single_candidate_emits_one_unit_clause() {
        let mut raw = RawCourseData::new();
        raw.insert(
            "CS 1000-01".to_string(),
            section(&[("Room A", "MWF0900+050")]),
        );
        let index = InstanceIndex::build(&raw).unwrap();
        let config = EncodeConfig {
            constraints: BTreeMap::new(),
            debug: false,
        };
        let outcome = encode_all(&index, &config).unwrap();
        let sink = outcome.sink;
        assert_eq!(sink.total_clauses(), 1);
        let groups = sink.groups();
        let clause = groups[0].1[0];
        assert_eq!(clause, &vec![1]);
    }

    #[test]
    fn s2_two_candidates_emit_three_clauses() {
        let mut raw = RawCourseData::new();
        raw.insert(
            "CS 1000-01".to_string(),
            section(&[("Room A", "MWF0900+050"), ("Room B", "MWF1000+050")]),
        );
        let index = InstanceIndex::build(&raw).unwrap();
        let config = EncodeConfig {
            constraints: BTreeMap::new(),
            debug: false,
        };
        let outcome = encode_all(&index, &config).unwrap();
        let sink = outcome.sink;
        assert_eq!(sink.total_clauses(), 3);
    }

    #[test]
    fn s3_overlapping_room_produces_exclusion_clause() {
        let mut raw = RawCourseData::new();
        raw.insert("X".to_string(), section(&[("Room A", "MWF0900+060")]));
        raw.insert("Y".to_string(), section(&[("Room A", "MWF0930+060")]));
        let index = InstanceIndex::build(&raw).unwrap();
        let config = EncodeConfig {
            constraints: BTreeMap::new(),
            debug: false,
        };
        let outcome = encode_all(&index, &config).unwrap();
        let sink = outcome.sink;
        let lx = index
            .literal_of(
                index
                    .assignments_of_section(&Section::new("X"))
                    .iter()
                    .next()
                    .unwrap(),
            )
            .unwrap();
        let ly = index
            .literal_of(
                index
                    .assignments_of_section(&Section::new("Y"))
                    .iter()
                    .next()
                    .unwrap(),
            )
            .unwrap();
        let expected = vec![lx.negative(), ly.negative()];
        let found = sink
            .groups()
            .into_iter()
            .flat_map(|(_, clauses)| clauses)
            .any(|c| c == &expected);
        assert!(found, "expected exclusion clause {:?} to be present", expected);
    }

    #[test]
    fn s4_non_overlapping_same_day_no_exclusion() {
        // end1 = 6000 + 3600 = 9600 = start2: half-open boundary, no conflict.
        let mut raw = RawCourseData::new();
        raw.insert("X".to_string(), section(&[("Room A", "M0100+060")]));
        raw.insert("Y".to_string(), section(&[("Room A", "M0160+050")]));
        let index = InstanceIndex::build(&raw).unwrap();
        let config = EncodeConfig {
            constraints: BTreeMap::new(),
            debug: false,
        };
        let outcome = encode_all(&index, &config).unwrap();
        let sink = outcome.sink;
        // only the two section-choice unit clauses should be present
        assert_eq!(sink.total_clauses(), 2);
    }

    #[test]
    fn s5_soft_k1_emits_single_clause_no_aux() {
        let mut raw = RawCourseData::new();
        raw.insert("A".to_string(), section(&[("Room A", "MWF0900+060")]));
        raw.insert("B".to_string(), section(&[("Room B", "MWF0930+060")]));
        raw.get_mut("A").unwrap().soft.insert("B".to_string(), 99);
        let index = InstanceIndex::build(&raw).unwrap();
        let mut constraints = BTreeMap::new();
        constraints.insert(99u32, 1u32);
        let config = EncodeConfig {
            constraints,
            debug: false,
        };
        let current_literal_before = index.current_literal();
        let outcome = encode_all(&index, &config).unwrap();
        let sink = outcome.sink;
        // two section-choice unit clauses + one soft exclusion clause
        assert_eq!(sink.total_clauses(), 3);
        // k=1 never allocates an aux literal
        assert_eq!(outcome.final_literal, current_literal_before);
    }

    #[test]
    fn s6_soft_k2_three_pairs_allocates_n_times_k_aux_vars() {
        let mut raw = RawCourseData::new();
        let sections = [
            ("A", "Room A", "M0900+060"),
            ("B", "Room B", "M0900+060"),
            ("C", "Room C", "M0900+060"),
            ("D", "Room D", "M0900+060"),
        ];
        for (name, room, time) in sections {
            raw.insert(name.to_string(), section(&[(room, time)]));
        }
        // three soft pairs under bucket 60: (A,B), (A,C), (A,D)
        for other in ["B", "C", "D"] {
            raw.get_mut("A").unwrap().soft.insert(other.to_string(), 60);
        }
        let index = InstanceIndex::build(&raw).unwrap();
        let mut constraints = BTreeMap::new();
        constraints.insert(60u32, 2u32);
        let config = EncodeConfig {
            constraints,
            debug: false,
        };
        let literal_before = index.current_literal();
        let mut ctx = EncoderContext::new(&index, false);
        encode_soft_conflict(&mut ctx, Bucket(60), 2).unwrap();
        // 3 pair-aux literals + 3*2 sequential-counter registers
        assert_eq!(ctx.current_literal, literal_before + 3 + 6);
    }
}
