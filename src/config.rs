//! The constraints map and debug mode flag: the two external inputs beyond
//! the raw course data (spec §6).

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::model::Bucket;

/// Bound `k` per conflict bucket, plus the Clause Sink / Writer mode flag.
#[derive(Debug, Clone, Deserialize)]
pub struct EncodeConfig {
    /// Bucket tag -> at-most-k bound. A bucket absent from this map, or
    /// present with `k = 0`, emits no constraint.
    pub constraints: BTreeMap<u32, u32>,
    /// Debug mode selects per-tag Clause Sink dedup and commented CNF output.
    #[serde(default)]
    pub debug: bool,
}

impl EncodeConfig {
    pub fn bound_for(&self, bucket: Bucket) -> u32 {
        self.constraints.get(&bucket.0).copied().unwrap_or(0)
    }
}
