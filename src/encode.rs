//! Top-level pipeline wiring the Instance Index, the three encoders and the
//! CNF Writer together — the Rust analogue of the source's `main.py::main`.

use std::path::{Path, PathBuf};

use log::info;

use crate::cnf_writer;
use crate::config::EncodeConfig;
use crate::encoders::encode_all;
use crate::error::EncodeError;
use crate::index::InstanceIndex;
use crate::loader::RawCourseData;

/// Summary of a successful encode, handed back to the driver.
#[derive(Debug, Clone)]
pub struct EncodeReport {
    pub output_path: PathBuf,
    pub total_clauses: u64,
    pub max_variable: u32,
}

/// Runs the full pipeline: build the Instance Index, run the three
/// encoders, then write the accumulated clauses to `output_path`.
///
/// On any fatal error the CNF is written to a temporary path first and only
/// renamed into place on success, so a partially-written file is never
/// left at `output_path` (the concrete realization of "discard the output
/// file on any fatal error" for a real filesystem).
pub fn encode(
    raw: &RawCourseData,
    config: &EncodeConfig,
    output_path: impl AsRef<Path>,
) -> Result<EncodeReport, EncodeError> {
    let output_path = output_path.as_ref();

    info!(
        "building instance index from {} sections...",
        raw.len()
    );
    let index = InstanceIndex::build(raw)?;

    info!(
        "running constraint encoders (debug={})...",
        config.debug
    );
    let outcome = encode_all(&index, config)?;
    let max_variable = outcome.final_literal.saturating_sub(1).max(1);

    let tmp_path = output_path.with_extension("cnf.tmp");
    cnf_writer::write_cnf(&outcome.sink, max_variable, &tmp_path)?;
    std::fs::rename(&tmp_path, output_path)?;

    info!(
        "wrote {} clauses over {} variables to {}",
        outcome.sink.total_clauses(),
        max_variable,
        output_path.display()
    );

    Ok(EncodeReport {
        output_path: output_path.to_path_buf(),
        total_clauses: outcome.sink.total_clauses(),
        max_variable,
    })
}
