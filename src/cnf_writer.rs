//! Serializes an accumulated Clause Sink to the DIMACS CNF file format.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::clause_sink::ClauseSink;
use crate::error::EncodeError;

/// Buffer size hint for the underlying `BufWriter`, matching the source's
/// explicit 512KB write buffer.
const WRITE_BUFFER_BYTES: usize = 512 * 1024;

/// Writes `sink` to `path` in DIMACS CNF format.
///
/// `max_variable` should be at least `current_literal - 1`; using the final
/// literal counter value directly is acceptable and common. Debug mode
/// writes one `c <tag>` comment line per provenance tag followed by that
/// tag's clauses, in first-seen tag order; normal mode writes every
/// deduped clause with no grouping.
pub fn write_cnf(
    sink: &ClauseSink,
    max_variable: u32,
    path: impl AsRef<Path>,
) -> Result<(), EncodeError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_BYTES, file);

    writeln!(writer, "p cnf {} {}", max_variable, sink.total_clauses())?;

    for (tag, clauses) in sink.groups() {
        if let Some(tag) = tag {
            writeln!(writer, "c {tag}")?;
        }
        for clause in clauses {
            write_clause_line(&mut writer, clause)?;
        }
    }

    writer.flush()?;
    Ok(())
}

fn write_clause_line(writer: &mut impl Write, clause: &[i64]) -> Result<(), EncodeError> {
    let mut line = String::with_capacity(clause.len() * 4 + 2);
    for lit in clause {
        line.push_str(&lit.to_string());
        line.push(' ');
    }
    line.push_str("0\n");
    writer.write_all(line.as_bytes())?;
    Ok(())
}
