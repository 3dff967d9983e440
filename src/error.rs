//! Error kinds for the encoder, per the error-handling design: every kind is
//! fatal for the current run, there is no retry and no partial output.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("malformed TimeCode: {0}")]
    MalformedTimeCode(String),

    #[error("invalid interval: start {start} >= end {end}")]
    InvalidInterval { start: u32, end: u32 },

    #[error("section '{0}' referenced in hard/soft conflicts but never defined")]
    UnknownSection(String),

    #[error("literal counter overflowed while allocating variable {attempted}")]
    LiteralOverflow { attempted: u64 },

    #[error("clause contains both {lit} and its negation")]
    TautologousClause { lit: i64 },

    #[error("I/O failure writing CNF output: {0}")]
    Io(#[from] std::io::Error),
}
