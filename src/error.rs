//! Errors raised by the stock turnover core.
//!
//! The rate table, vintage simulator, EUI aggregator and vintage ledger report failures with
//! [`StockError`]. Code above the core (input loading, the simulation driver, the CLI) works with
//! [`anyhow::Result`] and converts these errors with `?`.
use crate::rate_table::RateKind;
use thiserror::Error;

/// An error raised while simulating or aggregating building-stock vintages
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StockError {
    /// A rate table or reference sequence was indexed outside its bounds
    #[error("Index {index} is out of range for {kind} (length {len})")]
    IndexOutOfRange {
        /// The sequence which was indexed
        kind: RateKind,
        /// The offending offset (may be negative)
        index: i64,
        /// The length of the sequence
        len: usize,
    },
    /// An end year was requested which lies before the start year
    #[error("Invalid year range: end year {end} is before start year {start}")]
    InvalidRange {
        /// The first year of the range
        start: u32,
        /// The requested end year
        end: u32,
    },
    /// The operation is not permitted in the vintage's current state
    #[error("Invalid vintage state: {0}")]
    InvalidState(String),
    /// The vintage has already been run
    #[error("Vintage {0} has already been run")]
    AlreadyRun(String),
    /// The vintage is longer than the sequence it is being aligned against
    #[error("Vintage spans {span} years but only {available} aligned values are available")]
    LengthMismatch {
        /// Number of years in the vintage
        span: usize,
        /// Number of values in the aligned sequence
        available: usize,
    },
    /// The vintage has no simulated years
    #[error("Vintage starting in {0} has no simulated years")]
    EmptyVintage(u32),
    /// An EUI would be divided by zero total floor space
    #[error("Total floor space is zero for {0}")]
    ZeroFloorSpace(String),
    /// A vintage with the same label has already been archived
    #[error("Vintage {0} is already in the ledger")]
    DuplicateVintage(String),
}
