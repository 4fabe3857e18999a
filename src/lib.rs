//! Building stock turnover modelling.
//!
//! The floor space of a building stock is tracked through a chain of vintages. Each vintage
//! accumulates yearly demolition, new construction and retrofit activity from a table of rates and
//! is closed into an immutable snapshot, which seeds the next vintage.
#![warn(missing_docs)]
pub mod cli;
pub mod error;
pub mod eui;
pub mod input;
pub mod ledger;
pub mod log;
pub mod model;
pub mod output;
pub mod rate_table;
pub mod settings;
pub mod simulation;
pub mod units;
pub mod vintage;

#[cfg(test)]
mod fixture;
