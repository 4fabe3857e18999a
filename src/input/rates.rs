//! Code for reading the rate table from a CSV file.
use super::*;
use crate::rate_table::{RateTable, YearRates};
use log::debug;
use serde::Deserialize;
use std::path::Path;

const RATES_FILE_NAME: &str = "rates.csv";

/// A row of the rates CSV file.
///
/// The file may contain further columns (e.g. `included`), which are ignored.
#[derive(Debug, PartialEq, Deserialize)]
struct RateRow {
    #[serde(rename = "Year")]
    year: u32,
    #[serde(rename = "Demo_b")]
    demolition: f64,
    #[serde(rename = "New_b")]
    new_construction: f64,
    #[serde(rename = "Retro_b")]
    retrofit: f64,
    #[serde(rename = "EUI")]
    eui: f64,
    #[serde(rename = "PG")]
    population_growth: f64,
}

impl RateRow {
    fn rates(&self) -> YearRates {
        YearRates {
            demolition: self.demolition,
            new_construction: self.new_construction,
            retrofit: self.retrofit,
            eui: self.eui,
            population_growth: self.population_growth,
        }
    }
}

/// Check that the rows cover consecutive years and contain usable values
fn validate_rate_rows(rows: &[RateRow]) -> Result<()> {
    for pair in rows.windows(2) {
        ensure!(
            pair[1].year == pair[0].year + 1,
            "Years must be consecutive and in order (found {} after {})",
            pair[1].year,
            pair[0].year
        );
    }

    for row in rows {
        let year = row.year;
        ensure!(
            [row.demolition, row.new_construction, row.retrofit, row.eui]
                .iter()
                .all(|value| value.is_finite()),
            "Rates for {year} must be finite numbers"
        );
        ensure!(
            row.population_growth.is_finite() && row.population_growth > 0.0,
            "Population growth for {year} must be a finite number greater than zero"
        );

        if row.demolition < 0.0 || row.new_construction < 0.0 || row.retrofit < 0.0 {
            debug!("Negative rate(s) for {year} will be used as magnitudes");
        }
    }

    Ok(())
}

fn read_rate_table_from_rows(rows: &[RateRow]) -> Result<RateTable> {
    validate_rate_rows(rows)?;

    // read_csv guarantees at least one row
    let first_year = rows.first().map_or(0, |row| row.year);
    Ok(RateTable::new(first_year, rows.iter().map(RateRow::rates)))
}

/// Read the rate table from the specified model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The rate table, with offset zero at the earliest year in the file, or an error
pub fn read_rate_table(model_dir: &Path) -> Result<RateTable> {
    let file_path = model_dir.join(RATES_FILE_NAME);
    let rows: Vec<RateRow> = read_csv(&file_path)?;
    read_rate_table_from_rows(&rows).with_context(|| input_err_msg(&file_path))
}
