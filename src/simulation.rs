//! Functionality for running the building stock simulation.
use crate::ledger::VintageLedger;
use crate::model::Model;
use crate::output::DataWriter;
use crate::vintage::{Vintage, VintageSnapshot};
use anyhow::{Context, Result};
use log::{info, warn};
use std::path::Path;
use std::rc::Rc;

/// Run the simulation.
///
/// The first vintage starts in the model's start year. Each later vintage is opened by closing
/// the previous one, and the final vintage is closed once it has been run.
///
/// # Arguments:
///
/// * `model` - The model to run
/// * `output_path` - The folder to which output files will be written
/// * `debug_model` - Whether to write additional information (e.g. retrofit-eligible floor
///   space) to file
///
/// # Returns
///
/// The ledger of closed vintages
pub fn run(model: &Model, output_path: &Path, debug_model: bool) -> Result<VintageLedger> {
    let mut writer = DataWriter::create(output_path, model, debug_model)?;
    let params = &model.parameters;

    let mut spans = params.vintage_spans();
    let Some((start_year, end_year)) = spans.next() else {
        // Validation ensures there is at least one vintage
        return Ok(VintageLedger::new());
    };

    info!("Opening vintage {start_year}-{end_year}");
    let mut vintage = Vintage::new(
        Rc::clone(&model.rates),
        start_year,
        params.starting_stock,
        params.remaining_stock,
        params.population,
    );
    vintage.extend_to(end_year)?;
    vintage.run()?;

    let mut ledger = VintageLedger::new();
    for (_, end_year) in spans {
        let (closed, next) = ledger
            .transition(vintage, end_year, params.remaining_stock, params.population)
            .with_context(|| format!("Failed to open vintage ending in {end_year}"))?;
        write_snapshot(model, &mut writer, &closed)?;
        vintage = next;
    }

    let closed = ledger.close_final(vintage)?;
    write_snapshot(model, &mut writer, &closed)?;
    writer.flush()?;

    Ok(ledger)
}

/// Write a closed vintage and, if it can be calculated, its blended EUI series
fn write_snapshot(
    model: &Model,
    writer: &mut DataWriter,
    snapshot: &VintageSnapshot,
) -> Result<()> {
    writer.write_vintage(snapshot)?;

    let params = &model.parameters;
    match snapshot.blended_eui(&params.historical, params.efficient_eui) {
        Ok(eui) => writer.write_blended_eui(snapshot, &eui)?,
        Err(err) => warn!(
            "Blended EUI not calculated for vintage {}: {err}",
            snapshot.label()
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{model_parameters, rate_table};
    use crate::model::ModelParameters;
    use crate::rate_table::RateTable;
    use crate::units::Area;
    use rstest::rstest;
    use tempfile::tempdir;

    #[rstest]
    fn test_run(model_parameters: ModelParameters, rate_table: RateTable) {
        let dir = tempdir().unwrap();
        let model = Model {
            model_path: dir.path().to_path_buf(),
            parameters: model_parameters,
            rates: Rc::new(rate_table),
        };

        let ledger = run(&model, dir.path(), true).unwrap();
        let labels: Vec<_> = ledger.iter().map(|(label, _)| label).collect();
        assert_eq!(labels, ["2017-2018", "2019-2020"]);

        // The second vintage starts from the stock recorded in the final year of the first
        let first = ledger.get("2017-2018").unwrap();
        let second = ledger.get("2019-2020").unwrap();
        assert_eq!(first.total_area, [Area(295.745), Area(298.79)]);
        assert_eq!(second.total_area[0], Area(298.79));
        assert_eq!(second.population[0], first.population[0]);
        assert_eq!(
            second.remaining_stock[0],
            model.parameters.remaining_stock - second.demolished_area[0]
        );

        for file_name in [
            "trajectories.csv",
            "vintages.csv",
            "blended_eui.csv",
            "debug_remaining_stock.csv",
            "metadata.toml",
        ] {
            assert!(dir.path().join(file_name).is_file(), "{file_name}");
        }
    }

    #[rstest]
    fn test_run_beyond_rate_table(rate_table: RateTable) {
        let dir = tempdir().unwrap();
        let model = Model {
            model_path: dir.path().to_path_buf(),
            parameters: ModelParameters {
                start_year: 2017,
                vintage_end_years: vec![2018, 2022],
                ..ModelParameters::default()
            },
            rates: Rc::new(rate_table),
        };

        assert!(run(&model, dir.path(), false).is_err());
    }
}
