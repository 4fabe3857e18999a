//! The module responsible for writing output data to disk.
use crate::model::Model;
use crate::units::{Area, EnergyPerArea};
use crate::vintage::VintageSnapshot;
use anyhow::{Context, Result, ensure};
use itertools::izip;
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;
use metadata::write_metadata;

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "bstock_results";

/// The output file name for per-year floor space trajectories
const TRAJECTORIES_FILE_NAME: &str = "trajectories.csv";

/// The output file name for per-vintage summaries
const VINTAGES_FILE_NAME: &str = "vintages.csv";

/// The output file name for the blended EUI series
const BLENDED_EUI_FILE_NAME: &str = "blended_eui.csv";

/// The output file name for the retrofit-eligible floor space
const REMAINING_STOCK_FILE_NAME: &str = "debug_remaining_stock.csv";

/// Get the default output directory for the model specified at `model_dir`
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // The model name is the last component of the canonical path (so "." works too)
    let model_dir = model_dir
        .canonicalize()
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory, optionally replacing a non-empty existing one.
///
/// # Returns
///
/// Whether an existing, non-empty directory was overwritten.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    // If the folder already exists, then delete it
    let overwrite = if let Ok(mut it) = fs::read_dir(output_dir) {
        if it.next().is_none() {
            // Folder exists and is empty: nothing to do
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Please delete the folder or pass the \
            --overwrite command-line option."
        );

        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// A row of the trajectories CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct TrajectoryRow {
    vintage: String,
    year: u32,
    new_area: Area,
    demolished_area: Area,
    retrofitted_area: Area,
    total_area: Area,
    population: f64,
}

/// A row of the vintage summary CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct VintageRow {
    vintage: String,
    start_year: u32,
    end_year: u32,
    average_eui: EnergyPerArea,
    closing_stock: Area,
    remaining_stock: Area,
    population: f64,
}

/// A row of the blended EUI CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct BlendedEuiRow {
    vintage: String,
    year: u32,
    eui: EnergyPerArea,
}

/// A row of the retrofit-eligible floor space CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct RemainingStockRow {
    vintage: String,
    year: u32,
    remaining_stock: Area,
}

/// For writing extra debug information about the model
struct DebugDataWriter {
    remaining_stock_writer: csv::Writer<File>,
}

impl DebugDataWriter {
    /// Open CSV files to write debug info to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    fn create(output_path: &Path) -> Result<Self> {
        Ok(Self {
            remaining_stock_writer: csv::Writer::from_path(
                output_path.join(REMAINING_STOCK_FILE_NAME),
            )?,
        })
    }

    /// Write the retrofit-eligible floor space for each year of a vintage
    fn write_remaining_stock(&mut self, snapshot: &VintageSnapshot) -> Result<()> {
        let vintage = snapshot.label();
        for (&year, &remaining_stock) in snapshot.years.iter().zip(&snapshot.remaining_stock) {
            self.remaining_stock_writer.serialize(RemainingStockRow {
                vintage: vintage.clone(),
                year,
                remaining_stock,
            })?;
        }

        Ok(())
    }

    /// Flush the underlying streams
    fn flush(&mut self) -> Result<()> {
        self.remaining_stock_writer.flush()?;

        Ok(())
    }
}

/// An object for writing simulation results to file
pub struct DataWriter {
    trajectories_writer: csv::Writer<File>,
    vintages_writer: csv::Writer<File>,
    blended_eui_writer: csv::Writer<File>,
    debug_writer: Option<DebugDataWriter>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    /// * `model` - The model being run, recorded in `metadata.toml`
    /// * `save_debug_info` - Whether to include extra CSV files for debugging model
    pub fn create(output_path: &Path, model: &Model, save_debug_info: bool) -> Result<Self> {
        write_metadata(output_path, model).context("Failed to save metadata")?;

        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        let debug_writer = if save_debug_info {
            // Create debug CSV files
            Some(DebugDataWriter::create(output_path)?)
        } else {
            None
        };

        Ok(Self {
            trajectories_writer: new_writer(TRAJECTORIES_FILE_NAME)?,
            vintages_writer: new_writer(VINTAGES_FILE_NAME)?,
            blended_eui_writer: new_writer(BLENDED_EUI_FILE_NAME)?,
            debug_writer,
        })
    }

    /// Write the trajectories and summary of a closed vintage
    pub fn write_vintage(&mut self, snapshot: &VintageSnapshot) -> Result<()> {
        let vintage = snapshot.label();
        for (&year, &new_area, &demolished_area, &retrofitted_area, &total_area, &population) in izip!(
            &snapshot.years,
            &snapshot.new_area,
            &snapshot.demolished_area,
            &snapshot.retrofitted_area,
            &snapshot.total_area,
            &snapshot.population
        ) {
            self.trajectories_writer.serialize(TrajectoryRow {
                vintage: vintage.clone(),
                year,
                new_area,
                demolished_area,
                retrofitted_area,
                total_area,
                population,
            })?;
        }

        self.vintages_writer.serialize(VintageRow {
            vintage,
            start_year: snapshot.start_year,
            end_year: snapshot.end_year,
            average_eui: snapshot.average_eui,
            closing_stock: snapshot.closing_stock,
            remaining_stock: snapshot.closing_remaining_stock,
            population: snapshot.closing_population,
        })?;

        if let Some(wtr) = &mut self.debug_writer {
            wtr.write_remaining_stock(snapshot)?;
        }

        Ok(())
    }

    /// Write the blended EUI series for a vintage
    pub fn write_blended_eui(
        &mut self,
        snapshot: &VintageSnapshot,
        eui: &[EnergyPerArea],
    ) -> Result<()> {
        let vintage = snapshot.label();
        for (&year, &eui) in snapshot.years.iter().zip(eui) {
            self.blended_eui_writer.serialize(BlendedEuiRow {
                vintage: vintage.clone(),
                year,
                eui,
            })?;
        }

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.trajectories_writer.flush()?;
        self.vintages_writer.flush()?;
        self.blended_eui_writer.flush()?;
        if let Some(wtr) = &mut self.debug_writer {
            wtr.flush()?;
        }

        Ok(())
    }
}
