//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::eui::{DEFAULT_EFFICIENT_EUI, HistoricalReference};
use crate::input::{input_err_msg, is_sorted_and_unique, read_toml};
use crate::units::{Area, EnergyPerArea};
use anyhow::{Context, Result, ensure};
use log::warn;
use serde::Deserialize;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

macro_rules! define_unit_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            <$type>::new($value)
        }
    };
}

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_param_default!(default_start_year, u32, 2016);
define_unit_param_default!(default_starting_stock, Area, 295.745);
define_unit_param_default!(default_remaining_stock, Area, 281.0);
define_param_default!(default_population, f64, 4_859_250.0);
define_param_default!(default_reference_floor_space_per_capita, f64, 10.85);
define_unit_param_default!(default_efficient_eui, EnergyPerArea, DEFAULT_EFFICIENT_EUI);

/// Represents the contents of the entire model file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelParameters {
    /// The first simulated year
    #[serde(default = "default_start_year")]
    pub start_year: u32,
    /// The final year of each vintage, in order.
    ///
    /// The first vintage runs from `start_year` and each later vintage starts the year after the
    /// previous one ends.
    pub vintage_end_years: Vec<u32>,
    /// Total floor space at the start of `start_year`
    #[serde(default = "default_starting_stock")]
    pub starting_stock: Area,
    /// Floor space eligible for retrofit at the start of `start_year`
    #[serde(default = "default_remaining_stock")]
    pub remaining_stock: Area,
    /// Population at the start of `start_year`
    #[serde(default = "default_population")]
    pub population: f64,
    /// Floor space per capita of the reference (1946-1960) building stock
    #[serde(default = "default_reference_floor_space_per_capita")]
    pub reference_floor_space_per_capita: f64,
    /// The EUI of newly built and retrofitted floor space, used for the blended EUI
    #[serde(default = "default_efficient_eui")]
    pub efficient_eui: EnergyPerArea,
    /// Historical floor space and EUI series, used for the blended EUI
    #[serde(default)]
    pub historical: HistoricalReference,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            start_year: default_start_year(),
            vintage_end_years: vec![2020],
            starting_stock: default_starting_stock(),
            remaining_stock: default_remaining_stock(),
            population: default_population(),
            reference_floor_space_per_capita: default_reference_floor_space_per_capita(),
            efficient_eui: default_efficient_eui(),
            historical: HistoricalReference::default(),
        }
    }
}

/// Check that the `vintage_end_years` parameter is valid
fn check_vintage_end_years(start_year: u32, years: &[u32]) -> Result<()> {
    ensure!(!years.is_empty(), "`vintage_end_years` is empty");

    ensure!(
        is_sorted_and_unique(years),
        "`vintage_end_years` must be composed of unique values in order"
    );

    ensure!(
        years[0] >= start_year,
        "The first vintage cannot end before `start_year` ({start_year})"
    );

    Ok(())
}

/// Check that a floor space parameter is valid
fn check_floor_space(name: &str, value: Area) -> Result<()> {
    ensure!(
        value.is_finite() && value >= Area(0.0),
        "{name} must be a finite number greater than or equal to zero"
    );

    Ok(())
}

/// Check that the `population` parameter is valid
fn check_population(value: f64) -> Result<()> {
    ensure!(
        value.is_finite() && value > 0.0,
        "population must be a finite number greater than zero"
    );

    Ok(())
}

/// Check that the historical reference series are usable
fn check_historical_reference(reference: &HistoricalReference) -> Result<()> {
    ensure!(
        reference.aligned_len() > 0,
        "historical EUI and floor space series cannot be empty"
    );
    ensure!(
        reference.eui.iter().all(|eui| eui.is_finite())
            && reference.area.iter().all(|area| area.is_finite()),
        "historical EUI and floor space series must contain finite values"
    );

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// The start and end year of each vintage, in order
    pub fn vintage_spans(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let starts = std::iter::once(self.start_year)
            .chain(self.vintage_end_years.iter().map(|&year| year + 1));
        starts.zip(self.vintage_end_years.iter().copied())
    }

    /// The last simulated year
    pub fn end_year(&self) -> u32 {
        self.vintage_end_years
            .last()
            .copied()
            .unwrap_or(self.start_year)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        check_vintage_end_years(self.start_year, &self.vintage_end_years)?;
        check_floor_space("starting_stock", self.starting_stock)?;
        check_floor_space("remaining_stock", self.remaining_stock)?;
        check_population(self.population)?;
        ensure!(
            self.reference_floor_space_per_capita.is_finite()
                && self.reference_floor_space_per_capita >= 0.0,
            "reference_floor_space_per_capita must be a finite number greater than or equal to zero"
        );
        ensure!(
            self.efficient_eui.is_finite(),
            "efficient_eui must be a finite number"
        );
        check_historical_reference(&self.historical)?;

        if self.remaining_stock > self.starting_stock {
            warn!(
                "The retrofit-eligible floor space ({}) is larger than the starting stock ({})",
                self.remaining_stock, self.starting_stock
            );
        }

        Ok(())
    }
}
