//! Common routines for handling input data.
use crate::model::{Model, ModelParameters};
use anyhow::{Context, Result, ensure};
use log::info;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use std::rc::Rc;

pub mod rates;
use rates::read_rate_table;

/// Read a series of type `T`s from a CSV file.
///
/// Leading and trailing whitespace is trimmed from every field.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let vec = read_csv_internal(file_path).with_context(|| input_err_msg(file_path))?;
    ensure!(!vec.is_empty(), "{}: CSV file cannot be empty", input_err_msg(file_path));

    Ok(vec)
}

fn read_csv_internal<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)?;

    let mut vec = Vec::new();
    for result in reader.deserialize() {
        vec.push(result?);
    }

    Ok(vec)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Check whether a slice is sorted in strictly ascending order (i.e. sorted with no duplicates)
pub fn is_sorted_and_unique<T: PartialOrd>(values: &[T]) -> bool {
    values.windows(2).all(|pair| pair[0] < pair[1])
}

/// Read a model from the specified directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The loaded model or an error.
pub fn load_model<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
    let model_dir = model_dir.as_ref();
    let parameters = ModelParameters::from_path(model_dir)?;
    let rates = read_rate_table(model_dir)?;

    // Every simulated year needs a row in the rate table
    let last_year = rates.last_year().unwrap_or(rates.first_year());
    ensure!(
        rates.first_year() <= parameters.start_year && parameters.end_year() <= last_year,
        "The rate table covers {}-{} but the model runs from {} to {}",
        rates.first_year(),
        last_year,
        parameters.start_year,
        parameters.end_year()
    );

    let model = Model {
        model_path: model_dir.to_path_buf(),
        parameters,
        rates: Rc::new(rates),
    };
    info!(
        "Reference floor space for starting population: {:.1}",
        model.reference_floor_space()
    );

    Ok(model)
}
