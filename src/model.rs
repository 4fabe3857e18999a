//! The model represents the rates and starting conditions for a building stock simulation.
use crate::input::load_model;
use crate::rate_table::RateTable;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub mod parameters;
pub use parameters::ModelParameters;

/// Model definition
#[derive(Debug)]
pub struct Model {
    /// Path to model folder
    pub model_path: PathBuf,
    /// Parameters from the model TOML file
    pub parameters: ModelParameters,
    /// Year-indexed turnover rates, shared by every vintage
    pub rates: Rc<RateTable>,
}

impl Model {
    /// Read a model from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model or an error if any of the input files are invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
        load_model(model_dir)
    }

    /// Floor space implied by the reference per-capita floor space and the starting population
    pub fn reference_floor_space(&self) -> f64 {
        self.parameters.reference_floor_space_per_capita * self.parameters.population
    }
}
