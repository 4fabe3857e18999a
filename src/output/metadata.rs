//! The `metadata.toml` file, recording what was run, with which build and where.
use crate::model::Model;
use anyhow::Result;
use chrono::Local;
use platform_info::{PlatformInfo, PlatformInfoAPI, UNameAPI};
use serde::Serialize;
use std::fs;
use std::path::Path;

const METADATA_FILE_NAME: &str = "metadata.toml";

/// Build information generated by `build.rs`
#[allow(clippy::doc_markdown)]
mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[derive(Serialize)]
struct Metadata<'a> {
    model: ModelMetadata<'a>,
    build: BuildMetadata,
    platform: Option<PlatformMetadata>,
}

/// The model that was run and when
#[derive(Serialize)]
struct ModelMetadata<'a> {
    path: &'a Path,
    run_started: String,
    start_year: u32,
    vintage_end_years: &'a [u32],
    rate_table_years: String,
}

impl<'a> ModelMetadata<'a> {
    fn new(model: &'a Model) -> Self {
        let rates = &model.rates;
        let last_year = rates.last_year().unwrap_or(rates.first_year());
        Self {
            path: &model.model_path,
            run_started: Local::now().to_rfc3339(),
            start_year: model.parameters.start_year,
            vintage_end_years: &model.parameters.vintage_end_years,
            rate_table_years: format!("{}-{last_year}", rates.first_year()),
        }
    }
}

/// The bstock build which produced the results
#[derive(Serialize)]
struct BuildMetadata {
    version: &'static str,
    git_commit: String,
    target: &'static str,
    profile: &'static str,
    rustc: &'static str,
    built_at: &'static str,
}

impl BuildMetadata {
    fn new() -> Self {
        let git_commit = match (built_info::GIT_COMMIT_HASH_SHORT, built_info::GIT_DIRTY) {
            (Some(hash), Some(true)) => format!("{hash}-dirty"),
            (Some(hash), _) => hash.to_string(),
            (None, _) => "unknown".to_string(),
        };

        Self {
            version: built_info::PKG_VERSION,
            git_commit,
            target: built_info::TARGET,
            profile: built_info::PROFILE,
            rustc: built_info::RUSTC_VERSION,
            built_at: built_info::BUILT_TIME_UTC,
        }
    }
}

/// The machine the run took place on. Omitted if the platform can't be queried.
#[derive(Serialize)]
struct PlatformMetadata {
    os: String,
    release: String,
    machine: String,
}

impl PlatformMetadata {
    fn query() -> Option<Self> {
        let info = PlatformInfo::new().ok()?;
        Some(Self {
            os: info.osname().to_string_lossy().into_owned(),
            release: info.release().to_string_lossy().into_owned(),
            machine: info.machine().to_string_lossy().into_owned(),
        })
    }
}

/// Write `metadata.toml` for a run of `model` to `output_path`
pub fn write_metadata(output_path: &Path, model: &Model) -> Result<()> {
    let metadata = Metadata {
        model: ModelMetadata::new(model),
        build: BuildMetadata::new(),
        platform: PlatformMetadata::query(),
    };
    fs::write(
        output_path.join(METADATA_FILE_NAME),
        toml::to_string(&metadata)?,
    )?;

    Ok(())
}
