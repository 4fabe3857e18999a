//! Aggregation of energy use intensity (EUI) over the floor space of a vintage.
//!
//! Two formulas are provided:
//!
//! * [`weighted_by_total`] averages the EUI table weighted by the total floor space in each year.
//!   This is the figure archived when a vintage is closed.
//! * [`blended_historical`] produces one EUI per year, blending the efficient EUI of all new and
//!   retrofitted floor space in the vintage with a fixed historical reference stock.
//!
//! These do not agree with one another and it is an open modelling question which (if either)
//! should be canonical.
use crate::error::StockError;
use crate::units::{Area, Energy, EnergyPerArea};
use serde::Deserialize;

/// EUI of the historical building stock, from the oldest reference period onwards
const DEFAULT_HISTORICAL_EUI: [f64; 13] = [
    0.524_998_74,
    0.465_893_215,
    0.391_118_354,
    0.318_520_436,
    0.258_358_114,
    0.208_521_154,
    0.206_230_547,
    0.176_287_146,
    0.164_598_772,
    0.150_696_297,
    0.067,
    0.054,
    0.054,
];

/// Floor space of the historical building stock for each reference period
const DEFAULT_HISTORICAL_AREA: [f64; 10] = [
    8.369_309_574,
    10.539_015_98,
    37.996_487_7,
    35.238_958_26,
    59.096_168_5,
    23.707_765_22,
    24.334_617_67,
    30.609_919_33,
    25.992_95,
    16.907_15,
];

/// The EUI applied to newly built and retrofitted floor space by default
pub const DEFAULT_EFFICIENT_EUI: f64 = 0.171;

fn default_historical_eui() -> Vec<EnergyPerArea> {
    DEFAULT_HISTORICAL_EUI
        .iter()
        .copied()
        .map(EnergyPerArea)
        .collect()
}

fn default_historical_area() -> Vec<Area> {
    DEFAULT_HISTORICAL_AREA.iter().copied().map(Area).collect()
}

/// Fixed historical floor space and EUI series used by [`blended_historical`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoricalReference {
    /// Historical EUI series
    #[serde(default = "default_historical_eui")]
    pub eui: Vec<EnergyPerArea>,
    /// Historical floor space series
    #[serde(default = "default_historical_area")]
    pub area: Vec<Area>,
}

impl Default for HistoricalReference {
    fn default() -> Self {
        Self {
            eui: default_historical_eui(),
            area: default_historical_area(),
        }
    }
}

impl HistoricalReference {
    /// The number of years for which both series have a value
    pub fn aligned_len(&self) -> usize {
        self.eui.len().min(self.area.len())
    }
}

/// Average EUI over a vintage, weighted by the total floor space in each year.
///
/// `eui_table[i]` is paired with `total_area[i]`, i.e. the EUI table is indexed from the start
/// of the vintage.
pub fn weighted_by_total(
    total_area: &[Area],
    eui_table: &[f64],
) -> Result<EnergyPerArea, StockError> {
    if total_area.len() > eui_table.len() {
        return Err(StockError::LengthMismatch {
            span: total_area.len(),
            available: eui_table.len(),
        });
    }

    let weighted: Energy = total_area
        .iter()
        .zip(eui_table)
        .map(|(&area, &eui)| area * EnergyPerArea(eui))
        .sum();
    let total: Area = total_area.iter().sum();
    if total == Area(0.0) {
        return Err(StockError::ZeroFloorSpace("the whole vintage".into()));
    }

    Ok(weighted / total)
}

/// A per-year EUI blending new and retrofitted floor space with the historical stock.
///
/// For each year `i`:
///
/// ```text
/// eui[i] = (c * Σ new_area + c * Σ retrofitted_area + historical_area[i] * historical_eui[i])
///          / total_area[i]
/// ```
///
/// where `c` is `efficient_eui`. The sums are taken over the whole vintage, so the contribution
/// of new and retrofitted floor space is the same in every year.
pub fn blended_historical(
    new_area: &[Area],
    retrofitted_area: &[Area],
    total_area: &[Area],
    reference: &HistoricalReference,
    efficient_eui: EnergyPerArea,
) -> Result<Vec<EnergyPerArea>, StockError> {
    let available = reference.aligned_len();
    if total_area.len() > available {
        return Err(StockError::LengthMismatch {
            span: total_area.len(),
            available,
        });
    }

    let new_total: Area = new_area.iter().sum();
    let retrofit_total: Area = retrofitted_area.iter().sum();
    let efficient_energy = new_total * efficient_eui + retrofit_total * efficient_eui;

    total_area
        .iter()
        .enumerate()
        .map(|(i, &total)| {
            if total == Area(0.0) {
                return Err(StockError::ZeroFloorSpace(format!("year index {i}")));
            }
            let historical_energy = reference.area[i] * reference.eui[i];
            Ok((efficient_energy + historical_energy) / total)
        })
        .collect()
}
