//! Fixtures for tests

use crate::model::{Model, ModelParameters};
use crate::rate_table::{RateTable, YearRates};
use crate::units::Area;
use crate::vintage::Vintage;
use float_cmp::approx_eq;
use rstest::fixture;
use std::rc::Rc;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Assert that two series of floor space are equal, to within floating-point error
pub fn assert_area_eq(actual: &[Area], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "Different number of values");
    for (i, (actual, &expected)) in actual.iter().zip(expected).enumerate() {
        assert!(
            approx_eq!(f64, actual.value(), expected, epsilon = 1e-9),
            "Value {i}: {actual} != {expected}"
        );
    }
}

/// Rates for 2017 to 2020
#[fixture]
pub fn rate_table() -> RateTable {
    let rows = [
        (0.6, 1.63, 1.2, 0.52, 1.012),
        (-0.55, 1.72, 1.3, 0.47, 1.015),
        (0.5, 1.8, 1.4, 0.39, 1.018),
        (0.45, 1.85, 1.5, 0.32, 1.02),
    ];

    RateTable::new(
        2017,
        rows.into_iter().map(
            |(demolition, new_construction, retrofit, eui, population_growth)| YearRates {
                demolition,
                new_construction,
                retrofit,
                eui,
                population_growth,
            },
        ),
    )
}

/// A vintage from 2017 to 2020 with default starting conditions, which has been run
#[fixture]
pub fn vintage(rate_table: RateTable) -> Vintage {
    let params = ModelParameters::default();
    let mut vintage = Vintage::new(
        Rc::new(rate_table),
        2017,
        params.starting_stock,
        params.remaining_stock,
        params.population,
    );
    vintage.extend_to(2020).unwrap();
    vintage.run().unwrap();

    vintage
}

/// Model parameters for a run from 2017 with two vintages
#[fixture]
pub fn model_parameters() -> ModelParameters {
    ModelParameters {
        start_year: 2017,
        vintage_end_years: vec![2018, 2020],
        ..ModelParameters::default()
    }
}

/// A two-vintage model on the 2017-2020 rates, as if read from `demos/simple`
#[fixture]
pub fn model(model_parameters: ModelParameters, rate_table: RateTable) -> Model {
    Model {
        model_path: "demos/simple".into(),
        parameters: model_parameters,
        rates: Rc::new(rate_table),
    }
}
