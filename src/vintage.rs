//! The vintage simulator: year-by-year turnover of floor space for one vintage period.
//!
//! A [`Vintage`] is created with its starting stocks, extended year by year to its end year and
//! then run once. Each simulated year records the stock at the start of the year, then applies
//! new construction and demolition. Retrofits are recorded against the retrofit-eligible stock but
//! never change the total floor space.
//!
//! Closing a vintage produces an immutable [`VintageSnapshot`] for the
//! [`VintageLedger`](crate::ledger::VintageLedger).
use crate::eui::{HistoricalReference, blended_historical, weighted_by_total};
use crate::error::StockError;
use crate::rate_table::{RateKind, RateTable};
use crate::units::{Area, Dimensionless, EnergyPerArea};
use log::{debug, warn};
use std::rc::Rc;
use strum::{Display, EnumIter};

/// Number of decimal places the total floor space is rounded to after each year
const STOCK_DECIMAL_PLACES: i32 = 2;

/// The floor-space trajectories recorded for each year of a vintage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum TrajectoryKind {
    /// Newly constructed floor space
    #[strum(to_string = "new")]
    New,
    /// Demolished floor space
    #[strum(to_string = "demolished")]
    Demolished,
    /// Retrofitted floor space
    #[strum(to_string = "retrofitted")]
    Retrofitted,
    /// Total floor space at the start of the year
    #[strum(to_string = "total")]
    Total,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VintageState {
    /// Years may still be added
    Accumulating,
    /// Trajectories have been computed
    Simulated,
    /// Archived; no further changes
    Closed,
    /// A run failed part way through
    Invalid,
}

/// One contiguous run of simulated years
#[derive(Debug, Clone)]
pub struct Vintage {
    rates: Rc<RateTable>,
    start_year: u32,
    years: Vec<u32>,
    starting_stock: Area,
    current_stock: Area,
    remaining_stock: Area,
    population: f64,
    new_area: Vec<Area>,
    demolished_area: Vec<Area>,
    retrofitted_area: Vec<Area>,
    total_area: Vec<Area>,
    remaining_stock_trajectory: Vec<Area>,
    population_trajectory: Vec<f64>,
    state: VintageState,
}

impl Vintage {
    /// Create a new, empty vintage.
    ///
    /// # Arguments
    ///
    /// * `rates` - Rates used to simulate each year
    /// * `start_year` - First year of the vintage
    /// * `starting_stock` - Total floor space at the start of `start_year`
    /// * `remaining_stock` - Floor space eligible for retrofit at the start of `start_year`
    /// * `population` - Population at the start of `start_year`
    pub fn new(
        rates: Rc<RateTable>,
        start_year: u32,
        starting_stock: Area,
        remaining_stock: Area,
        population: f64,
    ) -> Self {
        Self {
            rates,
            start_year,
            years: Vec::new(),
            starting_stock,
            current_stock: starting_stock,
            remaining_stock,
            population,
            new_area: Vec::new(),
            demolished_area: Vec::new(),
            retrofitted_area: Vec::new(),
            total_area: Vec::new(),
            remaining_stock_trajectory: Vec::new(),
            population_trajectory: Vec::new(),
            state: VintageState::Accumulating,
        }
    }

    /// The rate table this vintage draws on
    pub fn rates(&self) -> &Rc<RateTable> {
        &self.rates
    }

    /// First year of the vintage
    pub fn start_year(&self) -> u32 {
        self.start_year
    }

    /// Last year added to the vintage, if any
    pub fn end_year(&self) -> Option<u32> {
        self.years.last().copied()
    }

    /// The years of the vintage, in order
    pub fn years(&self) -> &[u32] {
        &self.years
    }

    /// A label of the form `"start-end"`
    pub fn label(&self) -> String {
        vintage_label(self.start_year, self.end_year().unwrap_or(self.start_year))
    }

    /// Total floor space at the start of the vintage
    pub fn starting_stock(&self) -> Area {
        self.starting_stock
    }

    /// Total floor space after the years simulated so far
    pub fn current_stock(&self) -> Area {
        self.current_stock
    }

    /// Floor space eligible for retrofit after the years simulated so far.
    ///
    /// This is not clamped and may be negative if demolition exceeds it.
    pub fn remaining_stock(&self) -> Area {
        self.remaining_stock
    }

    /// Population after the years simulated so far
    pub fn population(&self) -> f64 {
        self.population
    }

    /// The recorded values for the given trajectory, one per simulated year
    pub fn trajectory(&self, kind: TrajectoryKind) -> &[Area] {
        match kind {
            TrajectoryKind::New => &self.new_area,
            TrajectoryKind::Demolished => &self.demolished_area,
            TrajectoryKind::Retrofitted => &self.retrofitted_area,
            TrajectoryKind::Total => &self.total_area,
        }
    }

    /// Retrofit-eligible floor space after each year's demolition
    pub fn remaining_stock_trajectory(&self) -> &[Area] {
        &self.remaining_stock_trajectory
    }

    /// Population at the start of each simulated year
    pub fn population_trajectory(&self) -> &[f64] {
        &self.population_trajectory
    }

    /// Whether the retrofit-eligible stock went negative in any simulated year
    pub fn has_negative_remaining_stock(&self) -> bool {
        self.remaining_stock_trajectory
            .iter()
            .any(|&stock| stock < Area(0.0))
    }

    /// Whether the vintage has been closed
    pub fn is_closed(&self) -> bool {
        self.state == VintageState::Closed
    }

    /// Check that the vintage can still be changed
    fn ensure_accumulating(&self, operation: &str) -> Result<(), StockError> {
        match self.state {
            VintageState::Accumulating => Ok(()),
            VintageState::Simulated => Err(StockError::InvalidState(format!(
                "cannot {operation} vintage {} after it has been run",
                self.label()
            ))),
            VintageState::Closed => Err(StockError::InvalidState(format!(
                "cannot {operation} closed vintage {}",
                self.label()
            ))),
            VintageState::Invalid => Err(StockError::InvalidState(format!(
                "cannot {operation} invalid vintage {}",
                self.label()
            ))),
        }
    }

    /// Add years to the vintage up to and including `end_year`.
    ///
    /// Years already in the vintage are not added again. An end year before the start year leaves
    /// the vintage invalid.
    pub fn extend_to(&mut self, end_year: u32) -> Result<(), StockError> {
        self.ensure_accumulating("extend")?;
        if end_year < self.start_year {
            self.state = VintageState::Invalid;
            return Err(StockError::InvalidRange {
                start: self.start_year,
                end: end_year,
            });
        }

        let next_year = self.end_year().map_or(self.start_year, |year| year + 1);
        self.years.extend(next_year..=end_year);

        Ok(())
    }

    /// Simulate every year of the vintage.
    ///
    /// This may only be called once. If a year fails (e.g. because it is not covered by the rate
    /// table) the vintage is left invalid and every later operation on it fails.
    pub fn run(&mut self) -> Result<(), StockError> {
        if self.state == VintageState::Simulated {
            return Err(StockError::AlreadyRun(self.label()));
        }
        self.ensure_accumulating("run")?;
        if self.years.is_empty() {
            return Err(StockError::EmptyVintage(self.start_year));
        }

        debug!("Running vintage {}", self.label());
        let years = self.years.clone();
        for year in years {
            if let Err(err) = self.simulate_year(year) {
                self.state = VintageState::Invalid;
                return Err(err);
            }
        }
        self.state = VintageState::Simulated;

        Ok(())
    }

    /// Apply one year of construction, demolition and retrofit
    fn simulate_year(&mut self, year: u32) -> Result<(), StockError> {
        let t = self.rates.offset_of(year);
        let nc_rate = Dimensionless(self.rates.rate_at(RateKind::NewConstruction, t)?);
        let retro_rate = Dimensionless(self.rates.rate_at(RateKind::Retrofit, t)?);
        let demo_rate = Dimensionless(self.rates.rate_at(RateKind::Demolition, t)?);
        let growth = self.rates.rate_at(RateKind::PopulationGrowth, t)?;
        let hundred = Dimensionless(100.0);

        let stock = self.current_stock;
        self.total_area.push(stock);
        self.population_trajectory.push(self.population);

        let new_area = (stock / hundred * nc_rate).abs();
        let demolished_area = (stock / hundred * demo_rate).abs();

        let was_negative = self.remaining_stock < Area(0.0);
        self.remaining_stock = self.remaining_stock - demolished_area;
        if !was_negative && self.remaining_stock < Area(0.0) {
            warn!(
                "Retrofit-eligible floor space is negative ({}) in {year}: demolition has \
                exceeded the remaining stock",
                self.remaining_stock
            );
        }
        let retrofitted_area = (self.remaining_stock / hundred * retro_rate).abs();

        self.new_area.push(new_area);
        self.demolished_area.push(demolished_area);
        self.retrofitted_area.push(retrofitted_area);
        self.remaining_stock_trajectory.push(self.remaining_stock);

        // Retrofit changes energy performance only, not floor space
        self.current_stock = (stock + new_area - demolished_area).round_to(STOCK_DECIMAL_PLACES);
        self.population *= growth;

        debug!(
            "{year}: total {stock}, new {new_area}, demolished {demolished_area}, \
            retrofitted {retrofitted_area}, population {}",
            self.population
        );

        Ok(())
    }

    /// Average EUI of the vintage weighted by total floor space.
    ///
    /// The EUI table is indexed from the start of the vintage.
    pub fn weighted_eui(&self) -> Result<EnergyPerArea, StockError> {
        weighted_by_total(&self.total_area, self.rates.column(RateKind::Eui))
    }

    /// Close the vintage, returning a snapshot of its trajectories and weighted EUI.
    ///
    /// A closed vintage cannot be extended, run or closed again.
    pub fn close(&mut self) -> Result<VintageSnapshot, StockError> {
        match self.state {
            VintageState::Closed => {
                return Err(StockError::InvalidState(format!(
                    "vintage {} is already closed",
                    self.label()
                )));
            }
            VintageState::Invalid => {
                return Err(StockError::InvalidState(format!(
                    "cannot close invalid vintage {}",
                    self.label()
                )));
            }
            VintageState::Accumulating | VintageState::Simulated => {}
        }
        if self.total_area.is_empty() {
            return Err(StockError::EmptyVintage(self.start_year));
        }

        let average_eui = self.weighted_eui()?;
        let end_year = self.end_year().unwrap_or(self.start_year);
        self.state = VintageState::Closed;

        Ok(VintageSnapshot {
            start_year: self.start_year,
            end_year,
            years: self.years.clone(),
            new_area: self.new_area.clone(),
            demolished_area: self.demolished_area.clone(),
            retrofitted_area: self.retrofitted_area.clone(),
            total_area: self.total_area.clone(),
            remaining_stock: self.remaining_stock_trajectory.clone(),
            population: self.population_trajectory.clone(),
            average_eui,
            closing_stock: self.current_stock,
            closing_remaining_stock: self.remaining_stock,
            closing_population: self.population,
        })
    }
}

/// The ledger label for a vintage spanning `start_year` to `end_year`
pub fn vintage_label(start_year: u32, end_year: u32) -> String {
    format!("{start_year}-{end_year}")
}

/// An immutable record of a closed vintage
#[derive(Debug, Clone, PartialEq)]
pub struct VintageSnapshot {
    /// First year of the vintage
    pub start_year: u32,
    /// Last year of the vintage
    pub end_year: u32,
    /// Every year of the vintage
    pub years: Vec<u32>,
    /// Newly constructed floor space per year
    pub new_area: Vec<Area>,
    /// Demolished floor space per year
    pub demolished_area: Vec<Area>,
    /// Retrofitted floor space per year
    pub retrofitted_area: Vec<Area>,
    /// Total floor space at the start of each year
    pub total_area: Vec<Area>,
    /// Retrofit-eligible floor space after each year's demolition
    pub remaining_stock: Vec<Area>,
    /// Population at the start of each year
    pub population: Vec<f64>,
    /// EUI weighted by total floor space
    pub average_eui: EnergyPerArea,
    /// Total floor space after the final year's update
    pub closing_stock: Area,
    /// Retrofit-eligible floor space after the final year
    pub closing_remaining_stock: Area,
    /// Population after the final year
    pub closing_population: f64,
}

impl VintageSnapshot {
    /// A label of the form `"start-end"`
    pub fn label(&self) -> String {
        vintage_label(self.start_year, self.end_year)
    }

    /// The recorded values for the given trajectory
    pub fn trajectory(&self, kind: TrajectoryKind) -> &[Area] {
        match kind {
            TrajectoryKind::New => &self.new_area,
            TrajectoryKind::Demolished => &self.demolished_area,
            TrajectoryKind::Retrofitted => &self.retrofitted_area,
            TrajectoryKind::Total => &self.total_area,
        }
    }

    /// Total floor space at the start of the final year
    pub fn last_total_area(&self) -> Area {
        self.total_area.last().copied().unwrap_or(self.closing_stock)
    }

    /// Per-year EUI blended with a historical reference stock
    pub fn blended_eui(
        &self,
        reference: &HistoricalReference,
        efficient_eui: EnergyPerArea,
    ) -> Result<Vec<EnergyPerArea>, StockError> {
        blended_historical(
            &self.new_area,
            &self.retrofitted_area,
            &self.total_area,
            reference,
            efficient_eui,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_area_eq, rate_table, vintage};
    use float_cmp::approx_eq;
    use rstest::rstest;
    use strum::IntoEnumIterator;

    #[rstest]
    fn test_extend_to(rate_table: RateTable) {
        let mut vintage = Vintage::new(rate_table.into(), 2017, Area(100.0), Area(90.0), 10.0);
        vintage.extend_to(2018).unwrap();
        assert_eq!(vintage.years(), [2017, 2018]);
        vintage.extend_to(2020).unwrap();
        assert_eq!(vintage.years(), [2017, 2018, 2019, 2020]);

        // Already covered
        vintage.extend_to(2019).unwrap();
        assert_eq!(vintage.years(), [2017, 2018, 2019, 2020]);
        assert_eq!(vintage.label(), "2017-2020");
    }

    #[rstest]
    fn test_extend_to_invalid_range(rate_table: RateTable) {
        let mut vintage = Vintage::new(rate_table.into(), 2017, Area(100.0), Area(90.0), 10.0);
        assert_eq!(
            vintage.extend_to(2016),
            Err(StockError::InvalidRange {
                start: 2017,
                end: 2016
            })
        );

        // The vintage can't be used afterwards
        assert!(matches!(
            vintage.extend_to(2018),
            Err(StockError::InvalidState(_))
        ));
        assert!(matches!(vintage.run(), Err(StockError::InvalidState(_))));
        assert!(matches!(vintage.close(), Err(StockError::InvalidState(_))));
    }

    #[rstest]
    fn test_trajectory_lengths(vintage: Vintage) {
        for kind in TrajectoryKind::iter() {
            assert_eq!(vintage.trajectory(kind).len(), 4, "{kind}");
        }
        assert_eq!(vintage.population_trajectory().len(), 4);
        assert_eq!(vintage.remaining_stock_trajectory().len(), 4);
        assert_eq!(
            vintage.trajectory(TrajectoryKind::Total)[0],
            vintage.starting_stock()
        );
    }

    #[rstest]
    fn test_stock_update(vintage: Vintage) {
        let total = vintage.trajectory(TrajectoryKind::Total);
        let new = vintage.trajectory(TrajectoryKind::New);
        let demolished = vintage.trajectory(TrajectoryKind::Demolished);
        for i in 0..total.len() {
            let next = (total[i] + new[i] - demolished[i]).round_to(2);
            if i + 1 < total.len() {
                assert_eq!(next, total[i + 1]);
            } else {
                assert_eq!(next, vintage.current_stock());
            }
        }
    }

    #[rstest]
    fn test_remaining_stock_non_increasing(vintage: Vintage) {
        let remaining = vintage.remaining_stock_trajectory();
        assert!(remaining[0] <= Area(281.0));
        assert!(remaining.windows(2).all(|w| w[1] <= w[0]));
        assert!(!vintage.has_negative_remaining_stock());
    }

    #[rstest]
    fn test_scenario_2017_2020(vintage: Vintage) {
        assert_eq!(vintage.years(), [2017, 2018, 2019, 2020]);
        assert_area_eq(
            vintage.trajectory(TrajectoryKind::Total),
            &[295.745, 298.79, 302.29, 306.22],
        );
        assert_area_eq(
            vintage.trajectory(TrajectoryKind::New),
            &[4.820_643_5, 5.139_188, 5.441_22, 5.665_07],
        );
        assert_area_eq(
            vintage.trajectory(TrajectoryKind::Demolished),
            &[1.774_47, 1.643_345, 1.511_45, 1.377_99],
        );
        assert_area_eq(
            vintage.trajectory(TrajectoryKind::Retrofitted),
            &[3.350_706_36, 3.608_568_405, 3.864_990_29, 4.120_391_175],
        );
        assert_area_eq(
            vintage.remaining_stock_trajectory(),
            &[279.225_53, 277.582_185, 276.070_735, 274.692_745],
        );
        assert_eq!(vintage.current_stock(), Area(310.51));

        let expected_population = [4_859_250.0, 4_917_561.0, 4_991_324.415, 5_081_168.254_47];
        for (&actual, expected) in vintage
            .population_trajectory()
            .iter()
            .zip(expected_population)
        {
            assert!(approx_eq!(f64, actual, expected, epsilon = 1e-6));
        }
        assert!(approx_eq!(
            f64,
            vintage.population(),
            5_182_791.619_559_4,
            epsilon = 1e-6
        ));
    }

    #[rstest]
    fn test_run_twice(mut vintage: Vintage) {
        assert_eq!(
            vintage.run(),
            Err(StockError::AlreadyRun("2017-2020".into()))
        );
        assert_eq!(vintage.trajectory(TrajectoryKind::Total).len(), 4);
    }

    #[rstest]
    fn test_extend_after_run(mut vintage: Vintage) {
        assert!(matches!(
            vintage.extend_to(2021),
            Err(StockError::InvalidState(_))
        ));
    }

    #[rstest]
    fn test_run_empty(rate_table: RateTable) {
        let mut vintage = Vintage::new(rate_table.into(), 2017, Area(100.0), Area(90.0), 10.0);
        assert_eq!(vintage.run(), Err(StockError::EmptyVintage(2017)));
    }

    #[rstest]
    fn test_run_beyond_rate_table(rate_table: RateTable) {
        let mut vintage = Vintage::new(rate_table.into(), 2019, Area(100.0), Area(90.0), 10.0);
        vintage.extend_to(2021).unwrap();
        assert_eq!(
            vintage.run(),
            Err(StockError::IndexOutOfRange {
                kind: RateKind::NewConstruction,
                index: 4,
                len: 4
            })
        );

        // The vintage can't be reused after a failed run
        assert!(matches!(vintage.run(), Err(StockError::InvalidState(_))));
        assert!(matches!(vintage.close(), Err(StockError::InvalidState(_))));
    }

    #[rstest]
    fn test_negative_remaining_stock_not_clamped(rate_table: RateTable) {
        let mut vintage = Vintage::new(rate_table.into(), 2017, Area(295.745), Area(2.0), 10.0);
        vintage.extend_to(2018).unwrap();
        vintage.run().unwrap();

        let remaining = vintage.remaining_stock_trajectory();
        let demolished = vintage.trajectory(TrajectoryKind::Demolished);
        assert_area_eq(
            remaining,
            &[
                2.0 - demolished[0].value(),
                2.0 - demolished[0].value() - demolished[1].value(),
            ],
        );
        assert!(remaining[1] < Area(0.0));
        assert!(vintage.has_negative_remaining_stock());
        assert_eq!(vintage.remaining_stock(), remaining[1]);

        // Retrofit is still the magnitude of the unclamped base
        assert_area_eq(
            &vintage.trajectory(TrajectoryKind::Retrofitted)[1..],
            &[(remaining[1].value() / 100.0 * 1.3).abs()],
        );
    }

    #[rstest]
    fn test_close(mut vintage: Vintage) {
        let snapshot = vintage.close().unwrap();
        assert!(vintage.is_closed());
        assert_eq!(snapshot.label(), "2017-2020");
        assert_eq!(snapshot.start_year, 2017);
        assert_eq!(snapshot.end_year, 2020);
        assert_eq!(snapshot.last_total_area(), Area(306.22));
        assert_eq!(snapshot.closing_stock, Area(310.51));
        assert!(approx_eq!(
            f64,
            snapshot.average_eui.value(),
            0.424_009_243_212_016_16,
            epsilon = 1e-12
        ));
        for kind in TrajectoryKind::iter() {
            assert_eq!(snapshot.trajectory(kind), vintage.trajectory(kind));
        }

        // Closed vintages can't be changed
        assert!(matches!(
            vintage.extend_to(2021),
            Err(StockError::InvalidState(_))
        ));
        assert!(matches!(vintage.run(), Err(StockError::InvalidState(_))));
        assert!(matches!(vintage.close(), Err(StockError::InvalidState(_))));
    }

    #[rstest]
    fn test_close_empty(rate_table: RateTable) {
        let mut vintage = Vintage::new(rate_table.into(), 2017, Area(100.0), Area(90.0), 10.0);
        vintage.extend_to(2018).unwrap();
        assert_eq!(vintage.close(), Err(StockError::EmptyVintage(2017)));
    }

    #[rstest]
    fn test_blended_eui(mut vintage: Vintage) {
        let eui = vintage
            .close()
            .unwrap()
            .blended_eui(
                &HistoricalReference::default(),
                EnergyPerArea(crate::eui::DEFAULT_EFFICIENT_EUI),
            )
            .unwrap();
        let expected = [
            0.035_678_439_104_126_66,
            0.037_042_401_116_799_68,
            0.069_532_457_966_969_61,
            0.056_763_671_024_070_93,
        ];
        assert_eq!(eui.len(), expected.len());
        for (actual, expected) in eui.into_iter().zip(expected) {
            assert!(approx_eq!(f64, actual.value(), expected, epsilon = 1e-12));
        }
    }
}
