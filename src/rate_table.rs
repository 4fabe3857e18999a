//! The rate table holds the year-indexed rates which drive building stock turnover.
//!
//! A table is built once from input data and is immutable afterwards. Vintages share it through
//! an [`Rc`](std::rc::Rc) and look rates up by year offset.
use crate::error::StockError;
use serde::Deserialize;
use strum::{Display, EnumIter};

/// The kinds of value held for each year in a [`RateTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum RateKind {
    /// Percentage of floor space demolished in a year
    #[strum(to_string = "demolition rate")]
    Demolition,
    /// Percentage of floor space newly constructed in a year
    #[strum(to_string = "new construction rate")]
    NewConstruction,
    /// Percentage of the retrofit-eligible floor space retrofitted in a year
    #[strum(to_string = "retrofit rate")]
    Retrofit,
    /// Energy use intensity for the year
    #[strum(to_string = "EUI")]
    Eui,
    /// Multiplicative year-over-year population factor
    #[strum(to_string = "population growth")]
    PopulationGrowth,
}

/// The rates for a single year of the table
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct YearRates {
    /// Demolition rate (%)
    pub demolition: f64,
    /// New construction rate (%)
    pub new_construction: f64,
    /// Retrofit rate (%)
    pub retrofit: f64,
    /// Energy use intensity
    pub eui: f64,
    /// Population growth factor
    pub population_growth: f64,
}

/// Five aligned sequences of rates, indexed by offset from the table's first year
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    first_year: u32,
    demolition: Vec<f64>,
    new_construction: Vec<f64>,
    retrofit: Vec<f64>,
    eui: Vec<f64>,
    population_growth: Vec<f64>,
}

impl RateTable {
    /// Create a new [`RateTable`] from consecutive years of rates, starting at `first_year`
    pub fn new<I>(first_year: u32, rows: I) -> Self
    where
        I: IntoIterator<Item = YearRates>,
    {
        let mut table = Self {
            first_year,
            demolition: Vec::new(),
            new_construction: Vec::new(),
            retrofit: Vec::new(),
            eui: Vec::new(),
            population_growth: Vec::new(),
        };

        for row in rows {
            table.demolition.push(row.demolition);
            table.new_construction.push(row.new_construction);
            table.retrofit.push(row.retrofit);
            table.eui.push(row.eui);
            table.population_growth.push(row.population_growth);
        }

        table
    }

    /// The calendar year corresponding to offset zero
    pub fn first_year(&self) -> u32 {
        self.first_year
    }

    /// The last calendar year covered by the table, if it has any rows
    pub fn last_year(&self) -> Option<u32> {
        let len = u32::try_from(self.len()).ok()?;
        len.checked_sub(1).map(|last| self.first_year + last)
    }

    /// The number of years in the table
    pub fn len(&self) -> usize {
        self.demolition.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.demolition.is_empty()
    }

    /// The full sequence for the given kind of rate
    pub fn column(&self, kind: RateKind) -> &[f64] {
        match kind {
            RateKind::Demolition => &self.demolition,
            RateKind::NewConstruction => &self.new_construction,
            RateKind::Retrofit => &self.retrofit,
            RateKind::Eui => &self.eui,
            RateKind::PopulationGrowth => &self.population_growth,
        }
    }

    /// The offset of `year` from the table's first year (negative for earlier years)
    pub fn offset_of(&self, year: u32) -> i64 {
        i64::from(year) - i64::from(self.first_year)
    }

    /// Look up a value by offset.
    ///
    /// # Arguments
    ///
    /// * `kind` - Which sequence to read from
    /// * `t` - Zero-based offset from the table's first year
    ///
    /// # Returns
    ///
    /// The value or [`StockError::IndexOutOfRange`] if `t` lies outside the table. Lookups never
    /// wrap or extrapolate.
    pub fn rate_at(&self, kind: RateKind, t: i64) -> Result<f64, StockError> {
        let column = self.column(kind);
        usize::try_from(t)
            .ok()
            .and_then(|idx| column.get(idx).copied())
            .ok_or(StockError::IndexOutOfRange {
                kind,
                index: t,
                len: column.len(),
            })
    }
}
