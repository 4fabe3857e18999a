//! The vintage ledger archives closed vintages and chains one vintage into the next.
use crate::error::StockError;
use crate::units::Area;
use crate::vintage::{TrajectoryKind, Vintage, VintageSnapshot};
use indexmap::IndexMap;
use indexmap::map::Entry;
use log::info;
use std::rc::Rc;

/// An append-only record of closed vintages, keyed by `"start-end"` label in insertion order
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VintageLedger(IndexMap<String, Rc<VintageSnapshot>>);

impl VintageLedger {
    /// Create a new, empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of archived vintages
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the ledger is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get a snapshot by label
    pub fn get(&self, label: &str) -> Option<&Rc<VintageSnapshot>> {
        self.0.get(label)
    }

    /// The most recently archived snapshot
    pub fn last(&self) -> Option<&Rc<VintageSnapshot>> {
        self.0.last().map(|(_, snapshot)| snapshot)
    }

    /// Iterate over labels and snapshots in the order they were archived
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rc<VintageSnapshot>)> {
        self.0.iter().map(|(label, snapshot)| (label.as_str(), snapshot))
    }

    /// Archive a snapshot. Existing entries are never replaced.
    pub fn insert(&mut self, snapshot: VintageSnapshot) -> Result<Rc<VintageSnapshot>, StockError> {
        match self.0.entry(snapshot.label()) {
            Entry::Occupied(entry) => Err(StockError::DuplicateVintage(entry.key().clone())),
            Entry::Vacant(entry) => Ok(entry.insert(Rc::new(snapshot)).clone()),
        }
    }

    /// Close `vintage` and archive it, without opening another vintage
    pub fn close_final(&mut self, mut vintage: Vintage) -> Result<Rc<VintageSnapshot>, StockError> {
        let snapshot = vintage.close()?;
        info!(
            "Closed vintage {} with average EUI {}",
            snapshot.label(),
            snapshot.average_eui
        );
        self.insert(snapshot)
    }

    /// Close the current vintage and open the next one.
    ///
    /// The next vintage starts the year after the closed one ends. Its starting stock is the
    /// closed vintage's total floor space at the start of its final year. The retrofit-eligible
    /// stock and population do not carry over: every vintage restarts from the model's initial
    /// values.
    ///
    /// # Arguments
    ///
    /// * `current` - The vintage to close
    /// * `new_end_year` - The final year of the next vintage
    /// * `remaining_stock` - Retrofit-eligible floor space at the start of the next vintage
    /// * `population` - Population at the start of the next vintage
    ///
    /// # Returns
    ///
    /// The archived snapshot and the next vintage, which has already been run.
    pub fn transition(
        &mut self,
        current: Vintage,
        new_end_year: u32,
        remaining_stock: Area,
        population: f64,
    ) -> Result<(Rc<VintageSnapshot>, Vintage), StockError> {
        if current.trajectory(TrajectoryKind::Total).is_empty() {
            return Err(StockError::EmptyVintage(current.start_year()));
        }

        let rates = Rc::clone(current.rates());
        let closed = self.close_final(current)?;

        let mut next = Vintage::new(
            rates,
            closed.end_year + 1,
            closed.last_total_area(),
            remaining_stock,
            population,
        );
        info!(
            "Opening vintage {}-{new_end_year} with starting stock {}",
            next.start_year(),
            next.starting_stock()
        );
        next.extend_to(new_end_year)?;
        next.run()?;

        Ok((closed, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{rate_table, vintage};
    use crate::rate_table::RateTable;
    use rstest::rstest;

    #[rstest]
    fn test_transition(rate_table: RateTable) {
        let mut current = Vintage::new(
            rate_table.into(),
            2017,
            Area(295.745),
            Area(281.0),
            4_859_250.0,
        );
        current.extend_to(2018).unwrap();
        current.run().unwrap();
        let last_total = *current.trajectory(TrajectoryKind::Total).last().unwrap();

        let mut ledger = VintageLedger::new();
        let (closed, next) = ledger
            .transition(current, 2020, Area(281.0), 4_859_250.0)
            .unwrap();
        assert_eq!(closed.label(), "2017-2018");
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get("2017-2018"), Some(&closed));

        assert_eq!(next.start_year(), 2019);
        assert_eq!(next.years(), [2019, 2020]);
        assert_eq!(next.trajectory(TrajectoryKind::Total).len(), 2);
        assert_eq!(next.starting_stock(), last_total);
        assert_eq!(next.trajectory(TrajectoryKind::Total)[0], last_total);

        // Population and retrofit-eligible stock restart from the initial values
        assert_eq!(next.population_trajectory()[0], 4_859_250.0);
        assert_eq!(
            next.remaining_stock_trajectory()[0],
            Area(281.0) - next.trajectory(TrajectoryKind::Demolished)[0]
        );
        assert!(next.remaining_stock_trajectory()[0] > closed.closing_remaining_stock);

        let final_snapshot = ledger.close_final(next).unwrap();
        assert_eq!(final_snapshot.label(), "2019-2020");
        assert_eq!(
            ledger.iter().map(|(label, _)| label).collect::<Vec<_>>(),
            ["2017-2018", "2019-2020"]
        );
        assert_eq!(ledger.last(), Some(&final_snapshot));
    }

    #[rstest]
    fn test_transition_empty_vintage(rate_table: RateTable) {
        let mut current = Vintage::new(rate_table.into(), 2017, Area(1.0), Area(1.0), 1.0);
        current.extend_to(2018).unwrap();

        let mut ledger = VintageLedger::new();
        assert!(matches!(
            ledger.transition(current, 2020, Area(1.0), 1.0),
            Err(StockError::EmptyVintage(2017))
        ));
        assert!(ledger.is_empty());
    }

    #[rstest]
    fn test_transition_beyond_rate_table(vintage: Vintage) {
        let mut ledger = VintageLedger::new();
        assert!(matches!(
            ledger.transition(vintage, 2022, Area(281.0), 4_859_250.0),
            Err(StockError::IndexOutOfRange { index: 4, .. })
        ));

        // The closed vintage is still archived
        assert_eq!(ledger.len(), 1);
    }

    #[rstest]
    fn test_insert_duplicate(vintage: Vintage) {
        let mut first = vintage.clone();
        let mut second = vintage;
        let mut ledger = VintageLedger::new();
        ledger.insert(first.close().unwrap()).unwrap();
        assert_eq!(
            ledger.insert(second.close().unwrap()),
            Err(StockError::DuplicateVintage("2017-2020".into()))
        );
        assert_eq!(ledger.len(), 1);
    }
}
