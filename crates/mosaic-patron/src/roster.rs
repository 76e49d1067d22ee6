//! Ordered, aggregate-tracking collection of patrons.

use crate::error::RecordError;
use crate::patron::{Patron, PledgeRecord};

/// An ordered collection of patrons with running aggregates.
///
/// Order is input order: the allocation engine consumes the roster top to
/// bottom and its output depends on it. Aggregates are updated in the same
/// call as the membership change, so they always equal the fold of the
/// current members.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatronRoster {
    patrons: Vec<Patron>,
    total_pledged: u64,
    total_cell_units: f64,
}

/// Read-only view of the roster aggregates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RosterSnapshot {
    /// Number of patrons.
    pub count: usize,
    /// Sum of pledged amounts, in whole currency units.
    pub total_pledged: u64,
    /// Sum of cell units across all patrons.
    pub total_cell_units: f64,
}

impl PatronRoster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a batch of raw records into a roster.
    ///
    /// O(n). Fails on the first record with a negative pledge amount; a
    /// partially built roster is never returned.
    pub fn build(
        records: impl IntoIterator<Item = PledgeRecord>,
        cell_price: u64,
    ) -> Result<Self, RecordError> {
        if cell_price == 0 {
            return Err(RecordError::ZeroCellPrice);
        }

        let mut roster = Self::new();
        for record in records {
            roster.append(Patron::from_record(record, cell_price)?);
        }
        Ok(roster)
    }

    /// Append a patron, updating the aggregates in the same step.
    pub fn append(&mut self, patron: Patron) {
        self.total_pledged += patron.pledge();
        self.total_cell_units += patron.cell_units();
        self.patrons.push(patron);
    }

    /// Read the aggregates. Side-effect free.
    pub fn snapshot(&self) -> RosterSnapshot {
        RosterSnapshot {
            count: self.patrons.len(),
            total_pledged: self.total_pledged,
            total_cell_units: self.total_cell_units,
        }
    }

    /// Number of patrons.
    pub fn count(&self) -> usize {
        self.patrons.len()
    }

    /// Whether the roster holds no patrons.
    pub fn is_empty(&self) -> bool {
        self.patrons.is_empty()
    }

    /// Sum of pledged amounts.
    pub fn total_pledged(&self) -> u64 {
        self.total_pledged
    }

    /// Sum of cell units.
    pub fn total_cell_units(&self) -> f64 {
        self.total_cell_units
    }

    /// Iterate patrons in input order.
    pub fn iter(&self) -> std::slice::Iter<'_, Patron> {
        self.patrons.iter()
    }

    /// All patrons, in input order.
    pub fn patrons(&self) -> &[Patron] {
        &self.patrons
    }
}

impl<'a> IntoIterator for &'a PatronRoster {
    type Item = &'a Patron;
    type IntoIter = std::slice::Iter<'a, Patron>;

    fn into_iter(self) -> Self::IntoIter {
        self.patrons.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patron::PatronId;

    fn record(id: u64, pledge: i64) -> PledgeRecord {
        PledgeRecord {
            id: PatronId(id),
            name: format!("Patron {id}"),
            anonymous: false,
            pledge,
        }
    }

    #[test]
    fn build_computes_aggregates() {
        let roster =
            PatronRoster::build([record(1, 150), record(2, 20), record(3, 30)], 50).unwrap();

        let snap = roster.snapshot();
        assert_eq!(snap.count, 3);
        assert_eq!(snap.total_pledged, 200);
        assert_eq!(snap.total_cell_units, 4.0);
    }

    #[test]
    fn build_rejects_negative_pledge() {
        let err = PatronRoster::build([record(1, 100), record(2, -5)], 50).unwrap_err();
        assert_eq!(
            err,
            RecordError::NegativePledge {
                id: PatronId(2),
                amount: -5
            }
        );
    }

    #[test]
    fn build_rejects_zero_cell_price() {
        let err = PatronRoster::build([record(1, 100)], 0).unwrap_err();
        assert_eq!(err, RecordError::ZeroCellPrice);
    }

    #[test]
    fn append_updates_aggregates_in_step() {
        let mut roster = PatronRoster::new();
        assert_eq!(roster.count(), 0);
        assert!(roster.is_empty());

        roster.append(Patron::from_record(record(1, 75), 50).unwrap());
        assert_eq!(roster.count(), 1);
        assert_eq!(roster.total_pledged(), 75);
        assert_eq!(roster.total_cell_units(), 1.5);

        roster.append(Patron::from_record(record(2, 25), 50).unwrap());
        assert_eq!(roster.count(), 2);
        assert_eq!(roster.total_pledged(), 100);
        assert_eq!(roster.total_cell_units(), 2.0);
    }

    #[test]
    fn aggregates_equal_member_fold() {
        let roster = PatronRoster::build(
            (1..=20).map(|i| record(i, (i as i64) * 7)),
            50,
        )
        .unwrap();

        let folded_pledge: u64 = roster.iter().map(|p| p.pledge()).sum();
        let folded_units: f64 = roster.iter().map(|p| p.cell_units()).sum();

        assert_eq!(roster.total_pledged(), folded_pledge);
        assert!((roster.total_cell_units() - folded_units).abs() < 1e-9);
    }

    #[test]
    fn order_is_input_order() {
        let roster = PatronRoster::build([record(3, 10), record(1, 10), record(2, 10)], 50).unwrap();
        let ids: Vec<u64> = roster.iter().map(|p| p.id().value()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn snapshot_is_side_effect_free() {
        let roster = PatronRoster::build([record(1, 60)], 50).unwrap();
        let before = roster.clone();
        let _ = roster.snapshot();
        let _ = roster.snapshot();
        assert_eq!(roster, before);
    }
}
