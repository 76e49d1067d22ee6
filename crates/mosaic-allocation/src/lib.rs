//! Mosaic Cell Allocation
//!
//! Converts an ordered roster of pledges into ownership assignments over
//! the donor wall's fixed-price cells.
//!
//! # Core Insight
//!
//! A pledge is a fractional number of cells. Whole units become wholly
//! owned cells on the spot; fractions pool until a group of patrons has
//! jointly paid for one more cell. The pooling is a greedy
//! largest-fraction-first bin-fill with deterministic tie-breaking, so
//! identical input always produces an identical wall.
//!
//! # Conservation
//!
//! No credit is created or destroyed: cells created plus the remaining
//! fractional credit always equals the cell units that came in. The
//! invariant is checked by [`AllocationResult::verify_conservation`]; a
//! violation is an implementation bug, not a runtime condition.
//!
//! # Statelessness
//!
//! [`allocate`] is a pure function of its input roster. Residual fractions
//! survive a run as pending shares; carrying them into the next run (as
//! synthetic patrons, via [`AllocationResult::carryover_patrons`]) is the
//! caller's responsibility.

mod cell;
mod engine;
mod result;

pub use cell::{Adopter, Cell, CellId};
pub use engine::{allocate, EPSILON};
pub use result::{AllocationError, AllocationResult, Share};

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_patron::{PatronId, PatronRoster, PledgeRecord};

    #[test]
    fn single_pledge_splits_into_whole_and_pending() {
        let roster = PatronRoster::build(
            [PledgeRecord {
                id: PatronId(1),
                name: "A".into(),
                anonymous: false,
                pledge: 125,
            }],
            50,
        )
        .unwrap();

        let result = allocate(&roster);
        assert_eq!(result.cells().len(), 2);
        assert!((result.remaining_credit() - 0.5).abs() < EPSILON);
        assert_eq!(result.pending_ids().collect::<Vec<_>>(), vec![PatronId(1)]);
    }
}
