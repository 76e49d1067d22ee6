//! Allocation results and the conservation audit.

use crate::cell::Cell;
use crate::engine::EPSILON;
use mosaic_patron::{Patron, PatronId, PatronRoster};
use thiserror::Error;

/// A patron's fractional contribution that has not yet been absorbed
/// into a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Share {
    /// The pending patron.
    pub patron: PatronId,
    /// Residual fractional cell units, in `(0, 1)`.
    pub fraction: f64,
}

/// Violations of the allocation invariants.
///
/// A drift violation indicates an implementation bug, not a runtime
/// condition to recover from; callers should abort the run loudly rather
/// than publish an inconsistent result.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AllocationError {
    /// Cell units were created or destroyed during allocation.
    #[error(
        "conservation violated: {total_units} cell units in, {allocated} accounted for \
         (drift {drift})"
    )]
    NumericDrift {
        /// Cell units supplied by the input roster.
        total_units: f64,
        /// Cells created plus remaining credit.
        allocated: f64,
        /// Absolute difference.
        drift: f64,
    },
}

/// The outcome of one allocation pass.
///
/// Constructed only by the engine. Equality is structural — same cells in
/// the same order, same remainder, same pending set — which is what the
/// determinism regression tests compare.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AllocationResult {
    cells: Vec<Cell>,
    remaining_credit: f64,
    pending: Vec<Share>,
}

impl AllocationResult {
    pub(crate) fn new(cells: Vec<Cell>, remaining_credit: f64, pending: Vec<Share>) -> Self {
        Self {
            cells,
            remaining_credit,
            pending,
        }
    }

    /// Cells in creation order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Fractional cell units not yet assigned to any cell, in `[0, 1)`.
    pub fn remaining_credit(&self) -> f64 {
        self.remaining_credit
    }

    /// Patrons whose partial contribution is folded into the remaining
    /// credit, in input order.
    pub fn pending(&self) -> &[Share] {
        &self.pending
    }

    /// Ids of the pending patrons, in input order.
    pub fn pending_ids(&self) -> impl Iterator<Item = PatronId> + '_ {
        self.pending.iter().map(|s| s.patron)
    }

    /// Rebuild the pending patrons as synthetic carryover patrons for the
    /// next allocation run, preserving their display data from the roster
    /// they came from. Pending ids that are not in the roster are skipped.
    pub fn carryover_patrons(&self, roster: &PatronRoster) -> Vec<Patron> {
        self.pending
            .iter()
            .filter_map(|share| {
                roster
                    .iter()
                    .find(|p| p.id() == share.patron)
                    .map(|p| Patron::carryover(p.id(), p.name(), p.anonymous(), share.fraction))
            })
            .collect()
    }

    /// Audit conservation of credit: the cells created plus the remaining
    /// credit must equal the input's total cell units within tolerance.
    ///
    /// No currency unit is created or destroyed by allocation, only
    /// rebucketed.
    pub fn verify_conservation(&self, total_cell_units: f64) -> Result<(), AllocationError> {
        let allocated = self.cells.len() as f64 + self.remaining_credit;
        let drift = (allocated - total_cell_units).abs();
        if drift > EPSILON {
            return Err(AllocationError::NumericDrift {
                total_units: total_cell_units,
                allocated,
                drift,
            });
        }
        Ok(())
    }
}
