//! The persisted wall snapshot and its atomic replacement.
//!
//! The snapshot is the only artifact shared between the pipeline and the
//! HTTP responder, so it is replaced by write-new-then-rename: a reader
//! never observes a partially written file.

use crate::error::Result;
use mosaic_allocation::AllocationResult;
use mosaic_patron::PatronRoster;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the persisted snapshot under the data directory.
pub const SNAPSHOT_BASENAME: &str = "data.json";

/// One cell of the wall, as served to the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdoptedCell {
    /// Sequential cell id, 1-based.
    pub id: u64,
    /// Ids of the patrons funding this cell, in selection order.
    pub adoptee_ids: Vec<u64>,
}

/// A patron whose fractional contribution has not yet bought a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemainingPatron {
    pub id: u64,
    pub name: String,
    pub anonymous: bool,
    /// Residual fractional cell units.
    pub credit: f64,
}

/// One patron of the audit list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatronEntry {
    pub id: u64,
    pub name: String,
    pub anonymous: bool,
    pub pledge: u64,
    pub cell_units: f64,
}

/// The full input roster, kept in the snapshot for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatronList {
    pub patrons: Vec<PatronEntry>,
    pub length: usize,
    pub total_raised: u64,
    pub total_cells: f64,
}

/// Everything the wall front end needs, in one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallSnapshot {
    pub adopted_cells: Vec<AdoptedCell>,
    /// Fractional cell units not yet assigned to any cell.
    pub credit: f64,
    pub remaining_patrons: Vec<RemainingPatron>,
    pub patron_list: PatronList,
}

impl WallSnapshot {
    /// Build a snapshot from one allocation pass.
    pub fn build(roster: &PatronRoster, result: &AllocationResult) -> Self {
        let adopted_cells = result
            .cells()
            .iter()
            .map(|cell| AdoptedCell {
                id: cell.id().value(),
                adoptee_ids: cell.adopter_ids().map(|id| id.value()).collect(),
            })
            .collect();

        let remaining_patrons = result
            .carryover_patrons(roster)
            .into_iter()
            .map(|patron| RemainingPatron {
                id: patron.id().value(),
                name: patron.name().to_string(),
                anonymous: patron.anonymous(),
                credit: patron.cell_units(),
            })
            .collect();

        let totals = roster.snapshot();
        let patron_list = PatronList {
            patrons: roster
                .iter()
                .map(|patron| PatronEntry {
                    id: patron.id().value(),
                    name: patron.name().to_string(),
                    anonymous: patron.anonymous(),
                    pledge: patron.pledge(),
                    cell_units: patron.cell_units(),
                })
                .collect(),
            length: totals.count,
            total_raised: totals.total_pledged,
            total_cells: totals.total_cell_units,
        };

        Self {
            adopted_cells,
            credit: result.remaining_credit(),
            remaining_patrons,
            patron_list,
        }
    }
}

/// Write a snapshot next to its final path, then rename it into place.
pub fn write_atomic(path: &Path, snapshot: &WallSnapshot) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(snapshot)?;
    let tmp = tmp_path(path);
    std::fs::write(&tmp, &bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Load a previously persisted snapshot, `None` if there is none yet.
pub fn read(path: &Path) -> Result<Option<WallSnapshot>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}
