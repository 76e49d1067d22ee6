//! A single pledge and the raw record it is built from.
//!
//! A `Patron` is immutable once constructed: its `cell_units` value is
//! derived from the pledge amount at construction time and never changes
//! independently of it. Validation (rejecting negative pledges) happens
//! here, so everything downstream of a `Patron` can assume a well-formed
//! pledge.

use crate::error::RecordError;

/// Default price of one wall cell, in whole currency units.
pub const DEFAULT_CELL_PRICE: u64 = 50;

/// Stable patron identifier, assigned at parse time and never reused
/// within a processing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PatronId(pub u64);

impl PatronId {
    /// Create from a raw id.
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id value.
    #[inline]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for PatronId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for PatronId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One raw row of the pledge export, as produced by the parser.
///
/// The pledge is still signed here: validation belongs to roster build,
/// not to parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PledgeRecord {
    /// Id assigned by the parser, 1-based, in row order.
    pub id: PatronId,
    /// Display name for the wall.
    pub name: String,
    /// Whether the patron asked not to be named.
    pub anonymous: bool,
    /// Pledged amount in whole currency units. May be negative in a
    /// malformed export; rejected at roster build.
    pub pledge: i64,
}

/// One validated pledge.
#[derive(Debug, Clone, PartialEq)]
pub struct Patron {
    id: PatronId,
    name: String,
    anonymous: bool,
    pledge: u64,
    cell_units: f64,
}

impl Patron {
    /// Validate a raw record against a cell price.
    ///
    /// Rejects a negative pledge with [`RecordError::NegativePledge`].
    pub fn from_record(record: PledgeRecord, cell_price: u64) -> Result<Self, RecordError> {
        if cell_price == 0 {
            return Err(RecordError::ZeroCellPrice);
        }
        if record.pledge < 0 {
            return Err(RecordError::NegativePledge {
                id: record.id,
                amount: record.pledge,
            });
        }

        let pledge = record.pledge as u64;
        Ok(Self {
            id: record.id,
            name: record.name,
            anonymous: record.anonymous,
            pledge,
            cell_units: pledge as f64 / cell_price as f64,
        })
    }

    /// Build a synthetic patron carrying a residual fractional
    /// contribution from a previous allocation run.
    ///
    /// The residual is supplied directly as cell units; the pledge behind
    /// it was already accounted for when the residual was produced.
    pub fn carryover(
        id: PatronId,
        name: impl Into<String>,
        anonymous: bool,
        residual_units: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            anonymous,
            pledge: 0,
            cell_units: residual_units.max(0.0),
        }
    }

    /// Stable identifier.
    #[inline]
    pub fn id(&self) -> PatronId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the patron asked not to be named.
    pub fn anonymous(&self) -> bool {
        self.anonymous
    }

    /// Pledged amount in whole currency units.
    #[inline]
    pub fn pledge(&self) -> u64 {
        self.pledge
    }

    /// Number of cells this pledge can fund, `pledge / cell_price`.
    #[inline]
    pub fn cell_units(&self) -> f64 {
        self.cell_units
    }
}
