//! Mosaic Pledge Data Model
//!
//! The donor wall is a catalogue of discrete, equally priced cells. This
//! crate holds the input side of that picture: one [`Patron`] per pledge,
//! with a derived fractional cell-unit contribution, collected into an
//! ordered, aggregate-tracking [`PatronRoster`].
//!
//! Patrons are immutable once constructed and are referenced everywhere
//! else by stable [`PatronId`], never by shared pointers — a patron can
//! participate in several logical contexts (a wholly owned cell and a
//! pooled cell) without aliasing hazards.

mod error;
mod patron;
mod roster;

pub use error::RecordError;
pub use patron::{Patron, PatronId, PledgeRecord, DEFAULT_CELL_PRICE};
pub use roster::{PatronRoster, RosterSnapshot};
