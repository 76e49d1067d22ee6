//! Mosaic Sync
//!
//! The input side of the donor wall pipeline: download the crowdfunding
//! pledge export, detect whether it changed since the last poll, and
//! parse it into pledge records for the allocation engine.
//!
//! Change detection is content-hash based over the export's payload line
//! only, so cosmetic page churn never triggers a re-allocation.

mod error;
mod fetch;
mod parse;

pub use error::{Result, SyncError};
pub use fetch::{content_hash, extract_data_line, Fetcher, PREVIOUS_SNAPSHOT_FILE, SNAPSHOT_FILE};
pub use parse::{
    parse_records, ANONYMOUS_IDX, ANONYMOUS_NAME, FIRST_NAME_IDX, LAST_NAME_IDX, PLEDGE_IDX,
};
