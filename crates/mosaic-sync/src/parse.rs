//! Parsing of the export payload into pledge records.
//!
//! The payload line is a script assignment, `var data = [[...], ...];`,
//! whose right-hand side is an array of row arrays. Rows come from a
//! spreadsheet export, so the interesting columns sit at fixed indexes
//! among ~30 columns of campaign bookkeeping.

use crate::error::{Result, SyncError};
use mosaic_patron::{PatronId, PledgeRecord};
use serde_json::Value;

/// Column carrying the anonymity flag.
pub const ANONYMOUS_IDX: usize = 2;
/// Column carrying the first name.
pub const FIRST_NAME_IDX: usize = 5;
/// Column carrying the last name.
pub const LAST_NAME_IDX: usize = 7;
/// Column carrying the pledged amount.
pub const PLEDGE_IDX: usize = 30;

const MIN_ROW_LEN: usize = PLEDGE_IDX + 1;

/// Display name used for patrons who asked not to be named.
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// Parse a payload line into pledge records.
///
/// Ids are assigned 1-based in row order. Rows that are too short or
/// carry an unreadable pledge are skipped with a warning; a payload whose
/// right-hand side is not a row array at all is an error. Negative
/// pledges pass through untouched — rejecting them is the roster's job.
pub fn parse_records(payload: &str) -> Result<Vec<PledgeRecord>> {
    let json = payload_json(payload)?;
    let rows: Vec<Vec<Value>> = serde_json::from_str(json)
        .map_err(|e| SyncError::Payload(format!("data line is not a row array: {e}")))?;

    let mut records = Vec::with_capacity(rows.len());
    let mut next_id = 1u64;

    for (row_no, row) in rows.iter().enumerate() {
        if row.len() < MIN_ROW_LEN {
            tracing::warn!(row = row_no, fields = row.len(), "skipping short row");
            continue;
        }
        let Some(pledge) = parse_pledge(&row[PLEDGE_IDX]) else {
            tracing::warn!(row = row_no, "skipping row with unreadable pledge");
            continue;
        };

        let anonymous = parse_flag(&row[ANONYMOUS_IDX]);
        let name = if anonymous {
            ANONYMOUS_NAME.to_string()
        } else {
            display_name(&row[FIRST_NAME_IDX], &row[LAST_NAME_IDX])
        };

        records.push(PledgeRecord {
            id: PatronId(next_id),
            name,
            anonymous,
            pledge,
        });
        next_id += 1;
    }

    Ok(records)
}

/// Strip the `var data =` assignment and trailing semicolon.
fn payload_json(payload: &str) -> Result<&str> {
    let (_, rhs) = payload
        .split_once('=')
        .ok_or_else(|| SyncError::Payload("data line has no assignment".into()))?;
    Ok(rhs.trim().trim_end_matches(';').trim_end())
}

/// Read a pledge amount in whole currency units.
///
/// Exports carry amounts as numbers or as decorated strings
/// (`"$1,250.00"`); fractional currency rounds to the nearest unit.
fn parse_pledge(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|v| v.round() as i64)),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .trim_start_matches('$')
                .chars()
                .filter(|c| *c != ',')
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok().map(|v| v.round() as i64)
        }
        _ => None,
    }
}

fn parse_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("1")
                || s.eq_ignore_ascii_case("true")
                || s.eq_ignore_ascii_case("yes")
        }
        _ => false,
    }
}

fn display_name(first: &Value, last: &Value) -> String {
    let first = first.as_str().unwrap_or("").trim();
    let last = last.as_str().unwrap_or("").trim();

    let name = match (first.is_empty(), last.is_empty()) {
        (false, false) => format!("{first} {last}"),
        (false, true) => first.to_string(),
        (true, false) => last.to_string(),
        (true, true) => String::new(),
    };

    if name.is_empty() {
        ANONYMOUS_NAME.to_string()
    } else {
        name
    }
}
