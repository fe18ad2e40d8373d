//! Repository layer — entity-scoped database operations.
//!
//! Free functions over `&Connection`; the store layer owns locking and
//! maps "no rows" into domain errors.

mod analysis;
mod feedback;

pub use analysis::*;
pub use feedback::*;

use chrono::NaiveDateTime;

use super::DatabaseError;

/// Timestamp format for TEXT columns (sortable, sub-second precision).
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub(crate) fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad timestamp {raw:?}: {e}")))
}

pub(crate) fn parse_uuid(raw: &str) -> Result<uuid::Uuid, DatabaseError> {
    uuid::Uuid::parse_str(raw).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}
