//! SurrealDB repository implementations.

mod allocation;
mod assignment;
mod availability;
mod change_note;
mod employee;
mod notification;

pub use allocation::SurrealAllocationRequestRepository;
pub use assignment::SurrealAssignmentRepository;
pub use availability::SurrealAvailabilityResolver;
pub use change_note::SurrealChangeNoteRepository;
pub use employee::SurrealEmployeeRepository;
pub use notification::SurrealNotifier;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::DbError;

fn parse_uuid(value: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Migration(format!("invalid {what} UUID: {e}")))
}

fn parse_optional_uuid(value: Option<String>, what: &str) -> Result<Option<Uuid>, DbError> {
    value.as_deref().map(|v| parse_uuid(v, what)).transpose()
}

fn parse_date(value: &str) -> Result<NaiveDate, DbError> {
    value
        .parse()
        .map_err(|e| DbError::Migration(format!("invalid date {value}: {e}")))
}

fn parse_percentage(value: i64) -> Result<u8, DbError> {
    u8::try_from(value)
        .ok()
        .filter(|pct| *pct <= 100)
        .ok_or_else(|| DbError::Migration(format!("allocation percentage out of range: {value}")))
}
