//! Repositories for database operations
//!
//! Reads go through the pool held by each repository. Writes take a
//! `&mut PgConnection` so handlers can group them in one transaction.

use common::error::{DatabaseError, DatabaseResult};
use sqlx::{Row, postgres::PgRow};
use std::str::FromStr;

pub mod absence;
pub mod attendance;
pub mod employee;
pub mod outbox;
pub mod rule;
pub mod violation;

// Re-export for convenience
pub use absence::AbsenceRepository;
pub use attendance::AttendanceRepository;
pub use employee::EmployeeRepository;
pub use outbox::OutboxRepository;
pub use rule::RuleRepository;
pub use violation::ViolationRepository;

/// Read a TEXT column holding an enum name
fn parse_column<T: FromStr>(row: &PgRow, column: &str) -> DatabaseResult<T> {
    let raw: String = row.try_get(column)?;
    raw.parse()
        .map_err(|_| DatabaseError::decode(column, &raw))
}
