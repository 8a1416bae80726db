//! Application state shared across handlers

use chrono::FixedOffset;
use common::token::TokenVerifier;
use sqlx::PgPool;

use crate::departures::Departures;
use crate::ledger::LedgerNotifier;
use crate::repositories::{
    AbsenceRepository, AttendanceRepository, EmployeeRepository, RuleRepository,
    ViolationRepository,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub verifier: TokenVerifier,
    /// Company local time, used to find the work date of a punch
    pub offset: FixedOffset,
    pub ledger: LedgerNotifier,
    /// Employees whose tokens are no longer honoured
    pub departures: Departures,
    pub employee_repository: EmployeeRepository,
    pub attendance_repository: AttendanceRepository,
    pub absence_repository: AbsenceRepository,
    pub violation_repository: ViolationRepository,
    pub rule_repository: RuleRepository,
}
