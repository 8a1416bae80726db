//! Attendance and absence policy engine
//!
//! Pure business rules shared by the services: punctuality evaluation,
//! the absence approval workflow, field-level authorization for employee
//! records, work-hour aggregation and the rotating login code. Nothing in
//! here talks to the database or the network.

pub mod absence;
pub mod attendance;
pub mod authorization;
pub mod error;
pub mod login_code;
pub mod models;
pub mod payroll;
pub mod report;
pub mod validation;

pub use error::{PolicyError, PolicyResult};
