//! Domain records handled by the policy engine

pub mod absence;
pub mod attendance;
pub mod employee;
pub mod role;
pub mod violation;

// Re-export for convenience
pub use absence::{Absence, AbsenceDraft, AbsenceKind, AbsenceStatus, AbsenceType, Permission};
pub use attendance::Attendance;
pub use employee::{Employee, EmployeeField, EmployeePatch, EmployeeStatus, NewEmployee};
pub use role::Role;
pub use violation::{Violation, ViolationType};
