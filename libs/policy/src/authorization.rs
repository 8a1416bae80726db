//! Role based authorization
//!
//! Two layers: a `(role, action)` table for endpoints, and a field level gate
//! for employee record updates.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::models::{Employee, EmployeeField, EmployeePatch, EmployeeStatus, Role};
use crate::{PolicyError, PolicyResult};

/// Operations guarded by role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    CreateEmployee,
    ViewEmployees,
    UpdateEmployee,
    RecordAttendance,
    ManageOwnAbsences,
    ProcessAbsences,
    ViewReports,
    ViewOthersRecords,
    ManageRules,
    ViewLoginCode,
    FlushLedger,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::CreateEmployee => "create_employee",
            Action::ViewEmployees => "view_employees",
            Action::UpdateEmployee => "update_employee",
            Action::RecordAttendance => "record_attendance",
            Action::ManageOwnAbsences => "manage_own_absences",
            Action::ProcessAbsences => "process_absences",
            Action::ViewReports => "view_reports",
            Action::ViewOthersRecords => "view_others_records",
            Action::ManageRules => "manage_rules",
            Action::ViewLoginCode => "view_login_code",
            Action::FlushLedger => "flush_ledger",
        }
    }
}

/// Authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

pub fn is_allowed(role: Role, action: Action) -> bool {
    use Role::*;

    match action {
        Action::CreateEmployee
        | Action::ManageRules
        | Action::ViewLoginCode
        | Action::FlushLedger => role == Root,
        Action::ViewEmployees | Action::ViewOthersRecords => {
            matches!(role, Root | Hr | HrManager | Accountant)
        }
        Action::ProcessAbsences => matches!(role, Root | Hr | HrManager),
        Action::ViewReports => matches!(role, Root | HrManager | Accountant),
        Action::UpdateEmployee | Action::RecordAttendance | Action::ManageOwnAbsences => true,
    }
}

pub fn authorize(role: Role, action: Action) -> PolicyResult<()> {
    if is_allowed(role, action) {
        return Ok(());
    }

    debug!(%role, action = action.as_str(), "Action denied");
    let message = match action {
        Action::CreateEmployee => "Only root can create initial employee records".to_string(),
        Action::ManageRules => "Only root can manage company rules".to_string(),
        Action::ViewLoginCode => "Only root can view the login code".to_string(),
        _ => format!("Role {} is not allowed to {}", role, action.as_str()),
    };
    Err(PolicyError::Forbidden(message))
}

/// Reduce an update request to what `role` may change.
///
/// Root only manages salaries, so every other field is dropped silently.
/// Everyone else is refused outright when the request touches a protected
/// field.
pub fn filter_employee_update(role: Role, patch: EmployeePatch) -> PolicyResult<EmployeePatch> {
    if role == Role::Root {
        let dropped: Vec<&str> = patch
            .fields()
            .into_iter()
            .filter(|f| *f != EmployeeField::Salary)
            .map(|f| f.as_str())
            .collect();
        if !dropped.is_empty() {
            debug!(?dropped, "Ignoring non-salary fields in root update");
        }
        return Ok(patch.salary_only());
    }

    let protected: Vec<&str> = patch
        .fields()
        .into_iter()
        .filter(EmployeeField::is_protected)
        .map(|f| f.as_str())
        .collect();

    if !protected.is_empty() {
        return Err(PolicyError::Forbidden(format!(
            "Cannot update protected fields: {}",
            protected.join(", ")
        )));
    }

    Ok(patch)
}

/// Full gate for `PATCH /employees/:id`: record ownership, lifecycle and
/// field filtering
pub fn authorize_employee_update(
    actor: Actor,
    target: &Employee,
    patch: EmployeePatch,
) -> PolicyResult<EmployeePatch> {
    if actor.role != Role::Root {
        if actor.id != target.id && !actor.role.is_hr() {
            return Err(PolicyError::forbidden(
                "Only the employee or HR can update this record",
            ));
        }
        if target.status == EmployeeStatus::LeftCompany {
            return Err(PolicyError::forbidden(
                "Employees who left the company cannot be updated",
            ));
        }
    }

    filter_employee_update(actor.role, patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewEmployee;
    use chrono::Utc;

    fn salary(amount: f64) -> EmployeePatch {
        EmployeePatch {
            salary: Some(amount),
            ..Default::default()
        }
    }

    fn department(name: &str) -> EmployeePatch {
        EmployeePatch {
            department: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn employee() -> Employee {
        Employee::create(
            NewEmployee {
                nickname: "worker".to_string(),
                role: Role::Employee,
                wallet_address: None,
                onboard_date: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn table_is_total_and_root_only_where_expected() {
        for role in Role::ALL {
            for action in [
                Action::CreateEmployee,
                Action::ManageRules,
                Action::ViewLoginCode,
                Action::FlushLedger,
            ] {
                assert_eq!(is_allowed(role, action), role == Role::Root);
            }
            assert!(is_allowed(role, Action::RecordAttendance));
            assert!(is_allowed(role, Action::ManageOwnAbsences));
        }

        assert!(is_allowed(Role::Accountant, Action::ViewReports));
        assert!(!is_allowed(Role::Hr, Action::ViewReports));
        assert!(is_allowed(Role::Hr, Action::ProcessAbsences));
        assert!(!is_allowed(Role::Accountant, Action::ProcessAbsences));
        assert!(!is_allowed(Role::Employee, Action::ViewEmployees));
    }

    #[test]
    fn create_employee_message() {
        let err = authorize(Role::Hr, Action::CreateEmployee).unwrap_err();
        assert_eq!(
            err,
            PolicyError::Forbidden("Only root can create initial employee records".to_string())
        );
    }

    #[test]
    fn salary_updates_are_root_only() {
        assert_eq!(filter_employee_update(Role::Root, salary(6000.0)).unwrap(), salary(6000.0));
        assert!(matches!(
            filter_employee_update(Role::Employee, salary(6000.0)),
            Err(PolicyError::Forbidden(_))
        ));
        assert!(matches!(
            filter_employee_update(Role::Hr, salary(6000.0)),
            Err(PolicyError::Forbidden(_))
        ));
    }

    #[test]
    fn profile_fields_pass_for_non_root() {
        assert_eq!(
            filter_employee_update(Role::Employee, department("IT")).unwrap(),
            department("IT")
        );
    }

    #[test]
    fn root_updates_keep_only_salary() {
        let mixed = EmployeePatch {
            salary: Some(7000.0),
            department: Some("Finance".to_string()),
            nickname: Some("renamed".to_string()),
            ..Default::default()
        };
        assert_eq!(filter_employee_update(Role::Root, mixed).unwrap(), salary(7000.0));
        assert!(
            filter_employee_update(Role::Root, department("IT"))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn any_protected_field_rejects_the_whole_request() {
        let sneaky = EmployeePatch {
            department: Some("IT".to_string()),
            role: Some(Role::Root),
            ..Default::default()
        };
        let err = filter_employee_update(Role::HrManager, sneaky).unwrap_err();
        assert_eq!(
            err,
            PolicyError::Forbidden("Cannot update protected fields: role".to_string())
        );
    }

    #[test]
    fn ownership_and_lifecycle_are_checked_for_non_root() {
        let target = employee();
        let owner = Actor {
            id: target.id,
            role: Role::Employee,
        };
        let colleague = Actor {
            id: Uuid::new_v4(),
            role: Role::Employee,
        };
        let hr = Actor {
            id: Uuid::new_v4(),
            role: Role::Hr,
        };

        assert!(authorize_employee_update(owner, &target, department("IT")).is_ok());
        assert!(authorize_employee_update(hr, &target, department("IT")).is_ok());
        assert!(authorize_employee_update(colleague, &target, department("IT")).is_err());

        let mut gone = target.clone();
        gone.status = EmployeeStatus::LeftCompany;
        assert!(authorize_employee_update(owner, &gone, department("IT")).is_err());

        let root = Actor {
            id: Uuid::new_v4(),
            role: Role::Root,
        };
        assert!(authorize_employee_update(root, &gone, salary(1.0)).is_ok());
    }
}
