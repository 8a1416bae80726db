//! Employee model, creation payload and typed partial update

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::Role;
use crate::validation::{validate_email, validate_nickname, validate_phone_number};
use crate::{PolicyError, PolicyResult};

/// Lifecycle of an employee record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    /// Created by root, profile not completed yet
    Pending,
    Active,
    LeftCompany,
}

impl EmployeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Pending => "pending",
            EmployeeStatus::Active => "active",
            EmployeeStatus::LeftCompany => "left_company",
        }
    }
}

impl fmt::Display for EmployeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmployeeStatus {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EmployeeStatus::Pending),
            "active" => Ok(EmployeeStatus::Active),
            "left_company" => Ok(EmployeeStatus::LeftCompany),
            other => Err(PolicyError::validation(format!(
                "Unknown employee status '{}'",
                other
            ))),
        }
    }
}

/// Employee entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Employee {
    pub id: Uuid,
    pub nickname: String,
    pub role: Role,
    pub status: EmployeeStatus,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub tax_id: Option<String>,
    pub health_insurance_id: Option<String>,
    pub social_insurance_id: Option<String>,
    pub number_of_dependents: i32,
    pub position: Option<String>,
    pub location: Option<String>,
    pub department: Option<String>,
    pub wallet_address: Option<String>,
    pub salary: f64,
    pub leave_balance: i32,
    pub onboard_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New employee creation payload (root only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEmployee {
    pub nickname: String,
    pub role: Role,
    pub wallet_address: Option<String>,
    pub onboard_date: Option<NaiveDate>,
}

impl Employee {
    /// Build the minimal pending record a root actor creates
    pub fn create(new: NewEmployee, now: DateTime<Utc>) -> PolicyResult<Self> {
        validate_nickname(&new.nickname).map_err(PolicyError::Validation)?;

        Ok(Employee {
            id: Uuid::new_v4(),
            nickname: new.nickname,
            role: new.role,
            status: EmployeeStatus::Pending,
            full_name: None,
            email: None,
            phone_number: None,
            address: None,
            date_of_birth: None,
            gender: None,
            tax_id: None,
            health_insurance_id: None,
            social_insurance_id: None,
            number_of_dependents: 0,
            position: None,
            location: None,
            department: None,
            wallet_address: new.wallet_address.filter(|w| !w.trim().is_empty()),
            salary: 0.0,
            leave_balance: 0,
            onboard_date: Some(new.onboard_date.unwrap_or_else(|| now.date_naive())),
            created_at: now,
            updated_at: now,
        })
    }

    /// Display name used in reports
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.nickname)
    }

    /// Whether every field required to activate the account is filled in
    pub fn profile_complete(&self) -> bool {
        [
            &self.full_name,
            &self.email,
            &self.phone_number,
            &self.address,
            &self.position,
            &self.department,
            &self.location,
        ]
        .iter()
        .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }

    /// Apply an already authorized patch and activate a completed profile.
    ///
    /// Returns true when the status moved from pending to active.
    pub fn apply(&mut self, patch: EmployeePatch, now: DateTime<Utc>) -> bool {
        let EmployeePatch {
            full_name,
            email,
            phone_number,
            address,
            date_of_birth,
            gender,
            tax_id,
            health_insurance_id,
            social_insurance_id,
            number_of_dependents,
            position,
            location,
            department,
            wallet_address,
            nickname,
            role,
            salary,
        } = patch;

        fn set<T>(target: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *target = value;
            }
        }

        set(&mut self.full_name, full_name);
        set(&mut self.email, email);
        set(&mut self.phone_number, phone_number);
        set(&mut self.address, address);
        set(&mut self.date_of_birth, date_of_birth);
        set(&mut self.gender, gender);
        set(&mut self.tax_id, tax_id);
        set(&mut self.health_insurance_id, health_insurance_id);
        set(&mut self.social_insurance_id, social_insurance_id);
        set(&mut self.position, position);
        set(&mut self.location, location);
        set(&mut self.department, department);
        set(&mut self.wallet_address, wallet_address);
        if let Some(n) = number_of_dependents {
            self.number_of_dependents = n;
        }
        if let Some(n) = nickname {
            self.nickname = n;
        }
        if let Some(r) = role {
            self.role = r;
        }
        if let Some(s) = salary {
            self.salary = s;
        }
        self.updated_at = now;

        if self.status == EmployeeStatus::Pending && self.profile_complete() {
            self.status = EmployeeStatus::Active;
            true
        } else {
            false
        }
    }
}

/// Updatable employee fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeField {
    FullName,
    Email,
    PhoneNumber,
    Address,
    DateOfBirth,
    Gender,
    TaxId,
    HealthInsuranceId,
    SocialInsuranceId,
    NumberOfDependents,
    Position,
    Location,
    Department,
    WalletAddress,
    Nickname,
    Role,
    Salary,
}

impl EmployeeField {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeField::FullName => "full_name",
            EmployeeField::Email => "email",
            EmployeeField::PhoneNumber => "phone_number",
            EmployeeField::Address => "address",
            EmployeeField::DateOfBirth => "date_of_birth",
            EmployeeField::Gender => "gender",
            EmployeeField::TaxId => "tax_id",
            EmployeeField::HealthInsuranceId => "health_insurance_id",
            EmployeeField::SocialInsuranceId => "social_insurance_id",
            EmployeeField::NumberOfDependents => "number_of_dependents",
            EmployeeField::Position => "position",
            EmployeeField::Location => "location",
            EmployeeField::Department => "department",
            EmployeeField::WalletAddress => "wallet_address",
            EmployeeField::Nickname => "nickname",
            EmployeeField::Role => "role",
            EmployeeField::Salary => "salary",
        }
    }

    /// Fields only root may touch
    pub fn is_protected(&self) -> bool {
        matches!(
            self,
            EmployeeField::Nickname | EmployeeField::Role | EmployeeField::Salary
        )
    }
}

impl fmt::Display for EmployeeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Employee update payload
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EmployeePatch {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub tax_id: Option<String>,
    pub health_insurance_id: Option<String>,
    pub social_insurance_id: Option<String>,
    pub number_of_dependents: Option<i32>,
    pub position: Option<String>,
    pub location: Option<String>,
    pub department: Option<String>,
    pub wallet_address: Option<String>,
    pub nickname: Option<String>,
    pub role: Option<Role>,
    pub salary: Option<f64>,
}

impl EmployeePatch {
    /// Fields present in the request, in declaration order
    pub fn fields(&self) -> Vec<EmployeeField> {
        let mut fields = Vec::new();
        let mut push = |present: bool, field: EmployeeField| {
            if present {
                fields.push(field);
            }
        };
        push(self.full_name.is_some(), EmployeeField::FullName);
        push(self.email.is_some(), EmployeeField::Email);
        push(self.phone_number.is_some(), EmployeeField::PhoneNumber);
        push(self.address.is_some(), EmployeeField::Address);
        push(self.date_of_birth.is_some(), EmployeeField::DateOfBirth);
        push(self.gender.is_some(), EmployeeField::Gender);
        push(self.tax_id.is_some(), EmployeeField::TaxId);
        push(
            self.health_insurance_id.is_some(),
            EmployeeField::HealthInsuranceId,
        );
        push(
            self.social_insurance_id.is_some(),
            EmployeeField::SocialInsuranceId,
        );
        push(
            self.number_of_dependents.is_some(),
            EmployeeField::NumberOfDependents,
        );
        push(self.position.is_some(), EmployeeField::Position);
        push(self.location.is_some(), EmployeeField::Location);
        push(self.department.is_some(), EmployeeField::Department);
        push(self.wallet_address.is_some(), EmployeeField::WalletAddress);
        push(self.nickname.is_some(), EmployeeField::Nickname);
        push(self.role.is_some(), EmployeeField::Role);
        push(self.salary.is_some(), EmployeeField::Salary);
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Keep only the salary change
    pub fn salary_only(self) -> Self {
        EmployeePatch {
            salary: self.salary,
            ..Default::default()
        }
    }

    /// Check the values carried by the patch
    pub fn validate(&self) -> PolicyResult<()> {
        if let Some(email) = &self.email {
            validate_email(email).map_err(PolicyError::Validation)?;
        }
        if let Some(phone) = &self.phone_number {
            validate_phone_number(phone).map_err(PolicyError::Validation)?;
        }
        if let Some(nickname) = &self.nickname {
            validate_nickname(nickname).map_err(PolicyError::Validation)?;
        }
        if let Some(salary) = self.salary {
            if !salary.is_finite() || salary < 0.0 {
                return Err(PolicyError::validation("Salary must be a positive amount"));
            }
        }
        if let Some(dependents) = self.number_of_dependents {
            if dependents < 0 {
                return Err(PolicyError::validation(
                    "Number of dependents cannot be negative",
                ));
            }
        }
        for (value, field) in [
            (&self.full_name, EmployeeField::FullName),
            (&self.address, EmployeeField::Address),
            (&self.position, EmployeeField::Position),
            (&self.location, EmployeeField::Location),
            (&self.department, EmployeeField::Department),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(PolicyError::validation(format!("{} cannot be empty", field)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> Employee {
        Employee::create(
            NewEmployee {
                nickname: "testuser".to_string(),
                role: Role::Employee,
                wallet_address: None,
                onboard_date: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn profile() -> EmployeePatch {
        EmployeePatch {
            full_name: Some("Test Employee".to_string()),
            email: Some("test@company.com".to_string()),
            phone_number: Some("+1234567890".to_string()),
            address: Some("123 Test St".to_string()),
            position: Some("Developer".to_string()),
            department: Some("IT".to_string()),
            location: Some("HQ".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn new_employees_start_pending_without_profile() {
        let employee = pending();
        assert_eq!(employee.status, EmployeeStatus::Pending);
        assert_eq!(employee.salary, 0.0);
        assert!(employee.full_name.is_none());
        assert!(employee.onboard_date.is_some());
    }

    #[test]
    fn completing_the_profile_activates_the_account() {
        let mut employee = pending();
        let activated = employee.apply(profile(), Utc::now());
        assert!(activated);
        assert_eq!(employee.status, EmployeeStatus::Active);
        assert_eq!(employee.department.as_deref(), Some("IT"));
        assert_eq!(employee.nickname, "testuser");
    }

    #[test]
    fn partial_profile_stays_pending() {
        let mut employee = pending();
        let patch = EmployeePatch {
            full_name: Some("Half Done".to_string()),
            ..Default::default()
        };
        assert!(!employee.apply(patch, Utc::now()));
        assert_eq!(employee.status, EmployeeStatus::Pending);
    }

    #[test]
    fn patch_lists_present_fields() {
        let patch = EmployeePatch {
            department: Some("IT".to_string()),
            salary: Some(6000.0),
            ..Default::default()
        };
        assert_eq!(
            patch.fields(),
            vec![EmployeeField::Department, EmployeeField::Salary]
        );
        assert_eq!(patch.clone().salary_only().fields(), vec![EmployeeField::Salary]);
    }

    #[test]
    fn patch_validation_rejects_bad_values() {
        let bad_email = EmployeePatch {
            email: Some("not-an-email".to_string()),
            ..Default::default()
        };
        assert!(bad_email.validate().is_err());

        let negative = EmployeePatch {
            salary: Some(-1.0),
            ..Default::default()
        };
        assert!(negative.validate().is_err());

        let blank = EmployeePatch {
            department: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(blank.validate().is_err());

        assert!(profile().validate().is_ok());
    }
}
