//! Role model and related functionality

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::PolicyError;

/// Role carried by every employee record and access token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Root,
    Hr,
    HrManager,
    Accountant,
    Employee,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Root,
        Role::Hr,
        Role::HrManager,
        Role::Accountant,
        Role::Employee,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Root => "root",
            Role::Hr => "hr",
            Role::HrManager => "hr_manager",
            Role::Accountant => "accountant",
            Role::Employee => "employee",
        }
    }

    /// HR staff may edit profiles and process absences
    pub fn is_hr(&self) -> bool {
        matches!(self, Role::Hr | Role::HrManager)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "root" => Ok(Role::Root),
            "hr" => Ok(Role::Hr),
            "hr_manager" => Ok(Role::HrManager),
            "accountant" => Ok(Role::Accountant),
            "employee" => Ok(Role::Employee),
            other => Err(PolicyError::validation(format!("Unknown role '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_round_trip_through_their_names() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::HrManager).unwrap();
        assert_eq!(json, "\"hr_manager\"");
    }
}
