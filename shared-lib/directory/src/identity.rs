//! Caller identity and role definitions.

use serde::{Deserialize, Serialize};

/// Roles relevant to approval actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Administrator with full access
    Admin,
    /// Line manager who can approve or reject requests
    Manager,
    /// Regular employee
    Employee,
}

impl Default for Role {
    fn default() -> Self {
        Self::Employee
    }
}

impl Role {
    /// Check if the role may approve or reject requests.
    pub fn can_approve(self) -> bool {
        match self {
            Role::Admin | Role::Manager => true,
            Role::Employee => false,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Manager => "Manager",
            Role::Employee => "Employee",
        }
    }
}

/// A directory user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Numeric directory id
    pub id: i64,
    /// Display name
    pub display_name: String,
    /// Primary email address
    pub email: String,
}

impl UserInfo {
    pub fn new(id: i64, display_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            email: email.into(),
        }
    }

    /// Key used for the `EmployeeId` column of attendance records.
    pub fn employee_id(&self) -> String {
        self.email.to_lowercase()
    }
}

/// The resolved current caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user: UserInfo,
    pub role: Role,
}

impl Caller {
    pub fn new(user: UserInfo, role: Role) -> Self {
        Self { user, role }
    }

    pub fn can_approve(&self) -> bool {
        self.role.can_approve()
    }

    /// Whether the caller owns records keyed by `employee_id`.
    pub fn owns(&self, employee_id: &str) -> bool {
        self.user.employee_id() == employee_id.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_capabilities() {
        assert!(Role::Admin.can_approve());
        assert!(Role::Manager.can_approve());
        assert!(!Role::Employee.can_approve());
        assert_eq!(Role::default(), Role::Employee);
    }

    #[test]
    fn test_owns_is_case_insensitive() {
        let caller = Caller::new(
            UserInfo::new(3, "Asha Rao", "Asha.Rao@contoso.example"),
            Role::Employee,
        );
        assert!(caller.owns("asha.rao@contoso.example"));
        assert!(!caller.owns("someone.else@contoso.example"));
    }
}
