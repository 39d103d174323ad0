//! Built-in roles and the guard check used by every protected handler.
//!
//! Tokens carry the role as a plain string. A guard passes when the claimed
//! role equals one of the allowed role names; `admin` passes every guard.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    Admin,
    Manager,
    Supervisor,
    Operator,
    Maintenance,
    Warehouse,
    Accountant,
    Hr,
}

impl Role {
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }

    /// Description stored alongside the seeded role row.
    pub fn description(&self) -> &'static str {
        match self {
            Role::Admin       => "Full access to every module",
            Role::Manager     => "Plant management across departments",
            Role::Supervisor  => "Production line supervision",
            Role::Operator    => "Machine operator",
            Role::Maintenance => "Equipment maintenance technician",
            Role::Warehouse   => "Warehouse and stock control",
            Role::Accountant  => "Accounting and finance",
            Role::Hr          => "Human resources and attendance",
        }
    }

    /// Roles seeded into the `roles` table on bootstrap.
    pub fn builtin() -> impl Iterator<Item = Role> {
        <Role as strum::IntoEnumIterator>::iter()
    }

    pub fn is_builtin(name: &str) -> bool {
        name.parse::<Role>().is_ok()
    }
}

/// Role guard: case-insensitive equality against the allowed list.
pub fn role_matches(claimed: &str, allowed: &[Role]) -> bool {
    let claimed = claimed.trim();
    if claimed.eq_ignore_ascii_case(Role::Admin.as_str()) {
        return true;
    }
    allowed.iter().any(|r| claimed.eq_ignore_ascii_case(r.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_passes_every_guard() {
        assert!(role_matches("admin", &[Role::Accountant]));
        assert!(role_matches("ADMIN", &[]));
    }

    #[test]
    fn test_role_matches_is_string_equality() {
        assert!(role_matches("manager", &[Role::Manager, Role::Hr]));
        assert!(role_matches("Hr", &[Role::Manager, Role::Hr]));
        assert!(!role_matches("operator", &[Role::Manager, Role::Hr]));
        assert!(!role_matches("managers", &[Role::Manager]));
        assert!(!role_matches("", &[Role::Manager]));
    }

    #[test]
    fn test_builtin_roles_round_trip_names() {
        let names: Vec<String> = Role::builtin().map(|r| r.to_string()).collect();
        assert_eq!(names.len(), 8);
        assert!(names.contains(&"maintenance".to_string()));
        assert_eq!("Accountant".parse::<Role>().unwrap(), Role::Accountant);
        assert!(Role::is_builtin("warehouse"));
        assert!(!Role::is_builtin("dyer"));
    }
}
