use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Coordinator,
    Supervisor,
    Manager,
    Tech,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Coordinator,
        Role::Supervisor,
        Role::Manager,
        Role::Tech,
    ];

    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Coordinator => "coordinator",
            Role::Supervisor => "supervisor",
            Role::Manager => "manager",
            Role::Tech => "tech",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "coordinator" => Some(Role::Coordinator),
            "supervisor" => Some(Role::Supervisor),
            "manager" => Some(Role::Manager),
            "tech" => Some(Role::Tech),
            _ => None,
        }
    }

    /// CLI input, any case
    pub fn from_code(code: &str) -> Option<Self> {
        Self::from_db_str(&code.trim().to_lowercase())
    }

    /// Admins and coordinators see every project.
    pub fn sees_everything(&self) -> bool {
        matches!(self, Role::Admin | Role::Coordinator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_strings_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::from_db_str(role.to_db_str()), Some(role));
        }
        assert_eq!(Role::from_db_str("root"), None);
        assert_eq!(Role::from_code(" Supervisor "), Some(Role::Supervisor));
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Role::Coordinator).unwrap(), "\"coordinator\"");
        let r: Role = serde_json::from_str("\"tech\"").unwrap();
        assert_eq!(r, Role::Tech);
    }
}
