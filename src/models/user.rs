use super::role::Role;
use serde::{Deserialize, Serialize};

/// A user row as returned by the API (never carries the password hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    pub role: Role,
    pub active: bool,
    pub is_active: bool,
}

impl User {
    pub fn is_enabled(&self) -> bool {
        self.active && self.is_active
    }
}

/// Identity attached to a request, from a session or the dev stub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub role: Role,
}

impl SessionUser {
    pub fn dev_admin() -> Self {
        SessionUser {
            id: 1,
            username: "dev-admin".to_string(),
            display_name: None,
            role: Role::Admin,
        }
    }
}

impl From<&User> for SessionUser {
    fn from(u: &User) -> Self {
        SessionUser {
            id: u.id,
            username: u.username.clone(),
            display_name: Some(u.display_name.clone()),
            role: u.role,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupervisorTech {
    pub supervisor_id: i64,
    pub tech_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManagerSupervisor {
    pub manager_id: i64,
    pub supervisor_id: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRelations {
    pub users: Vec<UserSummary>,
    pub supervisor_techs: Vec<SupervisorTech>,
    pub manager_supervisors: Vec<ManagerSupervisor>,
}
