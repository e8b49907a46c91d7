use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User roles, closed set. Stored as text in the database; parsing an unknown
/// value is a data error, not a fallback to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Designer,
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Designer => "DESIGNER",
            Role::Client => "CLIENT",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "DESIGNER" => Ok(Role::Designer),
            "CLIENT" => Ok(Role::Client),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full user record as persisted. The password hash never leaves the process;
/// responses use `PublicUser` or the summary types below.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for user creation. The caller is responsible for hashing the password.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// User shape returned by auth endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Owner shape embedded in project responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for OwnerSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Member shape embedded in project detail responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for MemberSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_round_trips_through_text() {
        for role in [Role::Admin, Role::Designer, Role::Client] {
            assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
        }
        assert!(Role::from_str("MANAGER").is_err());
        assert!(Role::from_str("admin").is_err());
    }

    #[test]
    fn role_serializes_screaming_snake() {
        assert_eq!(serde_json::to_value(Role::Designer).unwrap(), "DESIGNER");
        let parsed: Role = serde_json::from_value(serde_json::json!("CLIENT")).unwrap();
        assert_eq!(parsed, Role::Client);
    }
}
