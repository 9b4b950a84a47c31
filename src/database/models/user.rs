use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::role::Role;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Public view of a user with credentials and audit fields removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub full_name: String,
    pub email: String,
}

/// User resolved for an authenticated request, with its active roles.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithRoles {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub roles: Vec<Role>,
}

impl UserWithRoles {
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|role| role.name == name)
    }

    pub fn has_any_role(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.has_role(name))
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: 7,
            full_name: "Ana".to_string(),
            email: "ana@x.com".to_string(),
            password_hash: "$2b$10$secret".to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let value = serde_json::to_value(sample_user()).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert_eq!(value["fullName"], "Ana");
        assert_eq!(value["email"], "ana@x.com");
    }

    #[test]
    fn profile_strips_audit_fields() {
        let value = serde_json::to_value(sample_user().profile()).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 3);
        assert!(value.get("createdAt").is_none());
    }

    #[test]
    fn role_membership_checks() {
        let now = Utc::now();
        let user = UserWithRoles {
            profile: sample_user().profile(),
            roles: vec![Role {
                id: 1,
                name: "ADMIN".to_string(),
                created_at: now,
                updated_at: now,
                deleted_at: None,
            }],
        };
        assert!(user.has_role("ADMIN"));
        assert!(!user.has_role("PATIENT"));
        assert!(user.has_any_role(&["PATIENT", "ADMIN"]));
        assert!(!user.has_any_role(&[]));
    }
}
