use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::dto::{LoginUser, RegisterUser};
use crate::auth::{self, Claims};
use crate::database::models::{role, NewUser, UserProfile};
use crate::database::{DatabaseError, Store};
use crate::error::ApiError;
use crate::services::RoleService;

/// Body returned by register and login.
#[derive(Debug, Clone, Serialize)]
pub struct AuthPayload {
    pub message: String,
    pub user: UserProfile,
    pub token: String,
}

pub struct AuthService {
    store: Arc<dyn Store>,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create a PATIENT account and sign it in.
    pub async fn register(&self, register: RegisterUser) -> Result<AuthPayload, ApiError> {
        if self.store.find_user_by_email(&register.email).await?.is_some() {
            return Err(ApiError::conflict("A user with this email is already registered"));
        }
        RoleService::new(self.store.clone()).find_role(role::PATIENT).await?;

        let password_hash = auth::hash_password(register.password.clone()).await?;
        let new_user = NewUser {
            full_name: register.full_name,
            email: register.email,
            password_hash,
        };

        let user = self
            .store
            .create_user_with_role(new_user, role::PATIENT)
            .await
            .map_err(|err| match err {
                DatabaseError::Conflict(_) => ApiError::conflict("A user with this email is already registered"),
                other => other.into(),
            })?;
        info!("Registered user {} with role {}", user.id, role::PATIENT);

        let login = self
            .login(LoginUser {
                email: user.email.clone(),
                password: register.password,
            })
            .await?;

        Ok(AuthPayload {
            message: "User registered successfully".to_string(),
            user: user.profile(),
            token: login.token,
        })
    }

    /// Check credentials and issue a token for `{sub, email}`.
    pub async fn login(&self, login: LoginUser) -> Result<AuthPayload, ApiError> {
        let user = self
            .store
            .find_user_by_email(&login.email)
            .await?
            .ok_or_else(|| ApiError::not_found("No user is registered with this email"))?;

        if !auth::verify_password(login.password, user.password_hash.clone()).await? {
            warn!("Failed login for user {}", user.id);
            return Err(ApiError::bad_request("Incorrect password"));
        }

        let token = auth::generate_jwt(&Claims::new(user.id, user.email.clone()))?;

        Ok(AuthPayload {
            message: "User logged in successfully".to_string(),
            user: user.profile(),
            token,
        })
    }

    /// Local-credentials check. `None` for an unknown email or a wrong password.
    pub async fn validate_user(&self, email: &str, password: &str) -> Result<Option<UserProfile>, ApiError> {
        let Some(user) = self.store.find_user_by_email(email).await? else {
            return Ok(None);
        };
        let matches = auth::verify_password(password.to_string(), user.password_hash.clone()).await?;
        Ok(matches.then(|| user.profile()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    fn ana() -> RegisterUser {
        RegisterUser {
            full_name: "Ana".to_string(),
            email: "ana@x.com".to_string(),
            password: "Str0ng!Pass".to_string(),
        }
    }

    #[tokio::test]
    async fn registration_links_patient_role_and_hides_hash() {
        let store = Arc::new(MemoryStore::with_default_roles());
        let service = AuthService::new(store.clone());

        let payload = service.register(ana()).await.unwrap();
        assert_eq!(payload.message, "User registered successfully");
        assert_eq!(payload.user.email, "ana@x.com");

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json["user"].get("passwordHash").is_none());
        assert!(!json.to_string().contains("$2"));

        let claims = auth::validate_jwt(&payload.token).unwrap();
        assert_eq!(claims.sub, payload.user.id);
        assert_eq!(claims.email, "ana@x.com");

        let resolved = store.find_user_with_roles(payload.user.id).await.unwrap().unwrap();
        assert!(resolved.has_role(role::PATIENT));
        assert_eq!(resolved.roles.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts_and_writes_nothing() {
        let store = Arc::new(MemoryStore::with_default_roles());
        let service = AuthService::new(store.clone());
        service.register(ana()).await.unwrap();

        let err = service.register(ana()).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(store.user_row_count().await, 1);
        assert_eq!(store.list_user_roles().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn registration_without_patient_role_is_fatal() {
        let store = Arc::new(MemoryStore::new());
        let service = AuthService::new(store.clone());

        let err = service.register(ana()).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(ref msg) if msg == "No role named 'PATIENT' was found"));
        assert_eq!(store.user_row_count().await, 0);
    }

    #[tokio::test]
    async fn wrong_password_is_a_bad_request() {
        let store = Arc::new(MemoryStore::with_default_roles());
        let service = AuthService::new(store);
        service.register(ana()).await.unwrap();

        let err = service
            .login(LoginUser {
                email: "ana@x.com".to_string(),
                password: "Wr0ng!Pass".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref msg) if msg == "Incorrect password"));
    }

    #[tokio::test]
    async fn unknown_email_is_not_found() {
        let service = AuthService::new(Arc::new(MemoryStore::with_default_roles()));
        let err = service
            .login(LoginUser {
                email: "nobody@x.com".to_string(),
                password: "Str0ng!Pass".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn validate_user_checks_the_password() {
        let service = AuthService::new(Arc::new(MemoryStore::with_default_roles()));
        service.register(ana()).await.unwrap();

        assert!(service.validate_user("ana@x.com", "Str0ng!Pass").await.unwrap().is_some());
        assert!(service.validate_user("ana@x.com", "Wr0ng!Pass").await.unwrap().is_none());
        assert!(service.validate_user("nobody@x.com", "Str0ng!Pass").await.unwrap().is_none());
    }
}
