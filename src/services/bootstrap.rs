// Startup provisioning: default roles and the optional administrator account.

use tracing::{info, warn};

use crate::auth;
use crate::config::BootstrapConfig;
use crate::database::models::role::{ADMIN, DEFAULT_ROLES};
use crate::database::models::{NewUser, UserProfile};
use crate::database::Store;
use crate::error::ApiError;

/// Create any default role that is missing. Returns the names created.
pub async fn ensure_default_roles(store: &dyn Store) -> Result<Vec<&'static str>, ApiError> {
    let mut created = Vec::new();
    for name in DEFAULT_ROLES {
        if store.find_role_by_name(name).await?.is_none() {
            store.create_role(name).await?;
            info!("Created missing role {}", name);
            created.push(*name);
        }
    }
    Ok(created)
}

/// Make sure the configured administrator exists and holds the ADMIN role.
/// Does nothing unless both email and password are configured.
pub async fn ensure_admin(store: &dyn Store, config: &BootstrapConfig) -> Result<Option<UserProfile>, ApiError> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(None);
    };

    if let Some(existing) = store.find_user_by_email(email).await? {
        let admin = store
            .find_role_by_name(ADMIN)
            .await?
            .ok_or_else(|| ApiError::conflict(format!("No role named '{}' was found", ADMIN)))?;
        let links = store.list_user_roles_for_user(existing.id).await?;
        if !links.iter().any(|link| link.role_id == admin.id) {
            store.create_user_role(existing.id, admin.id).await?;
            info!("Granted {} to existing user {}", ADMIN, existing.id);
        }
        return Ok(Some(existing.profile()));
    }

    if !crate::api::validation::is_strong_password(password) {
        warn!("ADMIN_PASSWORD does not meet the password policy applied to registrations and password changes");
    }

    let password_hash = auth::hash_password(password.clone()).await?;
    let user = store
        .create_user_with_role(
            NewUser {
                full_name: config.admin_name.clone(),
                email: email.clone(),
                password_hash,
            },
            ADMIN,
        )
        .await?;
    info!("Created bootstrap administrator {} ({})", user.id, user.email);
    Ok(Some(user.profile()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::dto::LoginUser;
    use crate::api::Validate;
    use crate::database::MemoryStore;
    use crate::services::AuthService;
    use std::sync::Arc;

    fn admin_config() -> BootstrapConfig {
        BootstrapConfig {
            admin_email: Some("root@x.com".to_string()),
            admin_password: Some("Adm1n!Pass".to_string()),
            admin_name: "Root".to_string(),
        }
    }

    #[tokio::test]
    async fn default_roles_are_created_once() {
        let store = MemoryStore::new();
        assert_eq!(ensure_default_roles(&store).await.unwrap(), vec!["PATIENT", "ADMIN"]);
        assert!(ensure_default_roles(&store).await.unwrap().is_empty());
        assert_eq!(store.list_roles().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn admin_is_created_with_admin_role_and_not_duplicated() {
        let store = MemoryStore::with_default_roles();
        let admin = ensure_admin(&store, &admin_config()).await.unwrap().unwrap();
        let again = ensure_admin(&store, &admin_config()).await.unwrap().unwrap();
        assert_eq!(admin, again);

        let resolved = store.find_user_with_roles(admin.id).await.unwrap().unwrap();
        assert!(resolved.has_role("ADMIN"));
        assert_eq!(store.user_row_count().await, 1);
    }

    #[tokio::test]
    async fn weak_admin_password_still_logs_in() {
        let store = Arc::new(MemoryStore::with_default_roles());
        let config = BootstrapConfig {
            admin_password: Some("admin123".to_string()),
            ..admin_config()
        };
        ensure_admin(store.as_ref(), &config).await.unwrap();

        let login = LoginUser {
            email: "root@x.com".to_string(),
            password: "admin123".to_string(),
        };
        login.validate().unwrap();
        let payload = AuthService::new(store).login(login).await.unwrap();
        assert_eq!(payload.user.email, "root@x.com");
    }

    #[tokio::test]
    async fn missing_settings_skip_bootstrap() {
        let store = MemoryStore::with_default_roles();
        let config = BootstrapConfig {
            admin_password: None,
            ..admin_config()
        };
        assert!(ensure_admin(&store, &config).await.unwrap().is_none());
        assert_eq!(store.user_row_count().await, 0);
    }
}
