use std::sync::Arc;
use tracing::info;

use super::Message;
use crate::api::dto::UpdateUser;
use crate::auth;
use crate::database::models::{User, UserChanges, UserProfile, UserWithRoles};
use crate::database::Store;
use crate::error::ApiError;

pub struct UserService {
    store: Arc<dyn Store>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Apply a partial profile update. A changed email must not belong to
    /// another active user; a new password is re-hashed.
    pub async fn update_user(&self, user_id: i64, update: UpdateUser) -> Result<UserProfile, ApiError> {
        self.find_user_by_id(user_id).await?;

        if let Some(email) = &update.email {
            if let Some(other) = self.store.find_user_by_email(email).await? {
                if other.id != user_id {
                    return Err(ApiError::conflict("Email is already registered to another user"));
                }
            }
        }

        let password_hash = match update.password {
            Some(raw) => Some(auth::hash_password(raw).await?),
            None => None,
        };

        let changes = UserChanges {
            full_name: update.full_name,
            email: update.email,
            password_hash,
        };

        let user = self
            .store
            .update_user(user_id, changes)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        Ok(user.profile())
    }

    pub async fn find_user_by_id(&self, user_id: i64) -> Result<UserProfile, ApiError> {
        self.store
            .find_user(user_id)
            .await?
            .map(|user| user.profile())
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    /// Soft-delete the account together with its role links.
    pub async fn delete_my_account(&self, user_id: i64) -> Result<Message, ApiError> {
        if !self.store.soft_delete_user(user_id).await? {
            return Err(ApiError::not_found("User not found"));
        }
        info!("User {} deleted their account", user_id);
        Ok(Message::new("User deleted successfully"))
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        Ok(self.store.list_users().await?)
    }

    /// Active user plus active roles, as resolved for each bearer token.
    pub async fn find_by_id_with_roles(&self, user_id: i64) -> Result<UserWithRoles, ApiError> {
        self.store
            .find_user_with_roles(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    /// Active user by email, password hash included.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        Ok(self.store.find_user_by_email(email).await?)
    }
}
