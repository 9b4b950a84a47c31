use std::sync::Arc;

use super::Message;
use crate::api::dto::{CreateUserRole, UpdateUserRole};
use crate::database::models::UserRole;
use crate::database::Store;
use crate::error::ApiError;

pub struct UserRoleService {
    store: Arc<dyn Store>,
}

impl UserRoleService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn require_user(&self, user_id: i64) -> Result<(), ApiError> {
        match self.store.find_user(user_id).await? {
            Some(_) => Ok(()),
            None => Err(ApiError::not_found("User not found")),
        }
    }

    async fn require_role(&self, role_id: i64) -> Result<(), ApiError> {
        match self.store.find_role(role_id).await? {
            Some(_) => Ok(()),
            None => Err(ApiError::not_found("Role not found")),
        }
    }

    pub async fn create(&self, create: CreateUserRole) -> Result<UserRole, ApiError> {
        self.require_user(create.user_id).await?;
        self.require_role(create.role_id).await?;
        Ok(self.store.create_user_role(create.user_id, create.role_id).await?)
    }

    pub async fn find_user_role(&self, id: i64) -> Result<UserRole, ApiError> {
        self.store
            .find_user_role(id)
            .await?
            .ok_or_else(|| ApiError::not_found("User role not found"))
    }

    pub async fn list_user_roles(&self) -> Result<Vec<UserRole>, ApiError> {
        Ok(self.store.list_user_roles().await?)
    }

    /// Point the link at another role. Without a `roleId` the link is returned unchanged.
    pub async fn update_user_role(&self, id: i64, update: UpdateUserRole) -> Result<UserRole, ApiError> {
        let current = self.find_user_role(id).await?;
        let Some(role_id) = update.role_id else {
            return Ok(current);
        };
        self.require_role(role_id).await?;
        self.store
            .update_user_role(id, role_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User role not found"))
    }

    /// Re-point the caller's own active role link (the oldest one if several exist).
    pub async fn update_my_user_role(&self, user_id: i64, update: UpdateUserRole) -> Result<UserRole, ApiError> {
        let link = self
            .store
            .list_user_roles_for_user(user_id)
            .await?
            .into_iter()
            .min_by_key(|link| link.id)
            .ok_or_else(|| ApiError::not_found("User role not found"))?;
        self.update_user_role(link.id, update).await
    }

    pub async fn delete_user_role(&self, id: i64) -> Result<Message, ApiError> {
        if !self.store.soft_delete_user_role(id).await? {
            return Err(ApiError::not_found("User role not found"));
        }
        Ok(Message::new("User role deleted successfully"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::NewUser;
    use crate::database::MemoryStore;

    async fn with_patient() -> (Arc<MemoryStore>, UserRoleService, i64) {
        let store = Arc::new(MemoryStore::with_default_roles());
        let user = store
            .create_user_with_role(
                NewUser {
                    full_name: "Ana".to_string(),
                    email: "ana@x.com".to_string(),
                    password_hash: "hash".to_string(),
                },
                "PATIENT",
            )
            .await
            .unwrap();
        (store.clone(), UserRoleService::new(store), user.id)
    }

    #[tokio::test]
    async fn create_requires_active_user_and_role() {
        let (_, service, user_id) = with_patient().await;
        assert!(matches!(
            service.create(CreateUserRole { user_id: 99, role_id: 2 }).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            service.create(CreateUserRole { user_id, role_id: 99 }).await,
            Err(ApiError::NotFound(_))
        ));
        let link = service.create(CreateUserRole { user_id, role_id: 2 }).await.unwrap();
        assert_eq!(link.role_id, 2);
        assert_eq!(service.list_user_roles().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_mine_repoints_the_callers_link() {
        let (store, service, user_id) = with_patient().await;
        let updated = service
            .update_my_user_role(user_id, UpdateUserRole { role_id: Some(2) })
            .await
            .unwrap();
        assert_eq!(updated.user_id, user_id);

        let resolved = store.find_user_with_roles(user_id).await.unwrap().unwrap();
        assert!(resolved.has_role("ADMIN"));
        assert!(!resolved.has_role("PATIENT"));

        assert!(matches!(
            service.update_my_user_role(user_id, UpdateUserRole { role_id: Some(42) }).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            service.update_my_user_role(777, UpdateUserRole { role_id: Some(2) }).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn deleted_links_are_hidden() {
        let (_, service, _) = with_patient().await;
        let link = service.list_user_roles().await.unwrap().remove(0);
        let message = service.delete_user_role(link.id).await.unwrap();
        assert_eq!(message.message, "User role deleted successfully");
        assert!(matches!(service.find_user_role(link.id).await, Err(ApiError::NotFound(_))));
        assert!(service.list_user_roles().await.unwrap().is_empty());
    }
}
