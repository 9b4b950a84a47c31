use std::sync::Arc;

use super::Message;
use crate::api::dto::{CreateRole, UpdateRole};
use crate::database::models::Role;
use crate::database::Store;
use crate::error::ApiError;

pub struct RoleService {
    store: Arc<dyn Store>,
}

impl RoleService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create_role(&self, create: CreateRole) -> Result<Role, ApiError> {
        Ok(self.store.create_role(create.name.trim()).await?)
    }

    pub async fn update_role(&self, id: i64, update: UpdateRole) -> Result<Role, ApiError> {
        let current = self.find_role_by_id(id).await?;
        let Some(name) = update.name else {
            return Ok(current);
        };
        self.store
            .update_role(id, name.trim())
            .await?
            .ok_or_else(|| ApiError::not_found("Role not found"))
    }

    pub async fn find_role_by_id(&self, id: i64) -> Result<Role, ApiError> {
        self.store
            .find_role(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Role not found"))
    }

    /// Id of the active role called `name`. A missing role is a conflict
    /// with the expected configuration, not a missing resource.
    pub async fn find_role(&self, name: &str) -> Result<i64, ApiError> {
        self.store
            .find_role_by_name(name)
            .await?
            .map(|role| role.id)
            .ok_or_else(|| ApiError::conflict(format!("No role named '{}' was found", name)))
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, ApiError> {
        Ok(self.store.list_roles().await?)
    }

    pub async fn delete_role(&self, id: i64) -> Result<Message, ApiError> {
        if !self.store.soft_delete_role(id).await? {
            return Err(ApiError::not_found("Role not found"));
        }
        Ok(Message::new("Role deleted successfully"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    #[tokio::test]
    async fn find_role_resolves_seeded_names_and_conflicts_otherwise() {
        let service = RoleService::new(Arc::new(MemoryStore::with_default_roles()));
        assert_eq!(service.find_role("PATIENT").await.unwrap(), 1);
        assert_eq!(service.find_role("ADMIN").await.unwrap(), 2);
        assert!(matches!(service.find_role("DOCTOR").await, Err(ApiError::Conflict(_))));
    }

    #[tokio::test]
    async fn role_crud_respects_soft_delete() {
        let service = RoleService::new(Arc::new(MemoryStore::with_default_roles()));
        let doctor = service.create_role(CreateRole { name: " DOCTOR ".to_string() }).await.unwrap();
        assert_eq!(doctor.name, "DOCTOR");

        let renamed = service
            .update_role(doctor.id, UpdateRole { name: Some("NURSE".to_string()) })
            .await
            .unwrap();
        assert_eq!(renamed.name, "NURSE");
        let unchanged = service.update_role(doctor.id, UpdateRole::default()).await.unwrap();
        assert_eq!(unchanged.name, "NURSE");

        service.delete_role(doctor.id).await.unwrap();
        assert!(matches!(service.find_role_by_id(doctor.id).await, Err(ApiError::NotFound(_))));
        assert!(matches!(service.find_role("NURSE").await, Err(ApiError::Conflict(_))));
        assert_eq!(service.list_roles().await.unwrap().len(), 2);
        assert!(matches!(service.delete_role(doctor.id).await, Err(ApiError::NotFound(_))));
    }
}
