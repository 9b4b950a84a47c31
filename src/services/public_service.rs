use std::sync::Arc;

use crate::api::dto::{CreatePreference, CreateResearch};
use crate::database::models::{NewResearch, PreferenceSubmission, Research};
use crate::database::Store;
use crate::error::ApiError;

/// Unauthenticated submissions. Payloads are validated at the edge; the
/// survey's `userId` only has to name an existing account row, which the
/// store enforces.
pub struct PublicService {
    store: Arc<dyn Store>,
}

impl PublicService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create_preference_submission(
        &self,
        create: CreatePreference,
    ) -> Result<PreferenceSubmission, ApiError> {
        Ok(self.store.create_preference_submission(create.preferences).await?)
    }

    pub async fn create_survey_response(&self, create: CreateResearch) -> Result<Research, ApiError> {
        let research = NewResearch {
            user_id: create.user_id,
            answers: create.answers,
        };
        Ok(self.store.create_research(research).await?)
    }
}
