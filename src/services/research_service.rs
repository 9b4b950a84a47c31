use futures::future::try_join_all;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::{analytics, Message};
use crate::api::dto::{CreateResearch, UpdateResearch};
use crate::database::models::{Dimension, NewResearch, Research, ResearchChanges, ResearchWithOwner};
use crate::database::{DatabaseError, ResearchFilter, Store};
use crate::error::ApiError;

/// Count, NPS average and the four demographic distributions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchStatistics {
    pub total_responses: i64,
    pub average_recommendation_score: f64,
    pub gender_identity_distribution: Value,
    pub age_range_distribution: Value,
    pub event_type_distribution: Value,
    pub transport_type_distribution: Value,
}

/// Aggregates over the rows `filter` selects, queried concurrently.
pub async fn summarize(store: &dyn Store, filter: &ResearchFilter) -> Result<ResearchStatistics, DatabaseError> {
    let distributions = try_join_all(
        Dimension::DEMOGRAPHIC
            .iter()
            .map(|dimension| store.count_research_by(filter, *dimension)),
    );
    let (totals, groups) = futures::try_join!(store.research_totals(filter), distributions)?;

    let [gender, age, event, transport] = Dimension::DEMOGRAPHIC;
    Ok(ResearchStatistics {
        total_responses: totals.count,
        average_recommendation_score: totals.average_recommendation_score.unwrap_or(0.0),
        gender_identity_distribution: analytics::distribution(gender, &groups[0]),
        age_range_distribution: analytics::distribution(age, &groups[1]),
        event_type_distribution: analytics::distribution(event, &groups[2]),
        transport_type_distribution: analytics::distribution(transport, &groups[3]),
    })
}

pub struct ResearchService {
    store: Arc<dyn Store>,
}

impl ResearchService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn require_user(&self, user_id: i64) -> Result<(), ApiError> {
        match self.store.find_user(user_id).await? {
            Some(_) => Ok(()),
            None => Err(ApiError::not_found("User not found")),
        }
    }

    pub async fn create_research(&self, create: CreateResearch) -> Result<Research, ApiError> {
        self.require_user(create.user_id).await?;
        let research = NewResearch {
            user_id: create.user_id,
            answers: create.answers,
        };
        Ok(self.store.create_research(research).await?)
    }

    pub async fn find_all_research(&self) -> Result<Vec<ResearchWithOwner>, ApiError> {
        Ok(self.store.list_research().await?)
    }

    pub async fn find_research_by_id(&self, id: i64) -> Result<ResearchWithOwner, ApiError> {
        self.store
            .find_research(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Research not found"))
    }

    pub async fn update_research(&self, id: i64, update: UpdateResearch) -> Result<Research, ApiError> {
        self.find_research_by_id(id).await?;
        if let Some(user_id) = update.user_id {
            self.require_user(user_id).await?;
        }

        let changes = ResearchChanges {
            user_id: update.user_id,
            answers: update.answers,
        };
        self.store
            .update_research(id, changes)
            .await?
            .ok_or_else(|| ApiError::not_found("Research not found"))
    }

    pub async fn delete_research(&self, id: i64) -> Result<Message, ApiError> {
        if !self.store.soft_delete_research(id).await? {
            return Err(ApiError::not_found("Research not found"));
        }
        Ok(Message::new("Research deleted successfully"))
    }

    pub async fn get_research_statistics(&self) -> Result<ResearchStatistics, ApiError> {
        Ok(summarize(self.store.as_ref(), &ResearchFilter::default()).await?)
    }
}
