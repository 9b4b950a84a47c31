use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::manager::DatabaseError;
use super::models::{
    AgeRange, Dashboard, DashboardChanges, Dimension, EventType, GenderIdentity, NewDashboard, NewResearch, NewUser,
    PreferenceSubmission, Research, ResearchChanges, ResearchWithOwner, Role, User, UserChanges, UserRole,
    UserWithRoles,
};

/// Predicate over non-deleted research rows used by every aggregate query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResearchFilter {
    /// Inclusive lower bound on `created_at`.
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub created_before: Option<DateTime<Utc>>,
    pub gender_identity: Option<GenderIdentity>,
    pub age_range: Option<AgeRange>,
    pub event_type: Option<EventType>,
}

impl ResearchFilter {
    pub fn between(created_from: DateTime<Utc>, created_before: DateTime<Utc>) -> Self {
        Self {
            created_from: Some(created_from),
            created_before: Some(created_before),
            ..Default::default()
        }
    }

    pub fn matches(&self, research: &Research) -> bool {
        research.deleted_at.is_none()
            && self.created_from.map_or(true, |from| research.created_at >= from)
            && self.created_before.map_or(true, |before| research.created_at < before)
            && self.gender_identity.map_or(true, |g| research.gender_identity == Some(g))
            && self.age_range.map_or(true, |a| research.age_range == Some(a))
            && self.event_type.map_or(true, |e| research.event_type == Some(e))
    }
}

/// Count and score averages over the rows a filter selects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResearchTotals {
    pub count: i64,
    pub average_recommendation_score: Option<f64>,
    pub average_next_vibe_score: Option<f64>,
}

/// One row of a grouped count. `value` is `None` for unanswered questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub value: Option<String>,
    pub count: i64,
}

/// Persistence gateway over the six survey entities.
///
/// Unless a method says otherwise, lookups ignore soft-deleted rows and
/// `Ok(None)` / `Ok(false)` mean "no active row with that id".
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;

    // Users
    async fn find_user(&self, id: i64) -> Result<Option<User>, DatabaseError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;
    /// Active user with its active roles.
    async fn find_user_with_roles(&self, id: i64) -> Result<Option<UserWithRoles>, DatabaseError>;
    async fn list_users(&self) -> Result<Vec<User>, DatabaseError>;
    /// Inserts the user and links it to `role_name` atomically. Fails with
    /// `MissingRole` (and writes nothing) when the role does not exist.
    async fn create_user_with_role(&self, user: NewUser, role_name: &str) -> Result<User, DatabaseError>;
    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<Option<User>, DatabaseError>;
    /// Soft-deletes the user and every role link it owns in one transaction.
    async fn soft_delete_user(&self, id: i64) -> Result<bool, DatabaseError>;

    // Roles
    async fn create_role(&self, name: &str) -> Result<Role, DatabaseError>;
    async fn find_role(&self, id: i64) -> Result<Option<Role>, DatabaseError>;
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, DatabaseError>;
    async fn list_roles(&self) -> Result<Vec<Role>, DatabaseError>;
    async fn update_role(&self, id: i64, name: &str) -> Result<Option<Role>, DatabaseError>;
    async fn soft_delete_role(&self, id: i64) -> Result<bool, DatabaseError>;

    // User roles
    async fn create_user_role(&self, user_id: i64, role_id: i64) -> Result<UserRole, DatabaseError>;
    async fn find_user_role(&self, id: i64) -> Result<Option<UserRole>, DatabaseError>;
    async fn list_user_roles(&self) -> Result<Vec<UserRole>, DatabaseError>;
    async fn list_user_roles_for_user(&self, user_id: i64) -> Result<Vec<UserRole>, DatabaseError>;
    async fn update_user_role(&self, id: i64, role_id: i64) -> Result<Option<UserRole>, DatabaseError>;
    async fn soft_delete_user_role(&self, id: i64) -> Result<bool, DatabaseError>;

    // Research
    async fn create_research(&self, research: NewResearch) -> Result<Research, DatabaseError>;
    async fn find_research(&self, id: i64) -> Result<Option<ResearchWithOwner>, DatabaseError>;
    async fn list_research(&self) -> Result<Vec<ResearchWithOwner>, DatabaseError>;
    async fn update_research(&self, id: i64, changes: ResearchChanges) -> Result<Option<Research>, DatabaseError>;
    async fn soft_delete_research(&self, id: i64) -> Result<bool, DatabaseError>;
    async fn research_totals(&self, filter: &ResearchFilter) -> Result<ResearchTotals, DatabaseError>;
    /// Grouped counts for one dimension, ordered by value with the null group last.
    async fn count_research_by(
        &self,
        filter: &ResearchFilter,
        dimension: Dimension,
    ) -> Result<Vec<GroupCount>, DatabaseError>;

    // Dashboards
    /// Fails with `Conflict` when any row, deleted or not, holds the period.
    async fn create_dashboard(&self, dashboard: NewDashboard) -> Result<Dashboard, DatabaseError>;
    async fn find_dashboard(&self, id: i64) -> Result<Option<Dashboard>, DatabaseError>;
    async fn find_dashboard_by_period(&self, period: &str) -> Result<Option<Dashboard>, DatabaseError>;
    /// Ordered by period, newest first.
    async fn list_dashboards(&self) -> Result<Vec<Dashboard>, DatabaseError>;
    async fn update_dashboard(&self, id: i64, changes: DashboardChanges) -> Result<Option<Dashboard>, DatabaseError>;
    async fn soft_delete_dashboard(&self, id: i64) -> Result<bool, DatabaseError>;
    /// Creates the row for `dashboard.period` or overwrites the existing one,
    /// reviving it if it had been soft-deleted.
    async fn upsert_dashboard(&self, dashboard: NewDashboard) -> Result<Dashboard, DatabaseError>;

    // Preference submissions
    async fn create_preference_submission(&self, preferences: Vec<String>) -> Result<PreferenceSubmission, DatabaseError>;
    /// Submissions with `created_from <= created_at < created_before`, oldest first.
    async fn list_preference_submissions(
        &self,
        created_from: Option<DateTime<Utc>>,
        created_before: Option<DateTime<Utc>>,
    ) -> Result<Vec<PreferenceSubmission>, DatabaseError>;
}
