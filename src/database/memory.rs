use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::manager::DatabaseError;
use super::models::role::DEFAULT_ROLES;
use super::models::{
    Dashboard, DashboardChanges, Dimension, NewDashboard, NewResearch, NewUser, PreferenceSubmission, Research,
    ResearchChanges, ResearchOwner, ResearchWithOwner, Role, User, UserChanges, UserRole, UserWithRoles,
};
use super::store::{GroupCount, ResearchFilter, ResearchTotals, Store};

// Rows are never physically removed, so `len + 1` is a valid next id.
fn next_id<T>(rows: &[T]) -> i64 {
    rows.len() as i64 + 1
}

fn average(values: impl Iterator<Item = i32>) -> Option<f64> {
    let (sum, n) = values.fold((0i64, 0i64), |(sum, n), v| (sum + v as i64, n + 1));
    (n > 0).then(|| sum as f64 / n as f64)
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    roles: Vec<Role>,
    user_roles: Vec<UserRole>,
    research: Vec<Research>,
    dashboards: Vec<Dashboard>,
    preferences: Vec<PreferenceSubmission>,
}

impl Tables {
    fn active_user(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id && u.is_active())
    }

    /// Foreign keys point at rows, so soft-deleted users and roles still satisfy them.
    fn require_user_row(&self, id: i64, constraint: &str) -> Result<(), DatabaseError> {
        if self.users.iter().any(|u| u.id == id) {
            Ok(())
        } else {
            Err(DatabaseError::MissingReference(constraint.to_string()))
        }
    }

    fn require_role_row(&self, id: i64) -> Result<(), DatabaseError> {
        if self.roles.iter().any(|r| r.id == id) {
            Ok(())
        } else {
            Err(DatabaseError::MissingReference("user_roles_role_id_fkey".to_string()))
        }
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .iter()
            .any(|u| u.is_active() && u.email == email && Some(u.id) != except)
    }

    fn with_owner(&self, research: &Research) -> ResearchWithOwner {
        let user = self.users.iter().find(|u| u.id == research.user_id).map(|u| ResearchOwner {
            id: u.id,
            full_name: u.full_name.clone(),
            email: u.email.clone(),
        });
        ResearchWithOwner {
            research: research.clone(),
            user,
        }
    }
}

/// In-process `Store` with the same semantics as the Postgres backend.
/// Used for local development without a database and throughout the tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Empty store, without even the default roles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the default roles, like a freshly migrated database.
    pub fn with_default_roles() -> Self {
        let now = Utc::now();
        let roles = DEFAULT_ROLES
            .iter()
            .enumerate()
            .map(|(i, name)| Role {
                id: i as i64 + 1,
                name: name.to_string(),
                created_at: now,
                updated_at: now,
                deleted_at: None,
            })
            .collect();

        Self {
            tables: RwLock::new(Tables {
                roles,
                ..Default::default()
            }),
        }
    }

    /// Insert a research row with an explicit creation time. Skips the respondent check.
    pub async fn create_research_at(&self, research: NewResearch, created_at: DateTime<Utc>) -> Research {
        let mut tables = self.tables.write().await;
        Self::insert_research(&mut tables, research, created_at)
    }

    fn insert_research(tables: &mut Tables, research: NewResearch, created_at: DateTime<Utc>) -> Research {
        let answers = research.answers;
        let row = Research {
            id: next_id(&tables.research),
            user_id: research.user_id,
            gender_identity: answers.gender_identity,
            age_range: answers.age_range,
            event_type: answers.event_type,
            transport_type: answers.transport_type,
            recommendation_score: answers.recommendation_score,
            gate_findability: answers.gate_findability,
            highlight: answers.highlight,
            frustration: answers.frustration,
            next_vibe_score: answers.next_vibe_score,
            artist_wish: answers.artist_wish,
            created_at,
            updated_at: created_at,
            deleted_at: None,
        };
        tables.research.push(row.clone());
        row
    }

    /// Insert a preference submission with an explicit creation time.
    pub async fn create_preference_submission_at(
        &self,
        preferences: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> PreferenceSubmission {
        let mut tables = self.tables.write().await;
        let row = PreferenceSubmission {
            id: next_id(&tables.preferences),
            preferences,
            created_at,
        };
        tables.preferences.push(row.clone());
        row
    }

    /// Every role link ever created for `user_id`, deleted ones included.
    pub async fn user_role_history(&self, user_id: i64) -> Vec<UserRole> {
        let tables = self.tables.read().await;
        tables
            .user_roles
            .iter()
            .filter(|ur| ur.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Number of user rows ever written, deleted ones included.
    pub async fn user_row_count(&self) -> usize {
        self.tables.read().await.users.len()
    }

    /// Number of dashboard rows for a period, deleted ones included.
    pub async fn dashboard_row_count(&self, period: &str) -> usize {
        let tables = self.tables.read().await;
        tables.dashboards.iter().filter(|d| d.period == period).count()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        Ok(self.tables.read().await.active_user(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.is_active() && u.email == email).cloned())
    }

    async fn find_user_with_roles(&self, id: i64) -> Result<Option<UserWithRoles>, DatabaseError> {
        let tables = self.tables.read().await;
        let Some(user) = tables.active_user(id) else {
            return Ok(None);
        };

        let mut roles: Vec<Role> = tables
            .roles
            .iter()
            .filter(|role| role.deleted_at.is_none())
            .filter(|role| {
                tables
                    .user_roles
                    .iter()
                    .any(|ur| ur.user_id == id && ur.role_id == role.id && ur.deleted_at.is_none())
            })
            .cloned()
            .collect();
        roles.sort_by_key(|role| role.id);

        Ok(Some(UserWithRoles {
            profile: user.profile(),
            roles,
        }))
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().filter(|u| u.is_active()).cloned().collect())
    }

    async fn create_user_with_role(&self, user: NewUser, role_name: &str) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;

        if tables.email_taken(&user.email, None) {
            return Err(DatabaseError::Conflict("users_active_email_key".to_string()));
        }
        let role_id = tables
            .roles
            .iter()
            .find(|role| role.name == role_name && role.deleted_at.is_none())
            .map(|role| role.id)
            .ok_or_else(|| DatabaseError::MissingRole(role_name.to_string()))?;

        let now = Utc::now();
        let created = User {
            id: next_id(&tables.users),
            full_name: user.full_name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let link = UserRole {
            id: next_id(&tables.user_roles),
            user_id: created.id,
            role_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.users.push(created.clone());
        tables.user_roles.push(link);
        Ok(created)
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<Option<User>, DatabaseError> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &changes.email {
            if tables.email_taken(email, Some(id)) {
                return Err(DatabaseError::Conflict("users_active_email_key".to_string()));
            }
        }
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id && u.deleted_at.is_none()) else {
            return Ok(None);
        };
        if let Some(full_name) = changes.full_name {
            user.full_name = full_name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn soft_delete_user(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id && u.deleted_at.is_none()) else {
            return Ok(false);
        };
        user.deleted_at = Some(now);
        user.updated_at = now;
        for link in tables
            .user_roles
            .iter_mut()
            .filter(|ur| ur.user_id == id && ur.deleted_at.is_none())
        {
            link.deleted_at = Some(now);
            link.updated_at = now;
        }
        Ok(true)
    }

    async fn create_role(&self, name: &str) -> Result<Role, DatabaseError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let role = Role {
            id: next_id(&tables.roles),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.roles.push(role.clone());
        Ok(role)
    }

    async fn find_role(&self, id: i64) -> Result<Option<Role>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.roles.iter().find(|r| r.id == id && r.deleted_at.is_none()).cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.roles.iter().find(|r| r.name == name && r.deleted_at.is_none()).cloned())
    }

    async fn list_roles(&self) -> Result<Vec<Role>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.roles.iter().filter(|r| r.deleted_at.is_none()).cloned().collect())
    }

    async fn update_role(&self, id: i64, name: &str) -> Result<Option<Role>, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .roles
            .iter_mut()
            .find(|r| r.id == id && r.deleted_at.is_none())
            .map(|role| {
                role.name = name.to_string();
                role.updated_at = Utc::now();
                role.clone()
            }))
    }

    async fn soft_delete_role(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .roles
            .iter_mut()
            .find(|r| r.id == id && r.deleted_at.is_none())
            .map(|role| {
                let now = Utc::now();
                role.deleted_at = Some(now);
                role.updated_at = now;
            })
            .is_some())
    }

    async fn create_user_role(&self, user_id: i64, role_id: i64) -> Result<UserRole, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.require_user_row(user_id, "user_roles_user_id_fkey")?;
        tables.require_role_row(role_id)?;
        let now = Utc::now();
        let link = UserRole {
            id: next_id(&tables.user_roles),
            user_id,
            role_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.user_roles.push(link.clone());
        Ok(link)
    }

    async fn find_user_role(&self, id: i64) -> Result<Option<UserRole>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .user_roles
            .iter()
            .find(|ur| ur.id == id && ur.deleted_at.is_none())
            .cloned())
    }

    async fn list_user_roles(&self) -> Result<Vec<UserRole>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.user_roles.iter().filter(|ur| ur.deleted_at.is_none()).cloned().collect())
    }

    async fn list_user_roles_for_user(&self, user_id: i64) -> Result<Vec<UserRole>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .user_roles
            .iter()
            .filter(|ur| ur.user_id == user_id && ur.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn update_user_role(&self, id: i64, role_id: i64) -> Result<Option<UserRole>, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.require_role_row(role_id)?;
        Ok(tables
            .user_roles
            .iter_mut()
            .find(|ur| ur.id == id && ur.deleted_at.is_none())
            .map(|link| {
                link.role_id = role_id;
                link.updated_at = Utc::now();
                link.clone()
            }))
    }

    async fn soft_delete_user_role(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .user_roles
            .iter_mut()
            .find(|ur| ur.id == id && ur.deleted_at.is_none())
            .map(|link| {
                let now = Utc::now();
                link.deleted_at = Some(now);
                link.updated_at = now;
            })
            .is_some())
    }

    async fn create_research(&self, research: NewResearch) -> Result<Research, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.require_user_row(research.user_id, "research_user_id_fkey")?;
        Ok(Self::insert_research(&mut tables, research, Utc::now()))
    }

    async fn find_research(&self, id: i64) -> Result<Option<ResearchWithOwner>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .research
            .iter()
            .find(|r| r.id == id && r.deleted_at.is_none())
            .map(|r| tables.with_owner(r)))
    }

    async fn list_research(&self) -> Result<Vec<ResearchWithOwner>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .research
            .iter()
            .filter(|r| r.deleted_at.is_none())
            .map(|r| tables.with_owner(r))
            .collect())
    }

    async fn update_research(&self, id: i64, changes: ResearchChanges) -> Result<Option<Research>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let exists = tables.research.iter().any(|r| r.id == id && r.deleted_at.is_none());
        if let (true, Some(user_id)) = (exists, changes.user_id) {
            tables.require_user_row(user_id, "research_user_id_fkey")?;
        }
        Ok(tables
            .research
            .iter_mut()
            .find(|r| r.id == id && r.deleted_at.is_none())
            .map(|research| {
                research.apply(&changes);
                research.updated_at = Utc::now();
                research.clone()
            }))
    }

    async fn soft_delete_research(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .research
            .iter_mut()
            .find(|r| r.id == id && r.deleted_at.is_none())
            .map(|research| {
                let now = Utc::now();
                research.deleted_at = Some(now);
                research.updated_at = now;
            })
            .is_some())
    }

    async fn research_totals(&self, filter: &ResearchFilter) -> Result<ResearchTotals, DatabaseError> {
        let tables = self.tables.read().await;
        let rows: Vec<&Research> = tables.research.iter().filter(|r| filter.matches(r)).collect();
        Ok(ResearchTotals {
            count: rows.len() as i64,
            average_recommendation_score: average(rows.iter().filter_map(|r| r.recommendation_score)),
            average_next_vibe_score: average(rows.iter().filter_map(|r| r.next_vibe_score)),
        })
    }

    async fn count_research_by(
        &self,
        filter: &ResearchFilter,
        dimension: Dimension,
    ) -> Result<Vec<GroupCount>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut answered: BTreeMap<&'static str, i64> = BTreeMap::new();
        let mut unanswered = 0i64;

        for research in tables.research.iter().filter(|r| filter.matches(r)) {
            match research.answer(dimension) {
                Some(value) => *answered.entry(value).or_insert(0) += 1,
                None => unanswered += 1,
            }
        }

        let mut groups: Vec<GroupCount> = answered
            .into_iter()
            .map(|(value, count)| GroupCount {
                value: Some(value.to_string()),
                count,
            })
            .collect();
        if unanswered > 0 {
            groups.push(GroupCount {
                value: None,
                count: unanswered,
            });
        }
        Ok(groups)
    }

    async fn create_dashboard(&self, dashboard: NewDashboard) -> Result<Dashboard, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.dashboards.iter().any(|d| d.period == dashboard.period) {
            return Err(DatabaseError::Conflict("dashboards_period_key".to_string()));
        }
        let now = Utc::now();
        let row = Dashboard {
            id: next_id(&tables.dashboards),
            period: dashboard.period,
            total_responses: dashboard.total_responses,
            average_recommendation_score: dashboard.average_recommendation_score,
            gender_identity_distribution: dashboard.gender_identity_distribution,
            age_range_distribution: dashboard.age_range_distribution,
            event_type_distribution: dashboard.event_type_distribution,
            transport_type_distribution: dashboard.transport_type_distribution,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.dashboards.push(row.clone());
        Ok(row)
    }

    async fn find_dashboard(&self, id: i64) -> Result<Option<Dashboard>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .dashboards
            .iter()
            .find(|d| d.id == id && d.deleted_at.is_none())
            .cloned())
    }

    async fn find_dashboard_by_period(&self, period: &str) -> Result<Option<Dashboard>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .dashboards
            .iter()
            .find(|d| d.period == period && d.deleted_at.is_none())
            .cloned())
    }

    async fn list_dashboards(&self) -> Result<Vec<Dashboard>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut dashboards: Vec<Dashboard> = tables
            .dashboards
            .iter()
            .filter(|d| d.deleted_at.is_none())
            .cloned()
            .collect();
        dashboards.sort_by(|a, b| b.period.cmp(&a.period));
        Ok(dashboards)
    }

    async fn update_dashboard(&self, id: i64, changes: DashboardChanges) -> Result<Option<Dashboard>, DatabaseError> {
        let mut tables = self.tables.write().await;
        if let Some(period) = &changes.period {
            if tables.dashboards.iter().any(|d| &d.period == period && d.id != id) {
                return Err(DatabaseError::Conflict("dashboards_period_key".to_string()));
            }
        }
        Ok(tables
            .dashboards
            .iter_mut()
            .find(|d| d.id == id && d.deleted_at.is_none())
            .map(|dashboard| {
                dashboard.apply(&changes);
                dashboard.updated_at = Utc::now();
                dashboard.clone()
            }))
    }

    async fn soft_delete_dashboard(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .dashboards
            .iter_mut()
            .find(|d| d.id == id && d.deleted_at.is_none())
            .map(|dashboard| {
                let now = Utc::now();
                dashboard.deleted_at = Some(now);
                dashboard.updated_at = now;
            })
            .is_some())
    }

    async fn upsert_dashboard(&self, dashboard: NewDashboard) -> Result<Dashboard, DatabaseError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        if let Some(existing) = tables.dashboards.iter_mut().find(|d| d.period == dashboard.period) {
            existing.total_responses = dashboard.total_responses;
            existing.average_recommendation_score = dashboard.average_recommendation_score;
            existing.gender_identity_distribution = dashboard.gender_identity_distribution;
            existing.age_range_distribution = dashboard.age_range_distribution;
            existing.event_type_distribution = dashboard.event_type_distribution;
            existing.transport_type_distribution = dashboard.transport_type_distribution;
            existing.updated_at = now;
            existing.deleted_at = None;
            return Ok(existing.clone());
        }

        let row = Dashboard {
            id: next_id(&tables.dashboards),
            period: dashboard.period,
            total_responses: dashboard.total_responses,
            average_recommendation_score: dashboard.average_recommendation_score,
            gender_identity_distribution: dashboard.gender_identity_distribution,
            age_range_distribution: dashboard.age_range_distribution,
            event_type_distribution: dashboard.event_type_distribution,
            transport_type_distribution: dashboard.transport_type_distribution,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.dashboards.push(row.clone());
        Ok(row)
    }

    async fn create_preference_submission(&self, preferences: Vec<String>) -> Result<PreferenceSubmission, DatabaseError> {
        Ok(self.create_preference_submission_at(preferences, Utc::now()).await)
    }

    async fn list_preference_submissions(
        &self,
        created_from: Option<DateTime<Utc>>,
        created_before: Option<DateTime<Utc>>,
    ) -> Result<Vec<PreferenceSubmission>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<PreferenceSubmission> = tables
            .preferences
            .iter()
            .filter(|p| created_from.map_or(true, |from| p.created_at >= from))
            .filter(|p| created_before.map_or(true, |before| p.created_at < before))
            .cloned()
            .collect();
        rows.sort_by_key(|p| (p.created_at, p.id));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{AgeRange, GenderIdentity, SurveyAnswers};
    use chrono::TimeZone;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            full_name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    fn survey(user_id: i64, gender: Option<GenderIdentity>, score: Option<i32>) -> NewResearch {
        NewResearch {
            user_id,
            answers: SurveyAnswers {
                gender_identity: gender,
                recommendation_score: score,
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn registration_without_role_writes_nothing() {
        let store = MemoryStore::new();
        let err = store.create_user_with_role(new_user("a@x.com"), "PATIENT").await.unwrap_err();
        assert!(matches!(err, DatabaseError::MissingRole(ref name) if name == "PATIENT"));
        assert_eq!(store.user_row_count().await, 0);
    }

    #[tokio::test]
    async fn email_is_reusable_after_soft_delete() {
        let store = MemoryStore::with_default_roles();
        let first = store.create_user_with_role(new_user("a@x.com"), "PATIENT").await.unwrap();
        assert!(matches!(
            store.create_user_with_role(new_user("a@x.com"), "PATIENT").await,
            Err(DatabaseError::Conflict(_))
        ));

        assert!(store.soft_delete_user(first.id).await.unwrap());
        let second = store.create_user_with_role(new_user("a@x.com"), "PATIENT").await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn deleted_users_do_not_resolve_with_roles() {
        let store = MemoryStore::with_default_roles();
        let user = store.create_user_with_role(new_user("a@x.com"), "PATIENT").await.unwrap();
        let resolved = store.find_user_with_roles(user.id).await.unwrap().unwrap();
        assert!(resolved.has_role("PATIENT"));

        store.soft_delete_user(user.id).await.unwrap();
        assert!(store.find_user_with_roles(user.id).await.unwrap().is_none());
        assert!(store
            .user_role_history(user.id)
            .await
            .iter()
            .all(|link| link.deleted_at.is_some()));
    }

    #[tokio::test]
    async fn research_and_links_require_existing_rows() {
        let store = MemoryStore::with_default_roles();
        assert!(matches!(
            store.create_research(survey(42, None, Some(5))).await,
            Err(DatabaseError::MissingReference(ref c)) if c == "research_user_id_fkey"
        ));
        assert!(matches!(store.create_user_role(42, 1).await, Err(DatabaseError::MissingReference(_))));

        let user = store.create_user_with_role(new_user("a@x.com"), "PATIENT").await.unwrap();
        assert!(matches!(store.create_user_role(user.id, 99).await, Err(DatabaseError::MissingReference(_))));

        // Soft-deleted respondents still satisfy the reference.
        store.soft_delete_user(user.id).await.unwrap();
        let research = store.create_research(survey(user.id, None, Some(5))).await.unwrap();
        let moved = store
            .update_research(research.id, ResearchChanges { user_id: Some(42), ..Default::default() })
            .await;
        assert!(matches!(moved, Err(DatabaseError::MissingReference(_))));
    }

    #[tokio::test]
    async fn grouped_counts_put_null_group_last() {
        let store = MemoryStore::with_default_roles();
        store.create_user_with_role(new_user("a@x.com"), "PATIENT").await.unwrap();
        store.create_research(survey(1, Some(GenderIdentity::CisgenderWoman), Some(10))).await.unwrap();
        store.create_research(survey(1, None, Some(6))).await.unwrap();
        store.create_research(survey(1, Some(GenderIdentity::CisgenderMan), None)).await.unwrap();
        store.create_research(survey(1, Some(GenderIdentity::CisgenderWoman), Some(8))).await.unwrap();

        let groups = store
            .count_research_by(&ResearchFilter::default(), Dimension::GenderIdentity)
            .await
            .unwrap();
        assert_eq!(
            groups,
            vec![
                GroupCount { value: Some("CISGENDER_MAN".to_string()), count: 1 },
                GroupCount { value: Some("CISGENDER_WOMAN".to_string()), count: 2 },
                GroupCount { value: None, count: 1 },
            ]
        );

        let totals = store.research_totals(&ResearchFilter::default()).await.unwrap();
        assert_eq!(totals.count, 4);
        assert_eq!(totals.average_recommendation_score, Some(8.0));
        assert_eq!(totals.average_next_vibe_score, None);
    }

    #[tokio::test]
    async fn filters_respect_date_bounds_and_deletion() {
        let store = MemoryStore::with_default_roles();
        let march = Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap();
        let april = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let mut answers = survey(1, None, Some(5));
        answers.answers.age_range = Some(AgeRange::Over45);
        store.create_research_at(answers.clone(), march).await;
        let doomed = store.create_research_at(answers.clone(), april).await;
        store.create_research_at(answers, april).await;
        store.soft_delete_research(doomed.id).await.unwrap();

        let filter = ResearchFilter::between(april, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
        assert_eq!(store.research_totals(&filter).await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn upsert_revives_and_overwrites_by_period() {
        let store = MemoryStore::new();
        let created = store.create_dashboard(NewDashboard { period: "2024-05".to_string(), ..Default::default() }).await.unwrap();
        store.soft_delete_dashboard(created.id).await.unwrap();
        assert!(matches!(
            store.create_dashboard(NewDashboard { period: "2024-05".to_string(), ..Default::default() }).await,
            Err(DatabaseError::Conflict(_))
        ));

        let regenerated = store
            .upsert_dashboard(NewDashboard {
                period: "2024-05".to_string(),
                total_responses: 3,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(regenerated.id, created.id);
        assert_eq!(regenerated.total_responses, 3);
        assert!(regenerated.deleted_at.is_none());
        assert_eq!(store.dashboard_row_count("2024-05").await, 1);
    }
}
