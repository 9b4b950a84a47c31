use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{
    Dashboard, DashboardChanges, Dimension, NewDashboard, NewResearch, NewUser, PreferenceSubmission, Research,
    ResearchChanges, ResearchOwner, ResearchWithOwner, Role, User, UserChanges, UserRole, UserWithRoles,
};
use super::store::{GroupCount, ResearchFilter, ResearchTotals, Store};

const USER_COLUMNS: &str = "id, full_name, email, password_hash, created_at, updated_at, deleted_at";
const ROLE_COLUMNS: &str = "id, name, created_at, updated_at, deleted_at";
const USER_ROLE_COLUMNS: &str = "id, user_id, role_id, created_at, updated_at, deleted_at";
const RESEARCH_COLUMNS: &str = "id, user_id, gender_identity, age_range, event_type, transport_type, \
     recommendation_score, gate_findability, highlight, frustration, next_vibe_score, artist_wish, \
     created_at, updated_at, deleted_at";
const DASHBOARD_COLUMNS: &str = "id, period, total_responses, average_recommendation_score, \
     gender_identity_distribution, age_range_distribution, event_type_distribution, \
     transport_type_distribution, created_at, updated_at, deleted_at";

/// Research row joined with the respondent's public fields.
#[derive(FromRow)]
struct ResearchOwnerRow {
    #[sqlx(flatten)]
    research: Research,
    owner_id: Option<i64>,
    owner_full_name: Option<String>,
    owner_email: Option<String>,
}

impl From<ResearchOwnerRow> for ResearchWithOwner {
    fn from(row: ResearchOwnerRow) -> Self {
        let user = match (row.owner_id, row.owner_full_name, row.owner_email) {
            (Some(id), Some(full_name), Some(email)) => Some(ResearchOwner { id, full_name, email }),
            _ => None,
        };
        ResearchWithOwner {
            research: row.research,
            user,
        }
    }
}

/// `Store` backed by Postgres through a shared sqlx pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn research_with_owner_sql(condition: &str) -> String {
        format!(
            "SELECT r.*, u.id AS owner_id, u.full_name AS owner_full_name, u.email AS owner_email \
             FROM research r LEFT JOIN users u ON u.id = r.user_id \
             WHERE r.deleted_at IS NULL {} ORDER BY r.id",
            condition
        )
    }
}

fn push_research_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ResearchFilter) {
    builder.push(" WHERE deleted_at IS NULL");
    if let Some(from) = filter.created_from {
        builder.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(before) = filter.created_before {
        builder.push(" AND created_at < ").push_bind(before);
    }
    if let Some(gender_identity) = filter.gender_identity {
        builder.push(" AND gender_identity = ").push_bind(gender_identity);
    }
    if let Some(age_range) = filter.age_range {
        builder.push(" AND age_range = ").push_bind(age_range);
    }
    if let Some(event_type) = filter.event_type {
        builder.push(" AND event_type = ").push_bind(event_type);
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");
        Ok(sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND deleted_at IS NULL");
        Ok(sqlx::query_as(&sql).bind(email).fetch_optional(&self.pool).await?)
    }

    async fn find_user_with_roles(&self, id: i64) -> Result<Option<UserWithRoles>, DatabaseError> {
        let Some(user) = self.find_user(id).await? else {
            return Ok(None);
        };

        let roles: Vec<Role> = sqlx::query_as(
            "SELECT DISTINCT r.id, r.name, r.created_at, r.updated_at, r.deleted_at \
             FROM roles r JOIN user_roles ur ON ur.role_id = r.id \
             WHERE ur.user_id = $1 AND ur.deleted_at IS NULL AND r.deleted_at IS NULL \
             ORDER BY r.id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(UserWithRoles {
            profile: user.profile(),
            roles,
        }))
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NULL ORDER BY id");
        Ok(sqlx::query_as(&sql).fetch_all(&self.pool).await?)
    }

    async fn create_user_with_role(&self, user: NewUser, role_name: &str) -> Result<User, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO users (full_name, email, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        );
        let created: User = sqlx::query_as(&sql)
            .bind(&user.full_name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&mut *tx)
            .await
            .map_err(DatabaseError::classify)?;

        let role_id: Option<i64> =
            sqlx::query_scalar("SELECT id FROM roles WHERE name = $1 AND deleted_at IS NULL ORDER BY id LIMIT 1")
                .bind(role_name)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(role_id) = role_id else {
            tx.rollback().await?;
            return Err(DatabaseError::MissingRole(role_name.to_string()));
        };

        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
            .bind(created.id)
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<Option<User>, DatabaseError> {
        let sql = format!(
            "UPDATE users SET \
                 full_name = COALESCE($2, full_name), \
                 email = COALESCE($3, email), \
                 password_hash = COALESCE($4, password_hash), \
                 updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as(&sql)
            .bind(id)
            .bind(changes.full_name)
            .bind(changes.email)
            .bind(changes.password_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::classify)
    }

    async fn soft_delete_user(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(
            "UPDATE users SET deleted_at = now(), updated_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE user_roles SET deleted_at = now(), updated_at = now() WHERE user_id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn create_role(&self, name: &str) -> Result<Role, DatabaseError> {
        let sql = format!("INSERT INTO roles (name) VALUES ($1) RETURNING {ROLE_COLUMNS}");
        Ok(sqlx::query_as(&sql).bind(name).fetch_one(&self.pool).await?)
    }

    async fn find_role(&self, id: i64) -> Result<Option<Role>, DatabaseError> {
        let sql = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1 AND deleted_at IS NULL");
        Ok(sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, DatabaseError> {
        let sql = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE name = $1 AND deleted_at IS NULL ORDER BY id LIMIT 1");
        Ok(sqlx::query_as(&sql).bind(name).fetch_optional(&self.pool).await?)
    }

    async fn list_roles(&self) -> Result<Vec<Role>, DatabaseError> {
        let sql = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE deleted_at IS NULL ORDER BY id");
        Ok(sqlx::query_as(&sql).fetch_all(&self.pool).await?)
    }

    async fn update_role(&self, id: i64, name: &str) -> Result<Option<Role>, DatabaseError> {
        let sql = format!(
            "UPDATE roles SET name = $2, updated_at = now() WHERE id = $1 AND deleted_at IS NULL RETURNING {ROLE_COLUMNS}"
        );
        Ok(sqlx::query_as(&sql).bind(id).bind(name).fetch_optional(&self.pool).await?)
    }

    async fn soft_delete_role(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE roles SET deleted_at = now(), updated_at = now() WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_user_role(&self, user_id: i64, role_id: i64) -> Result<UserRole, DatabaseError> {
        let sql = format!("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) RETURNING {USER_ROLE_COLUMNS}");
        sqlx::query_as(&sql)
            .bind(user_id)
            .bind(role_id)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::classify)
    }

    async fn find_user_role(&self, id: i64) -> Result<Option<UserRole>, DatabaseError> {
        let sql = format!("SELECT {USER_ROLE_COLUMNS} FROM user_roles WHERE id = $1 AND deleted_at IS NULL");
        Ok(sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn list_user_roles(&self) -> Result<Vec<UserRole>, DatabaseError> {
        let sql = format!("SELECT {USER_ROLE_COLUMNS} FROM user_roles WHERE deleted_at IS NULL ORDER BY id");
        Ok(sqlx::query_as(&sql).fetch_all(&self.pool).await?)
    }

    async fn list_user_roles_for_user(&self, user_id: i64) -> Result<Vec<UserRole>, DatabaseError> {
        let sql = format!(
            "SELECT {USER_ROLE_COLUMNS} FROM user_roles WHERE user_id = $1 AND deleted_at IS NULL ORDER BY id"
        );
        Ok(sqlx::query_as(&sql).bind(user_id).fetch_all(&self.pool).await?)
    }

    async fn update_user_role(&self, id: i64, role_id: i64) -> Result<Option<UserRole>, DatabaseError> {
        let sql = format!(
            "UPDATE user_roles SET role_id = $2, updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {USER_ROLE_COLUMNS}"
        );
        sqlx::query_as(&sql)
            .bind(id)
            .bind(role_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::classify)
    }

    async fn soft_delete_user_role(&self, id: i64) -> Result<bool, DatabaseError> {
        let result =
            sqlx::query("UPDATE user_roles SET deleted_at = now(), updated_at = now() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_research(&self, research: NewResearch) -> Result<Research, DatabaseError> {
        let answers = research.answers;
        let sql = format!(
            "INSERT INTO research (user_id, gender_identity, age_range, event_type, transport_type, \
                 recommendation_score, gate_findability, highlight, frustration, next_vibe_score, artist_wish) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {RESEARCH_COLUMNS}"
        );
        Ok(sqlx::query_as(&sql)
            .bind(research.user_id)
            .bind(answers.gender_identity)
            .bind(answers.age_range)
            .bind(answers.event_type)
            .bind(answers.transport_type)
            .bind(answers.recommendation_score)
            .bind(answers.gate_findability)
            .bind(answers.highlight)
            .bind(answers.frustration)
            .bind(answers.next_vibe_score)
            .bind(answers.artist_wish)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::classify)?)
    }

    async fn find_research(&self, id: i64) -> Result<Option<ResearchWithOwner>, DatabaseError> {
        let sql = Self::research_with_owner_sql("AND r.id = $1");
        let row: Option<ResearchOwnerRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(Into::into))
    }

    async fn list_research(&self) -> Result<Vec<ResearchWithOwner>, DatabaseError> {
        let sql = Self::research_with_owner_sql("");
        let rows: Vec<ResearchOwnerRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_research(&self, id: i64, changes: ResearchChanges) -> Result<Option<Research>, DatabaseError> {
        let answers = changes.answers;
        let sql = format!(
            "UPDATE research SET \
                 user_id = COALESCE($2, user_id), \
                 gender_identity = COALESCE($3, gender_identity), \
                 age_range = COALESCE($4, age_range), \
                 event_type = COALESCE($5, event_type), \
                 transport_type = COALESCE($6, transport_type), \
                 recommendation_score = COALESCE($7, recommendation_score), \
                 gate_findability = COALESCE($8, gate_findability), \
                 highlight = COALESCE($9, highlight), \
                 frustration = COALESCE($10, frustration), \
                 next_vibe_score = COALESCE($11, next_vibe_score), \
                 artist_wish = COALESCE($12, artist_wish), \
                 updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {RESEARCH_COLUMNS}"
        );
        Ok(sqlx::query_as(&sql)
            .bind(id)
            .bind(changes.user_id)
            .bind(answers.gender_identity)
            .bind(answers.age_range)
            .bind(answers.event_type)
            .bind(answers.transport_type)
            .bind(answers.recommendation_score)
            .bind(answers.gate_findability)
            .bind(answers.highlight)
            .bind(answers.frustration)
            .bind(answers.next_vibe_score)
            .bind(answers.artist_wish)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::classify)?)
    }

    async fn soft_delete_research(&self, id: i64) -> Result<bool, DatabaseError> {
        let result =
            sqlx::query("UPDATE research SET deleted_at = now(), updated_at = now() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn research_totals(&self, filter: &ResearchFilter) -> Result<ResearchTotals, DatabaseError> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*), AVG(recommendation_score)::float8, AVG(next_vibe_score)::float8 FROM research",
        );
        push_research_filter(&mut builder, filter);

        let (count, average_recommendation_score, average_next_vibe_score): (i64, Option<f64>, Option<f64>) =
            builder.build_query_as().fetch_one(&self.pool).await?;

        Ok(ResearchTotals {
            count,
            average_recommendation_score,
            average_next_vibe_score,
        })
    }

    async fn count_research_by(
        &self,
        filter: &ResearchFilter,
        dimension: Dimension,
    ) -> Result<Vec<GroupCount>, DatabaseError> {
        let column = dimension.column();
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {column}, COUNT(*) FROM research"));
        push_research_filter(&mut builder, filter);
        // Byte-order collation so both stores sort groups identically.
        builder.push(format!(" GROUP BY {column} ORDER BY {column} COLLATE \"C\" NULLS LAST"));

        let rows: Vec<(Option<String>, i64)> = builder.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|(value, count)| GroupCount { value, count })
            .collect())
    }

    async fn create_dashboard(&self, dashboard: NewDashboard) -> Result<Dashboard, DatabaseError> {
        let sql = format!(
            "INSERT INTO dashboards (period, total_responses, average_recommendation_score, \
                 gender_identity_distribution, age_range_distribution, event_type_distribution, \
                 transport_type_distribution) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {DASHBOARD_COLUMNS}"
        );
        sqlx::query_as(&sql)
            .bind(dashboard.period)
            .bind(dashboard.total_responses)
            .bind(dashboard.average_recommendation_score)
            .bind(dashboard.gender_identity_distribution)
            .bind(dashboard.age_range_distribution)
            .bind(dashboard.event_type_distribution)
            .bind(dashboard.transport_type_distribution)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::classify)
    }

    async fn find_dashboard(&self, id: i64) -> Result<Option<Dashboard>, DatabaseError> {
        let sql = format!("SELECT {DASHBOARD_COLUMNS} FROM dashboards WHERE id = $1 AND deleted_at IS NULL");
        Ok(sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn find_dashboard_by_period(&self, period: &str) -> Result<Option<Dashboard>, DatabaseError> {
        let sql = format!("SELECT {DASHBOARD_COLUMNS} FROM dashboards WHERE period = $1 AND deleted_at IS NULL");
        Ok(sqlx::query_as(&sql).bind(period).fetch_optional(&self.pool).await?)
    }

    async fn list_dashboards(&self) -> Result<Vec<Dashboard>, DatabaseError> {
        let sql = format!("SELECT {DASHBOARD_COLUMNS} FROM dashboards WHERE deleted_at IS NULL ORDER BY period DESC");
        Ok(sqlx::query_as(&sql).fetch_all(&self.pool).await?)
    }

    async fn update_dashboard(&self, id: i64, changes: DashboardChanges) -> Result<Option<Dashboard>, DatabaseError> {
        let sql = format!(
            "UPDATE dashboards SET \
                 period = COALESCE($2, period), \
                 total_responses = COALESCE($3, total_responses), \
                 average_recommendation_score = COALESCE($4, average_recommendation_score), \
                 gender_identity_distribution = COALESCE($5, gender_identity_distribution), \
                 age_range_distribution = COALESCE($6, age_range_distribution), \
                 event_type_distribution = COALESCE($7, event_type_distribution), \
                 transport_type_distribution = COALESCE($8, transport_type_distribution), \
                 updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {DASHBOARD_COLUMNS}"
        );
        sqlx::query_as(&sql)
            .bind(id)
            .bind(changes.period)
            .bind(changes.total_responses)
            .bind(changes.average_recommendation_score)
            .bind(changes.gender_identity_distribution)
            .bind(changes.age_range_distribution)
            .bind(changes.event_type_distribution)
            .bind(changes.transport_type_distribution)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::classify)
    }

    async fn soft_delete_dashboard(&self, id: i64) -> Result<bool, DatabaseError> {
        let result =
            sqlx::query("UPDATE dashboards SET deleted_at = now(), updated_at = now() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_dashboard(&self, dashboard: NewDashboard) -> Result<Dashboard, DatabaseError> {
        let sql = format!(
            "INSERT INTO dashboards (period, total_responses, average_recommendation_score, \
                 gender_identity_distribution, age_range_distribution, event_type_distribution, \
                 transport_type_distribution) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (period) DO UPDATE SET \
                 total_responses = EXCLUDED.total_responses, \
                 average_recommendation_score = EXCLUDED.average_recommendation_score, \
                 gender_identity_distribution = EXCLUDED.gender_identity_distribution, \
                 age_range_distribution = EXCLUDED.age_range_distribution, \
                 event_type_distribution = EXCLUDED.event_type_distribution, \
                 transport_type_distribution = EXCLUDED.transport_type_distribution, \
                 updated_at = now(), \
                 deleted_at = NULL \
             RETURNING {DASHBOARD_COLUMNS}"
        );
        Ok(sqlx::query_as(&sql)
            .bind(dashboard.period)
            .bind(dashboard.total_responses)
            .bind(dashboard.average_recommendation_score)
            .bind(dashboard.gender_identity_distribution)
            .bind(dashboard.age_range_distribution)
            .bind(dashboard.event_type_distribution)
            .bind(dashboard.transport_type_distribution)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn create_preference_submission(&self, preferences: Vec<String>) -> Result<PreferenceSubmission, DatabaseError> {
        Ok(sqlx::query_as(
            "INSERT INTO preference_submissions (preferences) VALUES ($1) RETURNING id, preferences, created_at",
        )
        .bind(preferences)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_preference_submissions(
        &self,
        created_from: Option<DateTime<Utc>>,
        created_before: Option<DateTime<Utc>>,
    ) -> Result<Vec<PreferenceSubmission>, DatabaseError> {
        Ok(sqlx::query_as(
            "SELECT id, preferences, created_at FROM preference_submissions \
             WHERE ($1::timestamptz IS NULL OR created_at >= $1) \
               AND ($2::timestamptz IS NULL OR created_at < $2) \
             ORDER BY created_at, id",
        )
        .bind(created_from)
        .bind(created_before)
        .fetch_all(&self.pool)
        .await?)
    }
}
