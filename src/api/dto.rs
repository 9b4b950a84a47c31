// Request bodies and query strings accepted by the HTTP API.

use serde::Deserialize;

use super::validation::{is_email, is_score, is_strong_password, Validate, Violations};
use crate::database::models::{AgeRange, DashboardChanges, EventType, GenderIdentity, NewDashboard, SurveyAnswers};
use crate::error::ApiError;
use crate::services::period::{range_end, range_start, Period};

const STRONG_PASSWORD: &str =
    "password is not strong enough (min 8 chars with lowercase, uppercase, digit and symbol)";

/// Clients send the raw password under `passwordHash`; it is hashed before storage.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    pub full_name: String,
    pub email: String,
    #[serde(rename = "passwordHash", alias = "password")]
    pub password: String,
}

impl Validate for RegisterUser {
    fn validate(&self) -> Result<(), ApiError> {
        let mut violations = Violations::new();
        violations
            .check("fullName", !self.full_name.trim().is_empty(), "fullName should not be empty")
            .check("email", is_email(&self.email), "email must be an email")
            .check("passwordHash", is_strong_password(&self.password), STRONG_PASSWORD);
        violations.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginUser {
    pub email: String,
    #[serde(rename = "passwordHash", alias = "password")]
    pub password: String,
}

/// Only presence is checked: the password policy applies when a password is set, not when it is presented.
impl Validate for LoginUser {
    fn validate(&self) -> Result<(), ApiError> {
        let mut violations = Violations::new();
        violations
            .check("email", !self.email.trim().is_empty(), "email should not be empty")
            .check("passwordHash", !self.password.is_empty(), "password should not be empty");
        violations.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub full_name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "passwordHash", alias = "password")]
    pub password: Option<String>,
}

impl Validate for UpdateUser {
    fn validate(&self) -> Result<(), ApiError> {
        let mut violations = Violations::new();
        if let Some(full_name) = &self.full_name {
            violations.check("fullName", !full_name.trim().is_empty(), "fullName should not be empty");
        }
        if let Some(email) = &self.email {
            violations.check("email", is_email(email), "email must be an email");
        }
        if let Some(password) = &self.password {
            violations.check("passwordHash", is_strong_password(password), STRONG_PASSWORD);
        }
        violations.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRole {
    pub name: String,
}

impl Validate for CreateRole {
    fn validate(&self) -> Result<(), ApiError> {
        let mut violations = Violations::new();
        violations.check("name", !self.name.trim().is_empty(), "name should not be empty");
        violations.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRole {
    pub name: Option<String>,
}

impl Validate for UpdateRole {
    fn validate(&self) -> Result<(), ApiError> {
        let mut violations = Violations::new();
        if let Some(name) = &self.name {
            violations.check("name", !name.trim().is_empty(), "name should not be empty");
        }
        violations.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRole {
    pub user_id: i64,
    pub role_id: i64,
}

impl Validate for CreateUserRole {
    fn validate(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRole {
    pub role_id: Option<i64>,
}

impl Validate for UpdateUserRole {
    fn validate(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

fn check_answers(violations: &mut Violations, answers: &SurveyAnswers) {
    violations
        .check(
            "recommendationScore",
            is_score(answers.recommendation_score),
            "Recommendation score must be between 0 and 10",
        )
        .check(
            "nextVibeScore",
            is_score(answers.next_vibe_score),
            "Next vibe score must be between 0 and 10",
        );
}

/// Survey response body, shared by `POST /research` and the public `POST /survey`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResearch {
    pub user_id: i64,
    #[serde(flatten)]
    pub answers: SurveyAnswers,
}

impl Validate for CreateResearch {
    fn validate(&self) -> Result<(), ApiError> {
        let mut violations = Violations::new();
        check_answers(&mut violations, &self.answers);
        violations.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResearch {
    pub user_id: Option<i64>,
    #[serde(flatten)]
    pub answers: SurveyAnswers,
}

impl Validate for UpdateResearch {
    fn validate(&self) -> Result<(), ApiError> {
        let mut violations = Violations::new();
        check_answers(&mut violations, &self.answers);
        violations.into_result()
    }
}

fn check_period(violations: &mut Violations, period: &str) {
    violations.check(
        "period",
        period.parse::<Period>().is_ok(),
        "period must use the YYYY-MM format",
    );
}

impl Validate for NewDashboard {
    fn validate(&self) -> Result<(), ApiError> {
        let mut violations = Violations::new();
        check_period(&mut violations, &self.period);
        violations
            .check("totalResponses", self.total_responses >= 0, "totalResponses must not be negative")
            .check(
                "averageRecommendationScore",
                self.average_recommendation_score.is_finite(),
                "averageRecommendationScore must be a number",
            );
        violations.into_result()
    }
}

impl Validate for DashboardChanges {
    fn validate(&self) -> Result<(), ApiError> {
        let mut violations = Violations::new();
        if let Some(period) = &self.period {
            check_period(&mut violations, period);
        }
        if let Some(total) = self.total_responses {
            violations.check("totalResponses", total >= 0, "totalResponses must not be negative");
        }
        violations.into_result()
    }
}

fn check_dates(violations: &mut Violations, start_date: Option<&str>, end_date: Option<&str>) {
    if let Some(start) = start_date {
        violations.check("startDate", range_start(start).is_some(), "Start date must be a valid date string");
    }
    if let Some(end) = end_date {
        violations.check("endDate", range_end(end).is_some(), "End date must be a valid date string");
    }
}

/// Query string of `GET /dashboard/analytics/survey`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardFilter {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub gender_identity: Option<GenderIdentity>,
    pub age_range: Option<AgeRange>,
    pub event_type: Option<EventType>,
}

impl Validate for DashboardFilter {
    fn validate(&self) -> Result<(), ApiError> {
        let mut violations = Violations::new();
        check_dates(&mut violations, self.start_date.as_deref(), self.end_date.as_deref());
        violations.into_result()
    }
}

/// Query string of `GET /dashboard/analytics/preferences`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceFilter {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl Validate for PreferenceFilter {
    fn validate(&self) -> Result<(), ApiError> {
        let mut violations = Violations::new();
        check_dates(&mut violations, self.start_date.as_deref(), self.end_date.as_deref());
        violations.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePreference {
    pub preferences: Vec<String>,
}

impl Validate for CreatePreference {
    fn validate(&self) -> Result<(), ApiError> {
        let mut violations = Violations::new();
        violations.check(
            "preferences",
            !self.preferences.is_empty(),
            "Preferences array cannot be empty",
        );
        violations.into_result()
    }
}
