pub mod analytics;
pub mod auth_service;
pub mod bootstrap;
pub mod dashboard_service;
pub mod period;
pub mod public_service;
pub mod research_service;
pub mod role_service;
pub mod user_role_service;
pub mod user_service;

use serde::Serialize;

pub use auth_service::AuthService;
pub use dashboard_service::DashboardService;
pub use public_service::PublicService;
pub use research_service::ResearchService;
pub use role_service::RoleService;
pub use user_role_service::UserRoleService;
pub use user_service::UserService;

/// Body of operations that only report what they did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
