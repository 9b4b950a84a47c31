pub mod answers;
pub mod dashboard;
pub mod preference;
pub mod research;
pub mod role;
pub mod user;

pub use answers::{AgeRange, Dimension, EventType, Findability, Frustration, GenderIdentity, Highlight, TransportType};
pub use dashboard::{Dashboard, DashboardChanges, NewDashboard};
pub use preference::PreferenceSubmission;
pub use research::{NewResearch, Research, ResearchChanges, ResearchOwner, ResearchWithOwner, SurveyAnswers};
pub use role::{Role, UserRole};
pub use user::{NewUser, User, UserChanges, UserProfile, UserWithRoles};
