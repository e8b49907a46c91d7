pub mod auth_service;
pub mod project_service;

pub use auth_service::{AuthResponse, AuthService};
pub use project_service::ProjectService;
