pub mod project;
pub mod user;

pub use project::{NewProject, Project, ProjectDetail, ProjectListItem, ProjectPatch, ProjectStatus};
pub use user::{MemberSummary, NewUser, OwnerSummary, PublicUser, Role, User};
