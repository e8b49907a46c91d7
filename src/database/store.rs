//! The persistence boundary. Handlers and services receive a `Store` handle
//! explicitly (no process-global client), so tests can swap in the in-memory
//! implementation.

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewProject, NewUser, Project, User};
use crate::policy::ProjectScope;

/// Errors surfaced by store implementations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("email already in use")]
    EmailInUse,

    #[error("concurrent modification")]
    Conflict,

    #[error("unknown user: {0}")]
    UnknownUser(Uuid),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Field changes for a project update, already merged and reconciled by the
/// lifecycle handler. `None` scalar fields are left as-is.
#[derive(Debug, Clone, Default)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<crate::models::ProjectStatus>,
    pub add_members: HashSet<Uuid>,
    pub remove_members: HashSet<Uuid>,
}

#[async_trait]
pub trait Store: Send + Sync {
    // Users
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError>;

    // Projects
    async fn list_projects(&self, scope: &ProjectScope) -> Result<Vec<Project>, StoreError>;
    async fn project_by_id(&self, id: Uuid) -> Result<Option<Project>, StoreError>;

    /// Persist a new project. Fails with `UnknownUser` if an initial member id
    /// does not exist; nothing is persisted in that case.
    async fn insert_project(&self, new_project: NewProject) -> Result<Project, StoreError>;

    /// Apply an update atomically, guarded by the version the caller loaded.
    /// Fails with `Conflict` if another writer has bumped the version since,
    /// with `NotFound` if the project vanished, and with `UnknownUser` if a
    /// member id to add does not exist. On any failure the project is left
    /// exactly as it was.
    async fn update_project(
        &self,
        id: Uuid,
        expected_version: i64,
        changes: ProjectChanges,
    ) -> Result<Project, StoreError>;

    /// Remove a project and its membership relations. Returns `false` when the
    /// project was already gone.
    async fn delete_project(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Liveness probe for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
