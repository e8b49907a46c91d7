//! Project lifecycle orchestration: load, authorize, reconcile, persist, shape.
//! Stateless between calls; all persistent state lives behind the store handle.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use uuid::Uuid;

use crate::database::store::{ProjectChanges, Store};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::{
    MemberSummary, NewProject, OwnerSummary, Project, ProjectDetail, ProjectListItem, ProjectPatch,
};
use crate::policy::{self, Action, Decision};
use crate::reconcile;

pub struct ProjectService {
    store: Arc<dyn Store>,
}

impl ProjectService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Projects visible to the actor, with owner summaries embedded.
    pub async fn list(&self, actor: &AuthUser) -> Result<Vec<ProjectListItem>, ApiError> {
        let scope = policy::list_scope(actor.role, actor.user_id);
        let projects = self.store.list_projects(&scope).await?;

        let owner_ids: Vec<Uuid> = projects
            .iter()
            .map(|p| p.owner_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let owners: HashMap<Uuid, OwnerSummary> = self
            .store
            .users_by_ids(&owner_ids)
            .await?
            .iter()
            .map(|u| (u.id, OwnerSummary::from(u)))
            .collect();

        let mut items = Vec::with_capacity(projects.len());
        for project in projects {
            let Some(owner) = owners.get(&project.owner_id).cloned() else {
                tracing::error!(
                    "project {} owner {} has no user record",
                    project.id,
                    project.owner_id
                );
                return Err(ApiError::internal_server_error(
                    "An error occurred while processing your request",
                ));
            };
            items.push(ProjectListItem {
                id: project.id,
                name: project.name,
                description: project.description,
                status: project.status,
                owner,
                version: project.version,
                created_at: project.created_at,
                updated_at: project.updated_at,
            });
        }
        Ok(items)
    }

    pub async fn get(&self, actor: &AuthUser, id: Uuid) -> Result<ProjectDetail, ApiError> {
        let project = self.load(id).await?;
        check(actor, Action::Read, &project)?;
        self.detail(project).await
    }

    /// Create a project owned by the actor. Status starts at NOT_STARTED and
    /// the initial member list is deduplicated into a set.
    pub async fn create(
        &self,
        actor: &AuthUser,
        name: String,
        description: String,
        members: Vec<Uuid>,
    ) -> Result<ProjectDetail, ApiError> {
        if !policy::create_allowed(actor.role) {
            return Err(ApiError::forbidden("Not authorized to create projects"));
        }

        let members: HashSet<Uuid> = members.into_iter().collect();
        let project = self
            .store
            .insert_project(NewProject {
                name,
                description,
                owner_id: actor.user_id,
                members,
            })
            .await?;
        self.detail(project).await
    }

    /// Merge-semantics update: absent patch fields are untouched, and an
    /// absent member list leaves membership alone. The apply is guarded by the
    /// version loaded here, so a concurrent writer surfaces as 409.
    pub async fn update(
        &self,
        actor: &AuthUser,
        id: Uuid,
        patch: ProjectPatch,
    ) -> Result<ProjectDetail, ApiError> {
        let project = self.load(id).await?;
        check(actor, Action::Update, &project)?;

        let desired: Option<HashSet<Uuid>> = patch.members.map(|m| m.into_iter().collect());
        let delta = reconcile::reconcile(&project.members, desired.as_ref());

        let updated = self
            .store
            .update_project(
                id,
                project.version,
                ProjectChanges {
                    name: patch.name,
                    description: patch.description,
                    status: patch.status,
                    add_members: delta.to_add,
                    remove_members: delta.to_remove,
                },
            )
            .await?;
        self.detail(updated).await
    }

    pub async fn delete(&self, actor: &AuthUser, id: Uuid) -> Result<(), ApiError> {
        let project = self.load(id).await?;
        check(actor, Action::Delete, &project)?;
        if !self.store.delete_project(id).await? {
            // Lost a race with another delete between load and apply.
            return Err(ApiError::not_found("Project not found"));
        }
        Ok(())
    }

    async fn load(&self, id: Uuid) -> Result<Project, ApiError> {
        self.store
            .project_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Project not found"))
    }

    /// Shape a project with owner and member summaries embedded.
    async fn detail(&self, project: Project) -> Result<ProjectDetail, ApiError> {
        let mut ids: Vec<Uuid> = project.members.iter().copied().collect();
        ids.push(project.owner_id);
        let users = self.store.users_by_ids(&ids).await?;

        let owner = users
            .iter()
            .find(|u| u.id == project.owner_id)
            .map(OwnerSummary::from)
            .ok_or_else(|| {
                tracing::error!("project {} owner {} has no user record", project.id, project.owner_id);
                ApiError::internal_server_error("An error occurred while processing your request")
            })?;

        let mut members: Vec<MemberSummary> = users
            .iter()
            .filter(|u| project.members.contains(&u.id))
            .map(MemberSummary::from)
            .collect();
        // Stable ordering for clients; the stored member set is unordered.
        members.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(ProjectDetail {
            id: project.id,
            name: project.name,
            description: project.description,
            status: project.status,
            owner,
            members,
            version: project.version,
            created_at: project.created_at,
            updated_at: project.updated_at,
        })
    }
}

fn check(actor: &AuthUser, action: Action, project: &Project) -> Result<(), ApiError> {
    match policy::decide(actor.role, actor.user_id, action, project) {
        Decision::Allowed => Ok(()),
        Decision::Denied(reason) => Err(ApiError::forbidden(reason)),
    }
}
