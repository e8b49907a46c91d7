//! In-memory store used as the injected test double. Mirrors the Postgres
//! implementation's semantics: unique emails, version-guarded updates, and
//! all-or-nothing membership applies.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{NewProject, NewUser, Project, ProjectStatus, User};
use crate::policy::ProjectScope;

use super::store::{ProjectChanges, Store, StoreError};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    projects: HashMap<Uuid, Project>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.email == new_user.email) {
            return Err(StoreError::EmailInUse);
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.users.get(id).cloned())
            .collect())
    }

    async fn list_projects(&self, scope: &ProjectScope) -> Result<Vec<Project>, StoreError> {
        let inner = self.inner.read().await;
        let mut projects: Vec<Project> = inner
            .projects
            .values()
            .filter(|p| match scope {
                ProjectScope::All => true,
                ProjectScope::OwnedOrMember(user) => p.is_owner(*user) || p.is_member(*user),
                ProjectScope::MemberOf(user) => p.is_member(*user),
            })
            .cloned()
            .collect();
        projects.sort_by_key(|p| p.created_at);
        Ok(projects)
    }

    async fn project_by_id(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.projects.get(&id).cloned())
    }

    async fn insert_project(&self, new_project: NewProject) -> Result<Project, StoreError> {
        let mut inner = self.inner.write().await;
        for member in &new_project.members {
            if !inner.users.contains_key(member) {
                return Err(StoreError::UnknownUser(*member));
            }
        }
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name: new_project.name,
            description: new_project.description,
            status: ProjectStatus::NotStarted,
            owner_id: new_project.owner_id,
            members: new_project.members,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        inner.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn update_project(
        &self,
        id: Uuid,
        expected_version: i64,
        changes: ProjectChanges,
    ) -> Result<Project, StoreError> {
        let mut inner = self.inner.write().await;

        // Validate everything before touching the record so a failed apply
        // leaves it untouched, matching the transactional Postgres path.
        match inner.projects.get(&id) {
            None => return Err(StoreError::NotFound),
            Some(p) if p.version != expected_version => return Err(StoreError::Conflict),
            Some(_) => {}
        }
        for member in &changes.add_members {
            if !inner.users.contains_key(member) {
                return Err(StoreError::UnknownUser(*member));
            }
        }

        let project = match inner.projects.get_mut(&id) {
            Some(project) => project,
            None => return Err(StoreError::NotFound),
        };
        if let Some(name) = changes.name {
            project.name = name;
        }
        if let Some(description) = changes.description {
            project.description = description;
        }
        if let Some(status) = changes.status {
            project.status = status;
        }
        for member in &changes.remove_members {
            project.members.remove(member);
        }
        for member in &changes.add_members {
            project.members.insert(*member);
        }
        project.version += 1;
        project.updated_at = Utc::now();
        Ok(project.clone())
    }

    async fn delete_project(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.projects.remove(&id).is_some())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use std::collections::HashSet;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: format!("{}@studio.test", name),
            password_hash: "x".to_string(),
            role: Role::Client,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        store.create_user(new_user("maeve")).await.unwrap();
        let err = store.create_user(new_user("maeve")).await.unwrap_err();
        assert!(matches!(err, StoreError::EmailInUse));
    }

    #[tokio::test]
    async fn stale_version_update_conflicts() {
        let store = MemoryStore::new();
        let owner = store.create_user(new_user("owner")).await.unwrap();
        let project = store
            .insert_project(NewProject {
                name: "Loft".into(),
                description: String::new(),
                owner_id: owner.id,
                members: HashSet::new(),
            })
            .await
            .unwrap();

        let first = store
            .update_project(
                project.id,
                project.version,
                ProjectChanges {
                    name: Some("Loft 2".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(first.version, project.version + 1);

        // A second writer holding the original version loses.
        let err = store
            .update_project(project.id, project.version, ProjectChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }

    #[tokio::test]
    async fn insert_with_unknown_member_persists_nothing() {
        let store = MemoryStore::new();
        let owner = store.create_user(new_user("owner")).await.unwrap();

        let err = store
            .insert_project(NewProject {
                name: "Loft".into(),
                description: String::new(),
                owner_id: owner.id,
                members: HashSet::from([Uuid::new_v4()]),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownUser(_)));

        let projects = store.list_projects(&ProjectScope::All).await.unwrap();
        assert!(projects.is_empty());
    }

    #[tokio::test]
    async fn unknown_member_fails_without_partial_write() {
        let store = MemoryStore::new();
        let owner = store.create_user(new_user("owner")).await.unwrap();
        let member = store.create_user(new_user("member")).await.unwrap();
        let project = store
            .insert_project(NewProject {
                name: "Kitchen".into(),
                description: String::new(),
                owner_id: owner.id,
                members: HashSet::new(),
            })
            .await
            .unwrap();

        let err = store
            .update_project(
                project.id,
                project.version,
                ProjectChanges {
                    name: Some("Kitchen 2".into()),
                    add_members: HashSet::from([member.id, Uuid::new_v4()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownUser(_)));

        let unchanged = store.project_by_id(project.id).await.unwrap().unwrap();
        assert_eq!(unchanged.name, "Kitchen");
        assert!(unchanged.members.is_empty());
        assert_eq!(unchanged.version, project.version);
    }

    #[tokio::test]
    async fn delete_reports_absence_on_second_call() {
        let store = MemoryStore::new();
        let owner = store.create_user(new_user("owner")).await.unwrap();
        let project = store
            .insert_project(NewProject {
                name: "Studio".into(),
                description: String::new(),
                owner_id: owner.id,
                members: HashSet::new(),
            })
            .await
            .unwrap();

        assert!(store.delete_project(project.id).await.unwrap());
        assert!(!store.delete_project(project.id).await.unwrap());
    }
}
