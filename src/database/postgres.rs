//! PostgreSQL-backed store. All multi-row writes (project insert, project
//! update with membership delta) run in a transaction so a failed apply never
//! leaves a half-updated project behind.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::config;
use crate::models::{NewProject, NewUser, Project, ProjectStatus, Role, User};
use crate::policy::ProjectScope;

use super::store::{ProjectChanges, Store, StoreError};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS projects (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL,
        owner_id UUID NOT NULL REFERENCES users(id),
        version BIGINT NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS project_members (
        project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        PRIMARY KEY (project_id, user_id)
    )",
];

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role).map_err(corrupt_column)?;
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ProjectRow {
    id: Uuid,
    name: String,
    description: String,
    status: String,
    owner_id: Uuid,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProjectRow {
    fn into_project(self, members: HashSet<Uuid>) -> Result<Project, StoreError> {
        let status = ProjectStatus::from_str(&self.status).map_err(corrupt_column)?;
        Ok(Project {
            id: self.id,
            name: self.name,
            description: self.description,
            status,
            owner_id: self.owner_id,
            members,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct MemberRow {
    project_id: Uuid,
    user_id: Uuid,
}

/// An enum column holding a value the application does not know.
fn corrupt_column(msg: String) -> StoreError {
    StoreError::Sqlx(sqlx::Error::Decode(msg.into()))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err.as_database_error().map(|d| d.kind()),
        Some(sqlx::error::ErrorKind::UniqueViolation)
    )
}

/// Map a membership insert failure: a foreign-key violation means the supplied
/// user id does not exist.
fn map_member_error(err: sqlx::Error, member: Uuid) -> StoreError {
    match err.as_database_error().map(|d| d.kind()) {
        Some(sqlx::error::ErrorKind::ForeignKeyViolation) => StoreError::UnknownUser(member),
        _ => StoreError::Sqlx(err),
    }
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open a connection pool sized from config.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let db_config = &config::config().database;
        let pool = PgPoolOptions::new()
            .max_connections(db_config.max_connections)
            .acquire_timeout(Duration::from_secs(db_config.connection_timeout_secs))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Create the tables on startup if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("database schema ready");
        Ok(())
    }

    /// Fetch member sets for the given project ids in one query.
    async fn members_for(
        &self,
        project_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, HashSet<Uuid>>, StoreError> {
        if project_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<MemberRow> = sqlx::query_as(
            "SELECT project_id, user_id FROM project_members WHERE project_id = ANY($1)",
        )
        .bind(project_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut map: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
        for row in rows {
            map.entry(row.project_id).or_default().insert(row.user_id);
        }
        Ok(map)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let row: UserRow = sqlx::query_as(
            "INSERT INTO users (id, name, email, password_hash, role)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, name, email, password_hash, role, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::EmailInUse
            } else {
                StoreError::Sqlx(e)
            }
        })?;

        row.try_into()
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, name, email, password_hash, role, created_at, updated_at
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, name, email, password_hash, role, created_at, updated_at
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, name, email, password_hash, role, created_at, updated_at
             FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn list_projects(&self, scope: &ProjectScope) -> Result<Vec<Project>, StoreError> {
        const COLUMNS: &str =
            "p.id, p.name, p.description, p.status, p.owner_id, p.version, p.created_at, p.updated_at";

        let rows: Vec<ProjectRow> = match scope {
            ProjectScope::All => {
                sqlx::query_as(&format!(
                    "SELECT {COLUMNS} FROM projects p ORDER BY p.created_at"
                ))
                .fetch_all(&self.pool)
                .await?
            }
            ProjectScope::OwnedOrMember(user_id) => {
                sqlx::query_as(&format!(
                    "SELECT DISTINCT {COLUMNS} FROM projects p
                     LEFT JOIN project_members m ON m.project_id = p.id
                     WHERE p.owner_id = $1 OR m.user_id = $1
                     ORDER BY p.created_at"
                ))
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
            ProjectScope::MemberOf(user_id) => {
                sqlx::query_as(&format!(
                    "SELECT {COLUMNS} FROM projects p
                     JOIN project_members m ON m.project_id = p.id
                     WHERE m.user_id = $1
                     ORDER BY p.created_at"
                ))
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut members = self.members_for(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let project_members = members.remove(&row.id).unwrap_or_default();
                row.into_project(project_members)
            })
            .collect()
    }

    async fn project_by_id(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        let row: Option<ProjectRow> = sqlx::query_as(
            "SELECT id, name, description, status, owner_id, version, created_at, updated_at
             FROM projects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };
        let members = self
            .members_for(&[row.id])
            .await?
            .remove(&row.id)
            .unwrap_or_default();
        row.into_project(members).map(Some)
    }

    async fn insert_project(&self, new_project: NewProject) -> Result<Project, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row: ProjectRow = sqlx::query_as(
            "INSERT INTO projects (id, name, description, status, owner_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, name, description, status, owner_id, version, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(&new_project.name)
        .bind(&new_project.description)
        .bind(ProjectStatus::NotStarted.as_str())
        .bind(new_project.owner_id)
        .fetch_one(&mut *tx)
        .await?;

        for member in &new_project.members {
            sqlx::query("INSERT INTO project_members (project_id, user_id) VALUES ($1, $2)")
                .bind(row.id)
                .bind(member)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_member_error(e, *member))?;
        }

        tx.commit().await?;
        row.into_project(new_project.members)
    }

    async fn update_project(
        &self,
        id: Uuid,
        expected_version: i64,
        changes: ProjectChanges,
    ) -> Result<Project, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Version guard: the row only matches if no other writer got in since
        // the caller loaded the project.
        let row: Option<ProjectRow> = sqlx::query_as(
            "UPDATE projects SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                status = COALESCE($5, status),
                version = version + 1,
                updated_at = now()
             WHERE id = $1 AND version = $2
             RETURNING id, name, description, status, owner_id, version, created_at, updated_at",
        )
        .bind(id)
        .bind(expected_version)
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.status.map(|s| s.as_str()))
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            let exists: Option<(i64,)> = sqlx::query_as("SELECT version FROM projects WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
            return Err(if exists.is_some() {
                StoreError::Conflict
            } else {
                StoreError::NotFound
            });
        };

        if !changes.remove_members.is_empty() {
            let remove: Vec<Uuid> = changes.remove_members.iter().copied().collect();
            sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND user_id = ANY($2)")
                .bind(id)
                .bind(&remove)
                .execute(&mut *tx)
                .await?;
        }

        for member in &changes.add_members {
            sqlx::query(
                "INSERT INTO project_members (project_id, user_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(member)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_member_error(e, *member))?;
        }

        let member_rows: Vec<MemberRow> =
            sqlx::query_as("SELECT project_id, user_id FROM project_members WHERE project_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        tx.commit().await?;

        let members = member_rows.into_iter().map(|m| m.user_id).collect();
        row.into_project(members)
    }

    async fn delete_project(&self, id: Uuid) -> Result<bool, StoreError> {
        // Membership rows go with the project via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
