use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::{MemberSummary, OwnerSummary};

/// Project lifecycle status, closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    NotStarted,
    InProgress,
    OnHold,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::NotStarted => "NOT_STARTED",
            ProjectStatus::InProgress => "IN_PROGRESS",
            ProjectStatus::OnHold => "ON_HOLD",
            ProjectStatus::Completed => "COMPLETED",
        }
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_STARTED" => Ok(ProjectStatus::NotStarted),
            "IN_PROGRESS" => Ok(ProjectStatus::InProgress),
            "ON_HOLD" => Ok(ProjectStatus::OnHold),
            "COMPLETED" => Ok(ProjectStatus::Completed),
            other => Err(format!("unknown project status: {}", other)),
        }
    }
}

/// Project record as persisted. `members` is a true set: no duplicates, order
/// irrelevant, and it may or may not contain the owner. `version` is bumped on
/// every successful update and guards against concurrent writers.
#[derive(Debug, Clone)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub owner_id: Uuid,
    pub members: HashSet<Uuid>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.members.contains(&user_id)
    }
}

/// Input for project creation. Ownership is fixed here and never reassigned.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub owner_id: Uuid,
    pub members: HashSet<Uuid>,
}

/// Partial update payload for PUT /projects/:id. Absent fields are left
/// untouched (merge semantics); an absent `members` list leaves membership
/// alone rather than clearing it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub members: Option<Vec<Uuid>>,
}

/// Project shape for list responses: scalar fields plus the owner summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListItem {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub owner: OwnerSummary,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Project shape for single-project responses: owner plus member summaries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub owner: OwnerSummary,
    pub members: Vec<MemberSummary>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
