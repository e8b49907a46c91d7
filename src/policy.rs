//! Access control decisions for project operations.
//!
//! Every route consults this single decision table instead of re-deriving
//! owner/member checks inline, so read and write rules cannot drift apart.
//! All functions are pure: they are handed an already-loaded project and never
//! touch the store.

use uuid::Uuid;

use crate::models::{Project, Role};

/// Per-project operations subject to the decision table. Listing and creation
/// are not per-project and have their own entry points below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Update,
    Delete,
}

/// Outcome of a policy check. The denial reason is a client-safe message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(&'static str),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

/// Which projects a listing query should return for the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectScope {
    /// Every project (ADMIN).
    All,
    /// Projects the actor owns or is a member of (DESIGNER).
    OwnedOrMember(Uuid),
    /// Projects the actor is a member of (CLIENT).
    MemberOf(Uuid),
}

/// Decide whether `actor_id` with `role` may perform `action` on `project`.
///
/// | Action | ADMIN  | DESIGNER        | CLIENT    |
/// |--------|--------|-----------------|-----------|
/// | Read   | always | owner or member | member    |
/// | Update | always | owner           | never     |
/// | Delete | always | owner           | never     |
pub fn decide(role: Role, actor_id: Uuid, action: Action, project: &Project) -> Decision {
    match (role, action) {
        (Role::Admin, _) => Decision::Allowed,

        (Role::Designer, Action::Read) => {
            if project.is_owner(actor_id) || project.is_member(actor_id) {
                Decision::Allowed
            } else {
                Decision::Denied("Not authorized to access this project")
            }
        }
        (Role::Designer, Action::Update | Action::Delete) => {
            if project.is_owner(actor_id) {
                Decision::Allowed
            } else {
                Decision::Denied("Only the project owner may modify this project")
            }
        }

        (Role::Client, Action::Read) => {
            if project.is_member(actor_id) {
                Decision::Allowed
            } else {
                Decision::Denied("Not authorized to access this project")
            }
        }
        (Role::Client, Action::Update | Action::Delete) => {
            Decision::Denied("Clients may not modify projects")
        }
    }
}

/// Whether the role may create projects. Clients can never own a project, and
/// ownership is only ever assigned to the creator, so creation is restricted
/// to ADMIN and DESIGNER.
pub fn create_allowed(role: Role) -> bool {
    match role {
        Role::Admin | Role::Designer => true,
        Role::Client => false,
    }
}

/// Listing visibility for the actor, consumed by the store's list query.
pub fn list_scope(role: Role, actor_id: Uuid) -> ProjectScope {
    match role {
        Role::Admin => ProjectScope::All,
        Role::Designer => ProjectScope::OwnedOrMember(actor_id),
        Role::Client => ProjectScope::MemberOf(actor_id),
    }
}
