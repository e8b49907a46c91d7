//! Membership reconciliation: the minimal add/remove delta between a project's
//! current member set and the desired set from an update request.

use std::collections::HashSet;

use uuid::Uuid;

/// Exact delta to apply to a project's membership. `to_add` and `to_remove`
/// are always disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDelta {
    pub to_add: HashSet<Uuid>,
    pub to_remove: HashSet<Uuid>,
}

impl MembershipDelta {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Compute the delta taking `current` to `desired`.
///
/// A `None` desired set means the update omitted the member field entirely, so
/// membership is left untouched (partial-update semantics, not a clear).
/// No validation of the candidate ids happens here; the store rejects unknown
/// users at apply time and persists nothing.
pub fn reconcile(current: &HashSet<Uuid>, desired: Option<&HashSet<Uuid>>) -> MembershipDelta {
    let Some(desired) = desired else {
        return MembershipDelta::default();
    };

    MembershipDelta {
        to_add: desired.difference(current).copied().collect(),
        to_remove: current.difference(desired).copied().collect(),
    }
}
