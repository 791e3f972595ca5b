//! Membership Resolver: the eligible-member set of a session

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::{GroupWithMembers, Member};
use crate::store::{AttendanceStore, with_timeout};

/// Deduplicated union of the members of `groups`.
///
/// A member reachable through several groups appears once. The result is
/// ordered by last name, first name, then id.
pub fn eligible_members(groups: &[GroupWithMembers]) -> Vec<Member> {
    let mut by_id: HashMap<Uuid, &Member> = HashMap::new();
    for group in groups {
        for member in &group.members {
            by_id.insert(member.id, member);
        }
    }

    let mut members: Vec<Member> = by_id.into_values().cloned().collect();
    members.sort_by(|a, b| {
        a.last_name
            .cmp(&b.last_name)
            .then_with(|| a.first_name.cmp(&b.first_name))
            .then_with(|| a.id.cmp(&b.id))
    });
    members
}

/// Loads a session's groups from the store and resolves its eligible members
#[derive(Debug, Clone)]
pub struct MembershipResolver<S> {
    store: S,
    timeout: Duration,
}

impl<S: AttendanceStore> MembershipResolver<S> {
    pub fn new(store: S, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Eligible members of `session_id`; empty when no groups are attached
    pub async fn resolve(&self, session_id: Uuid) -> StoreResult<Vec<Member>> {
        let groups = with_timeout(self.timeout, self.store.session_groups(session_id)).await?;
        let members = eligible_members(&groups);
        debug!(
            "Session {} has {} eligible members across {} groups",
            session_id,
            members.len(),
            groups.len()
        );
        Ok(members)
    }
}
