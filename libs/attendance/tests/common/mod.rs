//! Fixtures shared by the integration tests

#![allow(dead_code)]

use std::time::Duration;

use attendance::models::{GroupWithMembers, Member, NewGroup, NewMember, NewOrganization, Organization};
use attendance::{MemoryStore, RosterStore};
use uuid::Uuid;

pub const TIMEOUT: Duration = Duration::from_secs(2);

pub async fn organization(store: &MemoryStore) -> Organization {
    store
        .create_organization(NewOrganization {
            name: "Soho Choir".to_string(),
            code_length: Some(3),
        })
        .await
        .expect("create organization")
}

pub async fn member(store: &MemoryStore, org: Uuid, code: &str, first: &str, last: &str) -> Member {
    store
        .create_member(
            org,
            NewMember {
                external_code: code.to_string(),
                first_name: first.to_string(),
                last_name: last.to_string(),
                grade: None,
            },
        )
        .await
        .expect("create member")
}

pub async fn group(store: &MemoryStore, org: Uuid, name: &str, members: &[&Member]) -> GroupWithMembers {
    store
        .create_group(
            org,
            NewGroup {
                name: name.to_string(),
                member_ids: members.iter().map(|m| m.id).collect(),
            },
        )
        .await
        .expect("create group")
}

pub async fn all_group(store: &MemoryStore, org: Uuid) -> GroupWithMembers {
    store
        .list_groups(org)
        .await
        .expect("list groups")
        .into_iter()
        .find(|g| g.group.name == attendance::models::ALL_GROUP_NAME)
        .expect("organization has an All group")
}
