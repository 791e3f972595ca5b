//! In-memory store
//!
//! Implements both store traits behind a single async mutex, which makes
//! every operation atomic. Used by tests and local runs without PostgreSQL.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{
    ALL_GROUP_NAME, AttendanceRecord, DateRange, Group, GroupWithMembers, Member, NewGroup,
    NewMember, NewOrganization, NewSession, Organization, Session,
};
use crate::store::{AttendanceStore, EndSessionOutcome, InsertOutcome, RosterStore};

#[derive(Debug)]
struct GroupEntry {
    group: Group,
    members: BTreeSet<Uuid>,
}

#[derive(Debug)]
struct SessionEntry {
    session: Session,
    groups: BTreeSet<Uuid>,
}

#[derive(Debug, Default)]
struct Inner {
    organizations: HashMap<Uuid, Organization>,
    members: HashMap<Uuid, Member>,
    groups: HashMap<Uuid, GroupEntry>,
    sessions: HashMap<Uuid, SessionEntry>,
    records: HashMap<(Uuid, Uuid), AttendanceRecord>,
}

impl Inner {
    fn group_with_members(&self, entry: &GroupEntry) -> GroupWithMembers {
        GroupWithMembers {
            group: entry.group.clone(),
            members: entry
                .members
                .iter()
                .filter_map(|id| self.members.get(id).cloned())
                .collect(),
        }
    }

    fn check_members(&self, organization_id: Uuid, member_ids: &[Uuid]) -> StoreResult<()> {
        for id in member_ids {
            match self.members.get(id) {
                Some(member) if member.organization_id == organization_id => {}
                _ => return Err(StoreError::not_found("member", id)),
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    faults: Arc<std::sync::Mutex<Faults>>,
}

#[derive(Debug, Clone, Copy)]
struct Faults {
    available: bool,
    latency: Duration,
}

impl Default for Faults {
    fn default() -> Self {
        Self {
            available: true,
            latency: Duration::ZERO,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While `false`, every call fails with [`StoreError::Unavailable`]
    pub fn set_available(&self, available: bool) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.available = available;
        }
    }

    /// Delay applied before every call
    pub fn set_latency(&self, latency: Duration) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.latency = latency;
        }
    }

    /// Number of stored attendance records for a session
    pub async fn record_count(&self, session_id: Uuid) -> usize {
        let inner = self.inner.lock().await;
        inner
            .records
            .keys()
            .filter(|(_, session)| *session == session_id)
            .count()
    }

    async fn enter(&self) -> StoreResult<tokio::sync::MutexGuard<'_, Inner>> {
        let faults = self
            .faults
            .lock()
            .map(|faults| *faults)
            .unwrap_or_default();

        if !faults.latency.is_zero() {
            tokio::time::sleep(faults.latency).await;
        }
        if !faults.available {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(self.inner.lock().await)
    }
}

impl AttendanceStore for MemoryStore {
    async fn find_member(
        &self,
        organization_id: Uuid,
        external_code: &str,
    ) -> StoreResult<Option<Member>> {
        let inner = self.enter().await?;
        Ok(inner
            .members
            .values()
            .find(|m| m.organization_id == organization_id && m.external_code == external_code)
            .cloned())
    }

    async fn find_session(
        &self,
        organization_id: Uuid,
        session_id: Uuid,
    ) -> StoreResult<Option<Session>> {
        let inner = self.enter().await?;
        Ok(inner
            .sessions
            .get(&session_id)
            .filter(|entry| entry.session.organization_id == organization_id)
            .map(|entry| entry.session.clone()))
    }

    async fn session_groups(&self, session_id: Uuid) -> StoreResult<Vec<GroupWithMembers>> {
        let inner = self.enter().await?;
        let Some(entry) = inner.sessions.get(&session_id) else {
            return Ok(Vec::new());
        };
        Ok(entry
            .groups
            .iter()
            .filter_map(|id| inner.groups.get(id))
            .map(|group| inner.group_with_members(group))
            .collect())
    }

    async fn session_records(&self, session_id: Uuid) -> StoreResult<Vec<AttendanceRecord>> {
        let inner = self.enter().await?;
        let mut records: Vec<AttendanceRecord> = inner
            .records
            .values()
            .filter(|record| record.session_id == session_id)
            .copied()
            .collect();
        records.sort_by(|a, b| b.check_in_time.cmp(&a.check_in_time));
        Ok(records)
    }

    async fn insert_attendance_if_absent(
        &self,
        member_id: Uuid,
        session_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<InsertOutcome> {
        let mut inner = self.enter().await?;

        match inner.sessions.get(&session_id) {
            Some(entry) if entry.session.active => {}
            _ => return Ok(InsertOutcome::SessionClosed),
        }
        if !inner.members.contains_key(&member_id) {
            return Err(StoreError::not_found("member", member_id));
        }

        if let Some(existing) = inner.records.get(&(member_id, session_id)) {
            return Ok(InsertOutcome::AlreadyExists(*existing));
        }

        let record = AttendanceRecord {
            member_id,
            session_id,
            check_in_time: at,
        };
        inner.records.insert((member_id, session_id), record);
        Ok(InsertOutcome::Created(record))
    }

    async fn list_sessions(
        &self,
        organization_id: Uuid,
        range: DateRange,
    ) -> StoreResult<Vec<Session>> {
        let inner = self.enter().await?;
        let mut sessions: Vec<Session> = inner
            .sessions
            .values()
            .map(|entry| &entry.session)
            .filter(|s| s.organization_id == organization_id && range.contains(s.date))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(sessions)
    }

    async fn list_active_sessions(&self, organization_id: Uuid) -> StoreResult<Vec<Session>> {
        let sessions = self
            .list_sessions(organization_id, DateRange::unbounded())
            .await?;
        Ok(sessions.into_iter().filter(|s| s.active).collect())
    }

    async fn create_session(
        &self,
        organization_id: Uuid,
        input: NewSession,
    ) -> StoreResult<Session> {
        let mut inner = self.enter().await?;
        if !inner.organizations.contains_key(&organization_id) {
            return Err(StoreError::not_found("organization", organization_id));
        }
        for id in &input.group_ids {
            match inner.groups.get(id) {
                Some(entry) if entry.group.organization_id == organization_id => {}
                _ => return Err(StoreError::not_found("group", id)),
            }
        }

        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            organization_id,
            date: input.date.unwrap_or_else(|| now.date_naive()),
            active: true,
            ended_at: None,
            created_at: now,
        };
        inner.sessions.insert(
            session.id,
            SessionEntry {
                session: session.clone(),
                groups: input.group_ids.into_iter().collect(),
            },
        );
        debug!("Created session {} in organization {}", session.id, organization_id);
        Ok(session)
    }

    async fn end_session(
        &self,
        organization_id: Uuid,
        session_id: Uuid,
    ) -> StoreResult<EndSessionOutcome> {
        let mut inner = self.enter().await?;
        let Some(entry) = inner
            .sessions
            .get_mut(&session_id)
            .filter(|entry| entry.session.organization_id == organization_id)
        else {
            return Ok(EndSessionOutcome::NotFound);
        };

        if !entry.session.active {
            return Ok(EndSessionOutcome::AlreadyEnded(entry.session.clone()));
        }
        entry.session.active = false;
        entry.session.ended_at = Some(Utc::now());
        Ok(EndSessionOutcome::Ended(entry.session.clone()))
    }

    async fn delete_session(&self, organization_id: Uuid, session_id: Uuid) -> StoreResult<bool> {
        let mut inner = self.enter().await?;
        match inner.sessions.get(&session_id) {
            Some(entry) if entry.session.organization_id == organization_id => {}
            _ => return Ok(false),
        }

        inner.sessions.remove(&session_id);
        inner.records.retain(|(_, session), _| *session != session_id);
        debug!("Deleted session {} in organization {}", session_id, organization_id);
        Ok(true)
    }
}

impl RosterStore for MemoryStore {
    async fn create_organization(&self, input: NewOrganization) -> StoreResult<Organization> {
        let mut inner = self.enter().await?;
        let organization = Organization {
            id: Uuid::new_v4(),
            name: input.name,
            code_length: input.code_length,
            created_at: Utc::now(),
        };
        let all = Group {
            id: Uuid::new_v4(),
            organization_id: organization.id,
            name: ALL_GROUP_NAME.to_string(),
        };
        inner.groups.insert(
            all.id,
            GroupEntry {
                group: all,
                members: BTreeSet::new(),
            },
        );
        inner
            .organizations
            .insert(organization.id, organization.clone());
        Ok(organization)
    }

    async fn find_organization(&self, id: Uuid) -> StoreResult<Option<Organization>> {
        let inner = self.enter().await?;
        Ok(inner.organizations.get(&id).cloned())
    }

    async fn create_member(&self, organization_id: Uuid, input: NewMember) -> StoreResult<Member> {
        let mut inner = self.enter().await?;
        if !inner.organizations.contains_key(&organization_id) {
            return Err(StoreError::not_found("organization", organization_id));
        }
        let code = input.external_code.trim().to_string();
        if inner
            .members
            .values()
            .any(|m| m.organization_id == organization_id && m.external_code == code)
        {
            return Err(StoreError::Conflict(format!(
                "member code {} already exists",
                code
            )));
        }

        let member = Member {
            id: Uuid::new_v4(),
            organization_id,
            external_code: code,
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            grade: input.grade,
        };
        inner.members.insert(member.id, member.clone());
        if let Some(all) = inner.groups.values_mut().find(|entry| {
            entry.group.organization_id == organization_id && entry.group.name == ALL_GROUP_NAME
        }) {
            all.members.insert(member.id);
        }
        Ok(member)
    }

    async fn delete_member(&self, organization_id: Uuid, member_id: Uuid) -> StoreResult<bool> {
        let mut inner = self.enter().await?;
        match inner.members.get(&member_id) {
            Some(member) if member.organization_id == organization_id => {}
            _ => return Ok(false),
        }

        inner.members.remove(&member_id);
        for entry in inner.groups.values_mut() {
            entry.members.remove(&member_id);
        }
        inner.records.retain(|(member, _), _| *member != member_id);
        Ok(true)
    }

    async fn create_group(
        &self,
        organization_id: Uuid,
        input: NewGroup,
    ) -> StoreResult<GroupWithMembers> {
        let mut inner = self.enter().await?;
        if !inner.organizations.contains_key(&organization_id) {
            return Err(StoreError::not_found("organization", organization_id));
        }
        let name = input.name.trim().to_string();
        if inner
            .groups
            .values()
            .any(|e| e.group.organization_id == organization_id && e.group.name == name)
        {
            return Err(StoreError::Conflict(format!("group {} already exists", name)));
        }
        inner.check_members(organization_id, &input.member_ids)?;

        let entry = GroupEntry {
            group: Group {
                id: Uuid::new_v4(),
                organization_id,
                name,
            },
            members: input.member_ids.into_iter().collect(),
        };
        let created = inner.group_with_members(&entry);
        inner.groups.insert(entry.group.id, entry);
        Ok(created)
    }

    async fn list_groups(&self, organization_id: Uuid) -> StoreResult<Vec<GroupWithMembers>> {
        let inner = self.enter().await?;
        let mut groups: Vec<GroupWithMembers> = inner
            .groups
            .values()
            .filter(|entry| entry.group.organization_id == organization_id)
            .map(|entry| inner.group_with_members(entry))
            .collect();
        groups.sort_by(|a, b| a.group.name.cmp(&b.group.name));
        Ok(groups)
    }

    async fn replace_group_members(
        &self,
        organization_id: Uuid,
        group_id: Uuid,
        member_ids: Vec<Uuid>,
    ) -> StoreResult<Option<GroupWithMembers>> {
        let mut inner = self.enter().await?;
        match inner.groups.get(&group_id) {
            Some(entry) if entry.group.organization_id == organization_id => {
                if entry.group.name == ALL_GROUP_NAME {
                    return Err(StoreError::Conflict(format!(
                        "{} group always holds every member",
                        ALL_GROUP_NAME
                    )));
                }
            }
            _ => return Ok(None),
        }
        inner.check_members(organization_id, &member_ids)?;

        let members: HashSet<Uuid> = member_ids.into_iter().collect();
        let Some(entry) = inner.groups.get_mut(&group_id) else {
            return Ok(None);
        };
        entry.members = members.into_iter().collect();

        Ok(inner.groups.get(&group_id).map(|e| inner.group_with_members(e)))
    }
}
