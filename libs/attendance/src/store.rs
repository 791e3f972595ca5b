//! Persistence traits for the attendance core
//!
//! All operations are async and tenant-scoped where the entity belongs to an
//! organization. Implementations must enforce uniqueness of
//! `(member_id, session_id)` themselves; callers never check-then-insert.

use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{
    AttendanceRecord, DateRange, GroupWithMembers, Member, NewGroup, NewMember, NewOrganization,
    NewSession, Organization, Session,
};

/// Result of [`AttendanceStore::insert_attendance_if_absent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new record was written
    Created(AttendanceRecord),
    /// The pair was already recorded; carries the existing record
    AlreadyExists(AttendanceRecord),
    /// The session ended (or vanished) before the insert could take its lock
    SessionClosed,
}

/// Result of [`AttendanceStore::end_session`]
#[derive(Debug, Clone, PartialEq)]
pub enum EndSessionOutcome {
    Ended(Session),
    AlreadyEnded(Session),
    NotFound,
}

pub trait AttendanceStore: Send + Sync {
    fn find_member(
        &self,
        organization_id: Uuid,
        external_code: &str,
    ) -> impl Future<Output = StoreResult<Option<Member>>> + Send;

    fn find_session(
        &self,
        organization_id: Uuid,
        session_id: Uuid,
    ) -> impl Future<Output = StoreResult<Option<Session>>> + Send;

    /// Groups attached to the session, each with its members loaded
    fn session_groups(
        &self,
        session_id: Uuid,
    ) -> impl Future<Output = StoreResult<Vec<GroupWithMembers>>> + Send;

    fn session_records(
        &self,
        session_id: Uuid,
    ) -> impl Future<Output = StoreResult<Vec<AttendanceRecord>>> + Send;

    /// Atomically record a check-in unless one exists for the pair.
    ///
    /// Must be serialised against [`end_session`](Self::end_session) for the
    /// same session so that a late check-in is either fully accepted or
    /// reported as [`InsertOutcome::SessionClosed`].
    fn insert_attendance_if_absent(
        &self,
        member_id: Uuid,
        session_id: Uuid,
        at: DateTime<Utc>,
    ) -> impl Future<Output = StoreResult<InsertOutcome>> + Send;

    /// Sessions dated inside `range`, newest first
    fn list_sessions(
        &self,
        organization_id: Uuid,
        range: DateRange,
    ) -> impl Future<Output = StoreResult<Vec<Session>>> + Send;

    fn list_active_sessions(
        &self,
        organization_id: Uuid,
    ) -> impl Future<Output = StoreResult<Vec<Session>>> + Send;

    fn create_session(
        &self,
        organization_id: Uuid,
        input: NewSession,
    ) -> impl Future<Output = StoreResult<Session>> + Send;

    /// One-way transition to `active = false`
    fn end_session(
        &self,
        organization_id: Uuid,
        session_id: Uuid,
    ) -> impl Future<Output = StoreResult<EndSessionOutcome>> + Send;

    /// Remove the session with its group links and attendance records.
    /// Returns `false` if no such session exists in the organization.
    fn delete_session(
        &self,
        organization_id: Uuid,
        session_id: Uuid,
    ) -> impl Future<Output = StoreResult<bool>> + Send;
}

/// Roster maintenance consumed from the organization/member management side
pub trait RosterStore: Send + Sync {
    /// Creates the organization together with its "All" group
    fn create_organization(
        &self,
        input: NewOrganization,
    ) -> impl Future<Output = StoreResult<Organization>> + Send;

    fn find_organization(
        &self,
        id: Uuid,
    ) -> impl Future<Output = StoreResult<Option<Organization>>> + Send;

    /// Creates the member and links it into the "All" group
    fn create_member(
        &self,
        organization_id: Uuid,
        input: NewMember,
    ) -> impl Future<Output = StoreResult<Member>> + Send;

    /// Returns `false` if no such member exists in the organization
    fn delete_member(
        &self,
        organization_id: Uuid,
        member_id: Uuid,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    fn create_group(
        &self,
        organization_id: Uuid,
        input: NewGroup,
    ) -> impl Future<Output = StoreResult<GroupWithMembers>> + Send;

    /// All groups of the organization with members, ordered by name
    fn list_groups(
        &self,
        organization_id: Uuid,
    ) -> impl Future<Output = StoreResult<Vec<GroupWithMembers>>> + Send;

    /// Replace the group's whole member set; `None` if the group is unknown.
    /// The "All" group is refused with [`StoreError::Conflict`].
    fn replace_group_members(
        &self,
        organization_id: Uuid,
        group_id: Uuid,
        member_ids: Vec<Uuid>,
    ) -> impl Future<Output = StoreResult<Option<GroupWithMembers>>> + Send;
}

/// Run a store call with a request-level deadline.
///
/// A call that misses the deadline is reported as failed, never as done.
pub async fn with_timeout<T>(
    limit: Duration,
    call: impl Future<Output = StoreResult<T>>,
) -> StoreResult<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}
