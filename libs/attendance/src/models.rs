//! Attendance domain models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the group every member of an organization belongs to
pub const ALL_GROUP_NAME: &str = "All";

/// Tenant boundary owning members, groups and sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    /// Expected length of a scanned external code, if the organization uses
    /// fixed-width badges
    pub code_length: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// New organization creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    #[serde(default)]
    pub code_length: Option<i32>,
}

/// A person whose attendance is tracked
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub organization_id: Uuid,
    /// Scanned identifier, unique within the organization
    pub external_code: String,
    pub first_name: String,
    pub last_name: String,
    pub grade: Option<String>,
}

impl Member {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// New member creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMember {
    pub external_code: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub grade: Option<String>,
}

/// Named subset of an organization's members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
}

/// A group with its member set loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupWithMembers {
    #[serde(flatten)]
    pub group: Group,
    pub members: Vec<Member>,
}

/// New group creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGroup {
    pub name: String,
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

/// A dated attendance event attached to one or more groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub date: NaiveDate,
    /// Starts `true`; set to `false` once when the session ends
    pub active: bool,
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// New session creation payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSession {
    /// Defaults to today (UTC)
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub group_ids: Vec<Uuid>,
}

/// Proof that a member checked in to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub member_id: Uuid,
    pub session_id: Uuid,
    pub check_in_time: DateTime<Utc>,
}

/// Inclusive date range; a missing bound is unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }

    /// `true` when both bounds are set and `from` is after `to`
    pub fn is_inverted(&self) -> bool {
        matches!((self.from, self.to), (Some(from), Some(to)) if from > to)
    }
}
