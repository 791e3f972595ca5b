//! Check-In Recorder
//!
//! Resolves a scanned code to a member of the session's organization and
//! records at most one attendance record per `(member, session)` pair. Every
//! store-level failure is resolved to a [`CheckInOutcome`] or to
//! [`CheckInError::StoreUnavailable`]; no backend error escapes as-is.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{AttendanceRecord, Member};
use crate::store::{AttendanceStore, InsertOutcome, with_timeout};
use crate::validation::validate_external_code;

/// Wire form of a check-in result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInStatus {
    Recorded,
    AlreadyRecorded,
    MemberNotFound,
    SessionNotFound,
    SessionInactive,
}

/// Every non-failure result of a check-in attempt
#[derive(Debug, Clone, PartialEq)]
pub enum CheckInOutcome {
    /// First check-in for the pair; exactly one record was written
    Recorded {
        member: Member,
        record: AttendanceRecord,
    },
    /// The pair was already recorded; nothing was written
    AlreadyRecorded {
        member: Member,
        record: AttendanceRecord,
    },
    MemberNotFound {
        code: String,
    },
    SessionNotFound,
    SessionInactive,
}

impl CheckInOutcome {
    pub fn status(&self) -> CheckInStatus {
        match self {
            Self::Recorded { .. } => CheckInStatus::Recorded,
            Self::AlreadyRecorded { .. } => CheckInStatus::AlreadyRecorded,
            Self::MemberNotFound { .. } => CheckInStatus::MemberNotFound,
            Self::SessionNotFound => CheckInStatus::SessionNotFound,
            Self::SessionInactive => CheckInStatus::SessionInactive,
        }
    }

    pub fn member(&self) -> Option<&Member> {
        match self {
            Self::Recorded { member, .. } | Self::AlreadyRecorded { member, .. } => Some(member),
            _ => None,
        }
    }

    pub fn record(&self) -> Option<&AttendanceRecord> {
        match self {
            Self::Recorded { record, .. } | Self::AlreadyRecorded { record, .. } => Some(record),
            _ => None,
        }
    }

    /// Human-readable confirmation for the kiosk
    pub fn message(&self) -> String {
        match self {
            Self::Recorded { member, .. } => format!("Welcome, {}!", member.display_name()),
            Self::AlreadyRecorded { member, .. } => {
                format!("Welcome back, {}. You are already checked in.", member.display_name())
            }
            Self::MemberNotFound { code } => format!("{} not found", code),
            Self::SessionNotFound => "Session not found".to_string(),
            Self::SessionInactive => "This session has ended".to_string(),
        }
    }
}

/// The one hard failure of a check-in: the store could not answer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CheckInError {
    #[error("attendance store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),
}

#[derive(Debug, Clone)]
pub struct CheckInRecorder<S> {
    store: S,
    timeout: Duration,
}

impl<S: AttendanceStore> CheckInRecorder<S> {
    /// `timeout` bounds every individual store call
    pub fn new(store: S, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn record_check_in(
        &self,
        organization_id: Uuid,
        session_id: Uuid,
        external_code: &str,
    ) -> Result<CheckInOutcome, CheckInError> {
        let code = external_code.trim();

        if let Err(reason) = validate_external_code(code) {
            info!("Rejected malformed code for session {}: {}", session_id, reason);
            return Ok(CheckInOutcome::MemberNotFound {
                code: code.to_string(),
            });
        }

        let member = match self
            .bounded(self.store.find_member(organization_id, code))
            .await?
        {
            Some(member) => member,
            None => {
                info!(
                    "No member with code {} in organization {}",
                    code, organization_id
                );
                return Ok(CheckInOutcome::MemberNotFound {
                    code: code.to_string(),
                });
            }
        };

        let session = match self
            .bounded(self.store.find_session(organization_id, session_id))
            .await?
        {
            Some(session) => session,
            None => {
                info!(
                    "Session {} not found in organization {}",
                    session_id, organization_id
                );
                return Ok(CheckInOutcome::SessionNotFound);
            }
        };

        if !session.active {
            info!("Session {} has ended; refusing check-in", session.id);
            return Ok(CheckInOutcome::SessionInactive);
        }

        let inserted = self
            .store
            .insert_attendance_if_absent(member.id, session.id, Utc::now());

        match with_timeout(self.timeout, inserted).await {
            Ok(InsertOutcome::Created(record)) => {
                info!("Recorded check-in of member {} for session {}", member.id, session.id);
                Ok(CheckInOutcome::Recorded { member, record })
            }
            Ok(InsertOutcome::AlreadyExists(record)) => {
                info!(
                    "Member {} already checked in to session {} at {}",
                    member.id, session.id, record.check_in_time
                );
                Ok(CheckInOutcome::AlreadyRecorded { member, record })
            }
            Ok(InsertOutcome::SessionClosed) => {
                info!("Session {} ended before check-in could be recorded", session.id);
                Ok(CheckInOutcome::SessionInactive)
            }
            // Concurrent deletion between lookup and insert.
            Err(StoreError::NotFound { entity: "member", .. }) => {
                Ok(CheckInOutcome::MemberNotFound {
                    code: code.to_string(),
                })
            }
            Err(StoreError::NotFound { entity: "session", .. }) => {
                Ok(CheckInOutcome::SessionNotFound)
            }
            Err(e) => Err(self.unavailable(e)),
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, CheckInError> {
        with_timeout(self.timeout, call)
            .await
            .map_err(|e| self.unavailable(e))
    }

    fn unavailable(&self, error: StoreError) -> CheckInError {
        warn!("Check-in could not reach the attendance store: {}", error);
        CheckInError::StoreUnavailable(error)
    }
}
