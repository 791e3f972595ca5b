//! JSON payloads shared by the HTTP service and the kiosk

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Member, Session};
use crate::recorder::{CheckInOutcome, CheckInStatus};

/// Body of `POST /sessions/:session_id/check-in`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInRequest {
    pub external_code: String,
    pub organization_id: Uuid,
}

/// Answer to a check-in attempt that reached the recorder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInResponse {
    pub status: CheckInStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<Member>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_in_time: Option<DateTime<Utc>>,
}

impl From<&CheckInOutcome> for CheckInResponse {
    fn from(outcome: &CheckInOutcome) -> Self {
        Self {
            status: outcome.status(),
            message: outcome.message(),
            member: outcome.member().cloned(),
            check_in_time: outcome.record().map(|record| record.check_in_time),
        }
    }
}

/// Answer to `POST /organizations/:id/sessions/:session_id/end`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndSessionResponse {
    /// `false` when the session had already ended
    pub ended: bool,
    pub session: Session,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttendanceRecord;

    #[test]
    fn test_response_from_already_recorded() {
        let member = Member {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            external_code: "111".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            grade: None,
        };
        let record = AttendanceRecord {
            member_id: member.id,
            session_id: Uuid::new_v4(),
            check_in_time: Utc::now(),
        };
        let outcome = CheckInOutcome::AlreadyRecorded {
            member: member.clone(),
            record,
        };

        let response = CheckInResponse::from(&outcome);

        assert_eq!(response.status, CheckInStatus::AlreadyRecorded);
        assert_eq!(response.member, Some(member));
        assert_eq!(response.check_in_time, Some(record.check_in_time));
        assert!(response.message.starts_with("Welcome back, Ada Lovelace"));
    }

    #[test]
    fn test_not_found_omits_member_fields() {
        let outcome = CheckInOutcome::MemberNotFound {
            code: "999".to_string(),
        };

        let json = serde_json::to_value(CheckInResponse::from(&outcome)).unwrap();

        assert_eq!(json["status"], "member_not_found");
        assert_eq!(json["message"], "999 not found");
        assert!(json.get("member").is_none());
        assert!(json.get("check_in_time").is_none());
    }
}
