//! API models for request and response payloads

use attendance::models::DateRange;
use attendance::ReportQuery;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query string of the member attendance report
#[derive(Debug, Default, Deserialize)]
pub struct ReportParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub ended_only: bool,
}

impl ReportParams {
    pub fn into_query(self) -> Result<ReportQuery, String> {
        let range = DateRange::new(self.from, self.to);
        if range.is_inverted() {
            return Err("'from' must not be after 'to'".to_string());
        }
        Ok(ReportQuery {
            range,
            ended_only: self.ended_only,
        })
    }
}

/// `?organization_id=` on session-scoped reads
#[derive(Debug, Deserialize)]
pub struct OrgScope {
    pub organization_id: Uuid,
}

/// Body of `PUT /organizations/:id/groups/:group_id/members`
#[derive(Debug, Deserialize)]
pub struct ReplaceMembersRequest {
    pub member_ids: Vec<Uuid>,
}

/// Health check payload
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub store: &'static str,
}
