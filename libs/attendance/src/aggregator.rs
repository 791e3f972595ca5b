//! Attendance Aggregator
//!
//! Read-only views over sessions and attendance records. Results are
//! point-in-time snapshots; check-ins arriving during aggregation may or may
//! not be reflected.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::{AttendanceRecord, DateRange, Member, Session};
use crate::resolver::eligible_members;
use crate::store::{AttendanceStore, with_timeout};

/// A present member and when they checked in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentMember {
    pub member: Member,
    pub check_in_time: DateTime<Utc>,
}

/// Present/absent partition of one session's eligible members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAttendance {
    pub session: Session,
    /// Most recent check-in first
    pub present: Vec<PresentMember>,
    pub absent: Vec<Member>,
    pub total_eligible: usize,
}

/// One member's totals over a date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberAttendance {
    pub member: Member,
    pub total_eligible_sessions: u32,
    pub attended: u32,
    pub absent: u32,
    /// Percentage in `[0, 100]`
    pub attendance_rate: f64,
}

/// Which sessions a report covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportQuery {
    pub range: DateRange,
    /// Only count sessions that have ended
    pub ended_only: bool,
}

/// Split `eligible` into present and absent using the session's records.
///
/// Records of members outside the eligible set are ignored, so
/// `present.len() + absent.len() == eligible.len()` always holds.
pub fn partition(
    eligible: Vec<Member>,
    records: &[AttendanceRecord],
) -> (Vec<PresentMember>, Vec<Member>) {
    let check_ins: HashMap<Uuid, DateTime<Utc>> = records
        .iter()
        .map(|record| (record.member_id, record.check_in_time))
        .collect();

    let mut present = Vec::new();
    let mut absent = Vec::new();
    for member in eligible {
        match check_ins.get(&member.id) {
            Some(&check_in_time) => present.push(PresentMember {
                member,
                check_in_time,
            }),
            None => absent.push(member),
        }
    }

    present.sort_by(|a, b| {
        b.check_in_time
            .cmp(&a.check_in_time)
            .then_with(|| a.member.id.cmp(&b.member.id))
    });
    (present, absent)
}

/// `attended / eligible * 100`, or `0` when nothing was eligible
pub fn attendance_rate(attended: u32, total_eligible: u32) -> f64 {
    if total_eligible == 0 {
        0.0
    } else {
        f64::from(attended) / f64::from(total_eligible) * 100.0
    }
}

#[derive(Debug)]
struct Tally {
    member: Member,
    eligible: u32,
    attended: u32,
}

/// Accumulates per-member totals session by session
#[derive(Debug, Default)]
pub struct ReportBuilder {
    tallies: HashMap<Uuid, Tally>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one session: every eligible member gains an eligible session,
    /// and those in `present_ids` an attended one.
    pub fn add_session(&mut self, eligible: &[Member], present_ids: &HashSet<Uuid>) {
        for member in eligible {
            let tally = self.tallies.entry(member.id).or_insert_with(|| Tally {
                member: member.clone(),
                eligible: 0,
                attended: 0,
            });
            tally.eligible += 1;
            if present_ids.contains(&member.id) {
                tally.attended += 1;
            }
        }
    }

    /// Rows for every member seen in at least one eligible set, unordered
    pub fn finish(self) -> Vec<MemberAttendance> {
        self.tallies
            .into_values()
            .map(|tally| MemberAttendance {
                absent: tally.eligible - tally.attended,
                attendance_rate: attendance_rate(tally.attended, tally.eligible),
                total_eligible_sessions: tally.eligible,
                attended: tally.attended,
                member: tally.member,
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct AttendanceAggregator<S> {
    store: S,
    timeout: Duration,
}

impl<S: AttendanceStore> AttendanceAggregator<S> {
    pub fn new(store: S, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Present/absent view of one session; `None` if it is not in the
    /// organization
    pub async fn session_attendance(
        &self,
        organization_id: Uuid,
        session_id: Uuid,
    ) -> StoreResult<Option<SessionAttendance>> {
        let Some(session) = with_timeout(
            self.timeout,
            self.store.find_session(organization_id, session_id),
        )
        .await?
        else {
            return Ok(None);
        };

        let (eligible, records) = self.load(&session).await?;
        let total_eligible = eligible.len();
        let (present, absent) = partition(eligible, &records);

        debug!(
            "Session {}: {} present, {} absent",
            session.id,
            present.len(),
            absent.len()
        );

        Ok(Some(SessionAttendance {
            session,
            present,
            absent,
            total_eligible,
        }))
    }

    /// Per-member totals over the sessions selected by `query`
    pub async fn member_attendance_report(
        &self,
        organization_id: Uuid,
        query: ReportQuery,
    ) -> StoreResult<Vec<MemberAttendance>> {
        let sessions = with_timeout(
            self.timeout,
            self.store.list_sessions(organization_id, query.range),
        )
        .await?;

        let mut builder = ReportBuilder::new();
        let mut counted = 0usize;
        for session in sessions
            .iter()
            .filter(|session| !query.ended_only || !session.active)
        {
            let (eligible, records) = self.load(session).await?;
            let present_ids: HashSet<Uuid> =
                records.iter().map(|record| record.member_id).collect();
            builder.add_session(&eligible, &present_ids);
            counted += 1;
        }

        let rows = builder.finish();
        info!(
            "Attendance report for organization {}: {} sessions, {} members",
            organization_id,
            counted,
            rows.len()
        );
        Ok(rows)
    }

    async fn load(&self, session: &Session) -> StoreResult<(Vec<Member>, Vec<AttendanceRecord>)> {
        let groups = with_timeout(self.timeout, self.store.session_groups(session.id)).await?;
        let records = with_timeout(self.timeout, self.store.session_records(session.id)).await?;
        Ok((eligible_members(&groups), records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn member(code: &str) -> Member {
        Member {
            id: Uuid::new_v4(),
            organization_id: Uuid::nil(),
            external_code: code.to_string(),
            first_name: format!("First{}", code),
            last_name: format!("Last{}", code),
            grade: None,
        }
    }

    fn record(member: &Member, minute: u32) -> AttendanceRecord {
        AttendanceRecord {
            member_id: member.id,
            session_id: Uuid::nil(),
            check_in_time: Utc.with_ymd_and_hms(2025, 3, 4, 18, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_partition_orders_present_most_recent_first() {
        let a = member("111");
        let b = member("222");
        let c = member("333");
        let records = vec![record(&a, 1), record(&b, 5)];

        let (present, absent) = partition(vec![a.clone(), b.clone(), c.clone()], &records);

        let present_ids: Vec<Uuid> = present.iter().map(|p| p.member.id).collect();
        assert_eq!(present_ids, vec![b.id, a.id]);
        assert_eq!(absent, vec![c]);
    }

    #[test]
    fn test_partition_ignores_records_of_non_eligible_members() {
        let a = member("111");
        let outsider = member("999");
        let records = vec![record(&outsider, 2)];

        let (present, absent) = partition(vec![a.clone()], &records);
        assert!(present.is_empty());
        assert_eq!(absent.len(), 1);
    }

    #[test]
    fn test_rate_for_three_of_four() {
        assert_eq!(attendance_rate(3, 4), 75.0);
    }

    #[test]
    fn test_rate_never_divides_by_zero() {
        assert_eq!(attendance_rate(0, 0), 0.0);
    }

    #[test]
    fn test_builder_counts_eligible_and_attended() {
        let a = member("111");
        let b = member("222");
        let mut builder = ReportBuilder::new();

        let everyone = vec![a.clone(), b.clone()];
        for present in [vec![a.id], vec![a.id, b.id], vec![a.id], vec![]] {
            let present_ids: HashSet<Uuid> = present.into_iter().collect();
            builder.add_session(&everyone, &present_ids);
        }

        let rows = builder.finish();
        let row_a = rows.iter().find(|r| r.member.id == a.id).unwrap();
        assert_eq!(row_a.total_eligible_sessions, 4);
        assert_eq!(row_a.attended, 3);
        assert_eq!(row_a.absent, 1);
        assert_eq!(row_a.attendance_rate, 75.0);

        let row_b = rows.iter().find(|r| r.member.id == b.id).unwrap();
        assert_eq!(row_b.attended, 1);
        assert_eq!(row_b.attendance_rate, 25.0);
    }

    #[test]
    fn test_builder_omits_members_never_eligible() {
        let builder = ReportBuilder::new();
        assert!(builder.finish().is_empty());
    }
}
