//! PostgreSQL implementation of the attendance store traits

use attendance::models::{
    AttendanceRecord, DateRange, Group, GroupWithMembers, Member, NewSession, Organization,
    Session,
};
use attendance::{AttendanceStore, EndSessionOutcome, InsertOutcome, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::state::StoreHealth;

pub mod roster;

const MEMBER_COLUMNS: &str = "id, organization_id, external_code, first_name, last_name, grade";
const SESSION_COLUMNS: &str = "id, organization_id, date, active, ended_at, created_at";

/// Store backed by the shared connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Translate a driver error into the store taxonomy.
///
/// Constraint violations become domain errors; connectivity problems become
/// `Unavailable` so callers can offer a retry.
pub(crate) fn map_sqlx(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(db.message().to_string())
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => StoreError::NotFound {
            entity: "reference",
            id: db.constraint().unwrap_or("unknown").to_string(),
        },
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Unavailable(err.to_string()),
        _ => {
            error!("Database operation failed: {}", err);
            StoreError::Backend(err.to_string())
        }
    }
}

pub(crate) fn member_from_row(row: &PgRow) -> Member {
    Member {
        id: row.get("id"),
        organization_id: row.get("organization_id"),
        external_code: row.get("external_code"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        grade: row.get("grade"),
    }
}

pub(crate) fn group_from_row(row: &PgRow) -> Group {
    Group {
        id: row.get("id"),
        organization_id: row.get("organization_id"),
        name: row.get("name"),
    }
}

pub(crate) fn organization_from_row(row: &PgRow) -> Organization {
    Organization {
        id: row.get("id"),
        name: row.get("name"),
        code_length: row.get("code_length"),
        created_at: row.get("created_at"),
    }
}

fn session_from_row(row: &PgRow) -> Session {
    Session {
        id: row.get("id"),
        organization_id: row.get("organization_id"),
        date: row.get("date"),
        active: row.get("active"),
        ended_at: row.get("ended_at"),
        created_at: row.get("created_at"),
    }
}

fn record_from_row(row: &PgRow) -> AttendanceRecord {
    AttendanceRecord {
        member_id: row.get("member_id"),
        session_id: row.get("session_id"),
        check_in_time: row.get("check_in_time"),
    }
}

/// Attach member lists to `groups`, preserving their order
pub(crate) async fn with_members(
    conn: &mut PgConnection,
    groups: Vec<Group>,
) -> Result<Vec<GroupWithMembers>, sqlx::Error> {
    if groups.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = groups.iter().map(|g| g.id).collect();

    let rows = sqlx::query(
        r#"
        SELECT gm.group_id, m.id, m.organization_id, m.external_code,
               m.first_name, m.last_name, m.grade
        FROM group_members gm
        JOIN members m ON m.id = gm.member_id
        WHERE gm.group_id = ANY($1)
        ORDER BY m.last_name, m.first_name
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut loaded: Vec<GroupWithMembers> = groups
        .into_iter()
        .map(|group| GroupWithMembers {
            group,
            members: Vec::new(),
        })
        .collect();
    for row in rows {
        let group_id: Uuid = row.get("group_id");
        if let Some(entry) = loaded.iter_mut().find(|g| g.group.id == group_id) {
            entry.members.push(member_from_row(&row));
        }
    }
    Ok(loaded)
}

/// Fails with `NotFound` unless every id is a member of the organization
pub(crate) async fn ensure_members(
    conn: &mut PgConnection,
    organization_id: Uuid,
    member_ids: &[Uuid],
) -> StoreResult<()> {
    let mut wanted = member_ids.to_vec();
    wanted.sort();
    wanted.dedup();
    if wanted.is_empty() {
        return Ok(());
    }

    let found: Vec<Uuid> =
        sqlx::query_scalar("SELECT id FROM members WHERE organization_id = $1 AND id = ANY($2)")
            .bind(organization_id)
            .bind(&wanted)
            .fetch_all(&mut *conn)
            .await
            .map_err(map_sqlx)?;

    match wanted.iter().find(|id| !found.contains(id)) {
        Some(missing) => Err(StoreError::not_found("member", missing)),
        None => Ok(()),
    }
}

impl StoreHealth for PgStore {
    async fn is_healthy(&self) -> bool {
        common::database::health_check(&self.pool)
            .await
            .unwrap_or(false)
    }
}

impl AttendanceStore for PgStore {
    async fn find_member(
        &self,
        organization_id: Uuid,
        external_code: &str,
    ) -> StoreResult<Option<Member>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM members WHERE organization_id = $1 AND external_code = $2",
            MEMBER_COLUMNS
        ))
        .bind(organization_id)
        .bind(external_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(row.as_ref().map(member_from_row))
    }

    async fn find_session(
        &self,
        organization_id: Uuid,
        session_id: Uuid,
    ) -> StoreResult<Option<Session>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM sessions WHERE id = $1 AND organization_id = $2",
            SESSION_COLUMNS
        ))
        .bind(session_id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(row.as_ref().map(session_from_row))
    }

    async fn session_groups(&self, session_id: Uuid) -> StoreResult<Vec<GroupWithMembers>> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx)?;

        let rows = sqlx::query(
            r#"
            SELECT g.id, g.organization_id, g.name
            FROM groups g
            JOIN session_groups sg ON sg.group_id = g.id
            WHERE sg.session_id = $1
            ORDER BY g.name
            "#,
        )
        .bind(session_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx)?;

        let groups = rows.iter().map(group_from_row).collect();
        with_members(&mut conn, groups).await.map_err(map_sqlx)
    }

    async fn session_records(&self, session_id: Uuid) -> StoreResult<Vec<AttendanceRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT member_id, session_id, check_in_time
            FROM attendance_records
            WHERE session_id = $1
            ORDER BY check_in_time DESC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(rows.iter().map(record_from_row).collect())
    }

    async fn insert_attendance_if_absent(
        &self,
        member_id: Uuid,
        session_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<InsertOutcome> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        // Share lock: blocks a concurrent end_session until this insert commits.
        let active: Option<bool> =
            sqlx::query_scalar("SELECT active FROM sessions WHERE id = $1 FOR SHARE")
                .bind(session_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_sqlx)?;
        if active != Some(true) {
            tx.rollback().await.map_err(map_sqlx)?;
            return Ok(InsertOutcome::SessionClosed);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO attendance_records (member_id, session_id, check_in_time)
            VALUES ($1, $2, $3)
            ON CONFLICT (member_id, session_id) DO NOTHING
            RETURNING member_id, session_id, check_in_time
            "#,
        )
        .bind(member_id)
        .bind(session_id)
        .bind(at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                StoreError::not_found("member", member_id)
            }
            other => map_sqlx(other),
        })?;

        let outcome = match inserted {
            Some(row) => InsertOutcome::Created(record_from_row(&row)),
            None => {
                let row = sqlx::query(
                    r#"
                    SELECT member_id, session_id, check_in_time
                    FROM attendance_records
                    WHERE member_id = $1 AND session_id = $2
                    "#,
                )
                .bind(member_id)
                .bind(session_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(map_sqlx)?;
                InsertOutcome::AlreadyExists(record_from_row(&row))
            }
        };

        tx.commit().await.map_err(map_sqlx)?;
        Ok(outcome)
    }

    async fn list_sessions(
        &self,
        organization_id: Uuid,
        range: DateRange,
    ) -> StoreResult<Vec<Session>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM sessions
            WHERE organization_id = $1
              AND ($2::date IS NULL OR date >= $2)
              AND ($3::date IS NULL OR date <= $3)
            ORDER BY date DESC, created_at DESC
            "#,
            SESSION_COLUMNS
        ))
        .bind(organization_id)
        .bind(range.from)
        .bind(range.to)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(rows.iter().map(session_from_row).collect())
    }

    async fn list_active_sessions(&self, organization_id: Uuid) -> StoreResult<Vec<Session>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM sessions
            WHERE organization_id = $1 AND active
            ORDER BY date DESC, created_at DESC
            "#,
            SESSION_COLUMNS
        ))
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(rows.iter().map(session_from_row).collect())
    }

    async fn create_session(
        &self,
        organization_id: Uuid,
        input: NewSession,
    ) -> StoreResult<Session> {
        let mut group_ids = input.group_ids;
        group_ids.sort();
        group_ids.dedup();

        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let owned: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM groups WHERE organization_id = $1 AND id = ANY($2)")
                .bind(organization_id)
                .bind(&group_ids)
                .fetch_all(&mut *tx)
                .await
                .map_err(map_sqlx)?;
        if let Some(missing) = group_ids.iter().find(|id| !owned.contains(id)) {
            return Err(StoreError::not_found("group", missing));
        }

        let date = input.date.unwrap_or_else(|| Utc::now().date_naive());
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO sessions (id, organization_id, date)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            SESSION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(organization_id)
        .bind(date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                StoreError::not_found("organization", organization_id)
            }
            other => map_sqlx(other),
        })?;
        let session = session_from_row(&row);

        sqlx::query(
            "INSERT INTO session_groups (session_id, group_id) SELECT $1, UNNEST($2::uuid[])",
        )
        .bind(session.id)
        .bind(&group_ids)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)?;
        debug!(
            "Created session {} with {} groups",
            session.id,
            group_ids.len()
        );
        Ok(session)
    }

    async fn end_session(
        &self,
        organization_id: Uuid,
        session_id: Uuid,
    ) -> StoreResult<EndSessionOutcome> {
        let ended = sqlx::query(&format!(
            r#"
            UPDATE sessions
            SET active = FALSE, ended_at = NOW()
            WHERE id = $1 AND organization_id = $2 AND active
            RETURNING {}
            "#,
            SESSION_COLUMNS
        ))
        .bind(session_id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if let Some(row) = ended {
            info!("Session {} ended", session_id);
            return Ok(EndSessionOutcome::Ended(session_from_row(&row)));
        }

        match self.find_session(organization_id, session_id).await? {
            Some(session) => Ok(EndSessionOutcome::AlreadyEnded(session)),
            None => Ok(EndSessionOutcome::NotFound),
        }
    }

    async fn delete_session(&self, organization_id: Uuid, session_id: Uuid) -> StoreResult<bool> {
        // session_groups and attendance_records cascade
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1 AND organization_id = $2")
            .bind(session_id)
            .bind(organization_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!("Deleted session {} in organization {}", session_id, organization_id);
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attendance::models::{NewMember, NewOrganization};
    use attendance::RosterStore;
    use common::database::{DatabaseConfig, init_pool, run_migrations};

    async fn store() -> PgStore {
        let config = DatabaseConfig::from_env().unwrap();
        let pool = init_pool(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();
        PgStore::new(pool)
    }

    async fn seeded(store: &PgStore) -> (Organization, Member, Session) {
        let org = store
            .create_organization(NewOrganization {
                name: format!("org-{}", Uuid::new_v4()),
                code_length: None,
            })
            .await
            .unwrap();
        let member = store
            .create_member(
                org.id,
                NewMember {
                    external_code: "111".to_string(),
                    first_name: "Ada".to_string(),
                    last_name: "Lovelace".to_string(),
                    grade: None,
                },
            )
            .await
            .unwrap();
        let session = store
            .create_session(org.id, NewSession::default())
            .await
            .unwrap();
        (org, member, session)
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL at DATABASE_URL"]
    async fn test_concurrent_inserts_create_one_record() {
        let store = store().await;
        let (_, member, session) = seeded(&store).await;

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .insert_attendance_if_absent(member.id, session.id, Utc::now())
                    .await
            }));
        }

        let mut created = 0;
        for handle in handles {
            if let InsertOutcome::Created(_) = handle.await.unwrap().unwrap() {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(store.session_records(session.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL at DATABASE_URL"]
    async fn test_insert_after_end_is_refused() {
        let store = store().await;
        let (org, member, session) = seeded(&store).await;

        let ended = store.end_session(org.id, session.id).await.unwrap();
        assert!(matches!(ended, EndSessionOutcome::Ended(_)));
        let again = store.end_session(org.id, session.id).await.unwrap();
        assert!(matches!(again, EndSessionOutcome::AlreadyEnded(_)));

        let outcome = store
            .insert_attendance_if_absent(member.id, session.id, Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome, InsertOutcome::SessionClosed);
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL at DATABASE_URL"]
    async fn test_ended_session_cannot_be_reactivated() {
        let store = store().await;
        let (org, _, session) = seeded(&store).await;
        store.end_session(org.id, session.id).await.unwrap();

        let result = sqlx::query("UPDATE sessions SET active = TRUE WHERE id = $1")
            .bind(session.id)
            .execute(&store.pool)
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL at DATABASE_URL"]
    async fn test_deleting_member_removes_records() {
        let store = store().await;
        let (org, member, session) = seeded(&store).await;
        store
            .insert_attendance_if_absent(member.id, session.id, Utc::now())
            .await
            .unwrap();

        assert!(store.delete_member(org.id, member.id).await.unwrap());
        assert!(store.session_records(session.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL at DATABASE_URL"]
    async fn test_deleting_session_removes_records() {
        let store = store().await;
        let (org, member, session) = seeded(&store).await;
        store
            .insert_attendance_if_absent(member.id, session.id, Utc::now())
            .await
            .unwrap();

        assert!(!store.delete_session(Uuid::new_v4(), session.id).await.unwrap());
        assert!(store.delete_session(org.id, session.id).await.unwrap());
        assert!(store.session_records(session.id).await.unwrap().is_empty());
        assert!(store.find_session(org.id, session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL at DATABASE_URL"]
    async fn test_all_group_membership_is_not_replaceable() {
        let store = store().await;
        let (org, _, _) = seeded(&store).await;
        let all = store
            .list_groups(org.id)
            .await
            .unwrap()
            .into_iter()
            .find(|g| g.group.name == attendance::models::ALL_GROUP_NAME)
            .unwrap();

        let result = store
            .replace_group_members(org.id, all.group.id, Vec::new())
            .await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }
}
