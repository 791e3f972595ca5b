//! Roster maintenance on PostgreSQL

use attendance::models::{
    ALL_GROUP_NAME, GroupWithMembers, Member, NewGroup, NewMember, NewOrganization, Organization,
};
use attendance::{RosterStore, StoreError, StoreResult};
use sqlx::Row;
use tracing::info;
use uuid::Uuid;

use super::{
    MEMBER_COLUMNS, PgStore, ensure_members, group_from_row, map_sqlx, member_from_row,
    organization_from_row, with_members,
};

impl RosterStore for PgStore {
    async fn create_organization(&self, input: NewOrganization) -> StoreResult<Organization> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let row = sqlx::query(
            r#"
            INSERT INTO organizations (id, name, code_length)
            VALUES ($1, $2, $3)
            RETURNING id, name, code_length, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.name.trim())
        .bind(input.code_length)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx)?;
        let organization = organization_from_row(&row);

        sqlx::query("INSERT INTO groups (id, organization_id, name) VALUES ($1, $2, $3)")
            .bind(Uuid::new_v4())
            .bind(organization.id)
            .bind(ALL_GROUP_NAME)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)?;
        info!("Created organization {}", organization.id);
        Ok(organization)
    }

    async fn find_organization(&self, id: Uuid) -> StoreResult<Option<Organization>> {
        let row = sqlx::query(
            "SELECT id, name, code_length, created_at FROM organizations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(row.as_ref().map(organization_from_row))
    }

    async fn create_member(&self, organization_id: Uuid, input: NewMember) -> StoreResult<Member> {
        let code = input.external_code.trim().to_string();
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO members (id, organization_id, external_code, first_name, last_name, grade)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            MEMBER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(organization_id)
        .bind(&code)
        .bind(input.first_name.trim())
        .bind(input.last_name.trim())
        .bind(input.grade.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| match map_sqlx(err) {
            StoreError::Conflict(_) => {
                StoreError::Conflict(format!("member code {} already exists", code))
            }
            StoreError::NotFound { .. } => StoreError::not_found("organization", organization_id),
            other => other,
        })?;
        let member = member_from_row(&row);

        sqlx::query(
            r#"
            INSERT INTO group_members (group_id, member_id)
            SELECT id, $2 FROM groups WHERE organization_id = $1 AND name = $3
            "#,
        )
        .bind(organization_id)
        .bind(member.id)
        .bind(ALL_GROUP_NAME)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)?;
        Ok(member)
    }

    async fn delete_member(&self, organization_id: Uuid, member_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM members WHERE id = $1 AND organization_id = $2")
            .bind(member_id)
            .bind(organization_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_group(
        &self,
        organization_id: Uuid,
        input: NewGroup,
    ) -> StoreResult<GroupWithMembers> {
        let name = input.name.trim().to_string();
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        ensure_members(&mut tx, organization_id, &input.member_ids).await?;

        let row = sqlx::query(
            r#"
            INSERT INTO groups (id, organization_id, name)
            VALUES ($1, $2, $3)
            RETURNING id, organization_id, name
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(organization_id)
        .bind(&name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| match map_sqlx(err) {
            StoreError::Conflict(_) => StoreError::Conflict(format!("group {} already exists", name)),
            StoreError::NotFound { .. } => StoreError::not_found("organization", organization_id),
            other => other,
        })?;
        let group = group_from_row(&row);

        sqlx::query(
            "INSERT INTO group_members (group_id, member_id) SELECT $1, UNNEST($2::uuid[]) ON CONFLICT DO NOTHING",
        )
        .bind(group.id)
        .bind(&input.member_ids)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        let mut loaded = with_members(&mut tx, vec![group]).await.map_err(map_sqlx)?;
        tx.commit().await.map_err(map_sqlx)?;
        loaded
            .pop()
            .ok_or_else(|| StoreError::Backend("created group vanished".to_string()))
    }

    async fn list_groups(&self, organization_id: Uuid) -> StoreResult<Vec<GroupWithMembers>> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx)?;

        let rows = sqlx::query(
            "SELECT id, organization_id, name FROM groups WHERE organization_id = $1 ORDER BY name",
        )
        .bind(organization_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx)?;

        let groups = rows.iter().map(group_from_row).collect();
        with_members(&mut conn, groups).await.map_err(map_sqlx)
    }

    async fn replace_group_members(
        &self,
        organization_id: Uuid,
        group_id: Uuid,
        member_ids: Vec<Uuid>,
    ) -> StoreResult<Option<GroupWithMembers>> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let row = sqlx::query(
            "SELECT id, organization_id, name FROM groups WHERE id = $1 AND organization_id = $2 FOR UPDATE",
        )
        .bind(group_id)
        .bind(organization_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let group = group_from_row(&row);
        if group.name == ALL_GROUP_NAME {
            return Err(StoreError::Conflict(format!(
                "{} group always holds every member",
                ALL_GROUP_NAME
            )));
        }
        ensure_members(&mut tx, organization_id, &member_ids).await?;

        sqlx::query("DELETE FROM group_members WHERE group_id = $1")
            .bind(group_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        sqlx::query(
            "INSERT INTO group_members (group_id, member_id) SELECT $1, UNNEST($2::uuid[]) ON CONFLICT DO NOTHING",
        )
        .bind(group_id)
        .bind(&member_ids)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        let members: i64 =
            sqlx::query("SELECT COUNT(*) AS n FROM group_members WHERE group_id = $1")
                .bind(group_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(map_sqlx)?
                .get("n");
        let mut loaded = with_members(&mut tx, vec![group]).await.map_err(map_sqlx)?;
        tx.commit().await.map_err(map_sqlx)?;
        info!("Group {} now has {} members", group_id, members);
        Ok(loaded.pop())
    }
}
