//! Integration tests for the database infrastructure
//!
//! These tests need a PostgreSQL server reachable through `DATABASE_URL`
//! and are ignored by default.

use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
use sqlx::Row;

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn test_database_is_reachable_and_migrated() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    // Applying twice must be a no-op
    run_migrations(&pool).await?;
    run_migrations(&pool).await?;

    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS tables
        FROM information_schema.tables
        WHERE table_schema = 'public'
          AND table_name IN ('organizations', 'members', 'groups', 'group_members',
                             'sessions', 'session_groups', 'attendance_records')
        "#,
    )
    .fetch_one(&pool)
    .await?;

    let tables: i64 = row.get("tables");
    assert_eq!(tables, 7, "attendance schema is incomplete");

    Ok(())
}

#[tokio::test]
#[ignore = "requires PostgreSQL at DATABASE_URL"]
async fn test_attendance_pair_is_unique() -> Result<(), Box<dyn std::error::Error>> {
    let pool = init_pool(&DatabaseConfig::from_env()?).await?;
    run_migrations(&pool).await?;

    let mut tx = pool.begin().await?;
    let org = uuid_v4(&mut tx).await?;
    sqlx::query("INSERT INTO organizations (id, name) VALUES ($1::uuid, 'Unique pair test')")
        .bind(&org)
        .execute(&mut *tx)
        .await?;
    let member = uuid_v4(&mut tx).await?;
    sqlx::query(
        "INSERT INTO members (id, organization_id, external_code, first_name, last_name) \
         VALUES ($1::uuid, $2::uuid, '111', 'Ada', 'Lovelace')",
    )
    .bind(&member)
    .bind(&org)
    .execute(&mut *tx)
    .await?;
    let session = uuid_v4(&mut tx).await?;
    sqlx::query("INSERT INTO sessions (id, organization_id, date) VALUES ($1::uuid, $2::uuid, CURRENT_DATE)")
        .bind(&session)
        .bind(&org)
        .execute(&mut *tx)
        .await?;

    let insert = "INSERT INTO attendance_records (member_id, session_id, check_in_time) \
                  VALUES ($1::uuid, $2::uuid, NOW())";
    sqlx::query(insert)
        .bind(&member)
        .bind(&session)
        .execute(&mut *tx)
        .await?;
    let duplicate = sqlx::query(insert)
        .bind(&member)
        .bind(&session)
        .execute(&mut *tx)
        .await;

    match duplicate {
        Err(sqlx::Error::Database(e)) => assert!(e.is_unique_violation()),
        other => panic!("expected a unique violation, got {:?}", other),
    }

    tx.rollback().await?;
    Ok(())
}

/// Server-generated id as text; keeps this crate free of a uuid dependency
async fn uuid_v4(conn: &mut sqlx::PgConnection) -> Result<String, sqlx::Error> {
    sqlx::query_scalar("SELECT gen_random_uuid()::text")
        .fetch_one(conn)
        .await
}
