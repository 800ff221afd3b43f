use anyhow::Result;
use sqlx::migrate::Migrator;
use sqlx::SqlitePool;

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run(pool: &SqlitePool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrations_create_sync_tables() {
        let pool = crate::db::connect_in_memory().await.unwrap();
        run(&pool).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT name FROM sqlite_master
            WHERE type = 'table'
              AND name IN ('pet_profiles', 'service_providers', 'service_requests', 'sync_logs')
            ORDER BY name
            "#,
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(
            tables,
            vec!["pet_profiles", "service_providers", "service_requests", "sync_logs"]
        );
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let pool = crate::db::connect_in_memory().await.unwrap();
        run(&pool).await.unwrap();
        run(&pool).await.unwrap();
    }
}
