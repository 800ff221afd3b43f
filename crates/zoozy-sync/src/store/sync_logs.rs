use super::parse_id;
use super::queries::{INSERT_SYNC_LOG, SELECT_RECENT_SYNC_LOGS};
use crate::model::SyncLog;
use sqlx::{FromRow, SqliteConnection};
use zoozy_core::time::from_millis;

#[derive(Debug, FromRow)]
struct SyncLogRow {
    id: String,
    payload_source: String,
    pets_processed: i64,
    providers_processed: i64,
    requests_processed: i64,
    synced_at: i64,
    notes: Option<String>,
}

impl SyncLogRow {
    fn into_model(self) -> Result<SyncLog, sqlx::Error> {
        Ok(SyncLog {
            id: parse_id(&self.id)?,
            payload_source: self.payload_source,
            pets_processed: self.pets_processed,
            providers_processed: self.providers_processed,
            requests_processed: self.requests_processed,
            synced_at: from_millis(self.synced_at),
            notes: self.notes,
        })
    }
}

pub async fn insert_sync_log(conn: &mut SqliteConnection, log: &SyncLog) -> Result<(), sqlx::Error> {
    sqlx::query(INSERT_SYNC_LOG)
        .bind(log.id.to_string())
        .bind(&log.payload_source)
        .bind(log.pets_processed)
        .bind(log.providers_processed)
        .bind(log.requests_processed)
        .bind(log.synced_at.timestamp_millis())
        .bind(&log.notes)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn list_recent_sync_logs(
    conn: &mut SqliteConnection,
    limit: i64,
) -> Result<Vec<SyncLog>, sqlx::Error> {
    let rows = sqlx::query_as::<_, SyncLogRow>(SELECT_RECENT_SYNC_LOGS)
        .bind(limit)
        .fetch_all(conn)
        .await?;
    rows.into_iter().map(SyncLogRow::into_model).collect()
}
