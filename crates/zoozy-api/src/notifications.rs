use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqliteConnection};
use utoipa::ToSchema;
use zoozy_core::metrics;
use zoozy_core::time::{from_millis, now_millis};

use crate::{ApiError, ApiResult, AppState, SERVICE_NAME};

pub(crate) const KIND_JOB: &str = "job";
pub(crate) const KIND_MESSAGE: &str = "message";

/// Inserts one `job` notification for every active user other than the poster.
/// Returns the number of notifications written.
pub(crate) async fn notify_new_job(
    conn: &mut SqliteConnection,
    poster_id: i64,
    poster_name: &str,
    job_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO notifications (user_id, kind, title, related_user_id, related_job_id, created_at, is_read)
        SELECT id, ?1, ?2, ?3, ?4, ?5, 0
        FROM users
        WHERE id != ?3 AND is_active = 1
        "#,
    )
    .bind(KIND_JOB)
    .bind(format!("{poster_name} posted a new job"))
    .bind(poster_id)
    .bind(job_id)
    .bind(now_millis())
    .execute(conn)
    .await?;

    let written = result.rows_affected();
    metrics::add_notifications(SERVICE_NAME, KIND_JOB, written);
    tracing::debug!(job_id, poster_id, recipients = written, "job notifications created");
    Ok(written)
}

/// Tells the receiver about a new message. Messages to oneself are not announced.
pub(crate) async fn notify_message(
    conn: &mut SqliteConnection,
    sender_id: i64,
    sender_name: &str,
    receiver_id: i64,
    job_id: i64,
) -> Result<bool, sqlx::Error> {
    if sender_id == receiver_id {
        return Ok(false);
    }

    sqlx::query(
        r#"
        INSERT INTO notifications (user_id, kind, title, related_user_id, related_job_id, created_at, is_read)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)
        "#,
    )
    .bind(receiver_id)
    .bind(KIND_MESSAGE)
    .bind(format!("{sender_name} sent you a message"))
    .bind(sender_id)
    .bind(job_id)
    .bind(now_millis())
    .execute(conn)
    .await?;

    metrics::add_notifications(SERVICE_NAME, KIND_MESSAGE, 1);
    Ok(true)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    pub user_id: i64,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub related_user_id: Option<i64>,
    pub related_job_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
    pub related_username: Option<String>,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Json<Vec<NotificationView>>> {
    let rows = sqlx::query(
        r#"
        SELECT n.id, n.user_id, n.kind, n.title, n.related_user_id, n.related_job_id,
               n.created_at, n.is_read, u.display_name AS related_username
        FROM notifications n
        LEFT JOIN users u ON u.id = n.related_user_id
        WHERE n.user_id = ?1
        ORDER BY n.created_at DESC, n.id DESC
        "#,
    )
    .bind(query.user_id)
    .fetch_all(&state.pool)
    .await?;

    let mut notifications = Vec::with_capacity(rows.len());
    for row in rows {
        notifications.push(NotificationView {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            kind: row.try_get("kind")?,
            title: row.try_get("title")?,
            related_user_id: row.try_get("related_user_id")?,
            related_job_id: row.try_get("related_job_id")?,
            created_at: from_millis(row.try_get("created_at")?),
            is_read: row.try_get("is_read")?,
            related_username: row.try_get("related_username")?,
        });
    }
    Ok(Json(notifications))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("notification not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_notification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = ?1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("notification not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
