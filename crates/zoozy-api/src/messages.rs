use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use utoipa::ToSchema;
use zoozy_core::time::{from_millis, now_millis};

use crate::notifications::notify_message;
use crate::user_requests::find_job;
use crate::users::find_user_by_id;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub job_id: i64,
    pub message_text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversationEntry {
    #[serde(flatten)]
    pub message: Message,
    pub sender_name: Option<String>,
    pub sender_photo: Option<String>,
    pub receiver_name: Option<String>,
    pub receiver_photo: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub sender_id: i64,
    pub receiver_id: i64,
    pub job_id: i64,
    #[serde(default)]
    pub message_text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationQuery {
    pub job_id: i64,
    pub user_id: i64,
}

fn map_message_row(row: &SqliteRow) -> Result<Message, sqlx::Error> {
    Ok(Message {
        id: row.try_get("id")?,
        sender_id: row.try_get("sender_id")?,
        receiver_id: row.try_get("receiver_id")?,
        job_id: row.try_get("job_id")?,
        message_text: row.try_get("message_text")?,
        created_at: from_millis(row.try_get("created_at")?),
    })
}

async fn find_message(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Message>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT id, sender_id, receiver_id, job_id, message_text, created_at FROM messages WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    row.as_ref().map(map_message_row).transpose()
}

/// Messages on one job that the user sent or received, oldest first.
pub async fn list_conversation(
    State(state): State<AppState>,
    Query(query): Query<ConversationQuery>,
) -> ApiResult<Json<Vec<ConversationEntry>>> {
    let rows = sqlx::query(
        r#"
        SELECT m.id, m.sender_id, m.receiver_id, m.job_id, m.message_text, m.created_at,
               s.display_name AS sender_name, s.photo_url AS sender_photo,
               r.display_name AS receiver_name, r.photo_url AS receiver_photo
        FROM messages m
        LEFT JOIN users s ON s.id = m.sender_id
        LEFT JOIN users r ON r.id = m.receiver_id
        WHERE m.job_id = ?1 AND (m.sender_id = ?2 OR m.receiver_id = ?2)
        ORDER BY m.created_at ASC, m.id ASC
        "#,
    )
    .bind(query.job_id)
    .bind(query.user_id)
    .fetch_all(&state.pool)
    .await?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in &rows {
        entries.push(ConversationEntry {
            message: map_message_row(row)?,
            sender_name: row.try_get("sender_name")?,
            sender_photo: row.try_get("sender_photo")?,
            receiver_name: row.try_get("receiver_name")?,
            receiver_photo: row.try_get("receiver_photo")?,
        });
    }
    Ok(Json(entries))
}

pub async fn send_message(
    State(state): State<AppState>,
    Json(payload): Json<SendMessageRequest>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    if payload.message_text.trim().is_empty() {
        return Err(ApiError::bad_request("messageText is required"));
    }

    let mut tx = state.pool.begin_with("BEGIN IMMEDIATE").await?;
    let Some(sender) = find_user_by_id(&mut tx, payload.sender_id).await? else {
        return Err(ApiError::bad_request("invalid sender id"));
    };
    if find_user_by_id(&mut tx, payload.receiver_id).await?.is_none() {
        return Err(ApiError::bad_request("invalid receiver id"));
    }
    if find_job(&mut tx, payload.job_id).await?.is_none() {
        return Err(ApiError::bad_request("invalid job id"));
    }

    let result = sqlx::query(
        "INSERT INTO messages (sender_id, receiver_id, job_id, message_text, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(payload.sender_id)
    .bind(payload.receiver_id)
    .bind(payload.job_id)
    .bind(&payload.message_text)
    .bind(now_millis())
    .execute(&mut *tx)
    .await?;

    notify_message(
        &mut tx,
        sender.profile.id,
        &sender.profile.display_name,
        payload.receiver_id,
        payload.job_id,
    )
    .await?;

    let message = find_message(&mut tx, result.last_insert_rowid())
        .await?
        .ok_or_else(|| ApiError::internal("created message vanished"))?;
    tx.commit().await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Message>> {
    let mut conn = state.pool.acquire().await?;
    let message = find_message(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found("message not found"))?;
    Ok(Json(message))
}
