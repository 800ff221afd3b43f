use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use utoipa::ToSchema;
use zoozy_core::time::{from_millis, now_millis};

use crate::users::find_user_by_id;
use crate::{ApiError, ApiResult, AppState};

const DEFAULT_RATING: i64 = 5;
const RATING_RANGE: std::ops::RangeInclusive<i64> = 1..=5;

const SELECT_COMMENT: &str = r#"
    SELECT id, user_id, card_id, message, rating, author_name, author_avatar, created_at
    FROM user_comments
"#;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub user_id: i64,
    pub card_id: String,
    pub message: String,
    pub rating: i64,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentPayload {
    pub user_id: i64,
    pub card_id: String,
    pub message: String,
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_avatar: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentQuery {
    pub card_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardIdQuery {
    pub card_id: String,
}

fn map_comment_row(row: &SqliteRow) -> Result<Comment, sqlx::Error> {
    Ok(Comment {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        card_id: row.try_get("card_id")?,
        message: row.try_get("message")?,
        rating: row.try_get("rating")?,
        author_name: row.try_get("author_name")?,
        author_avatar: row.try_get("author_avatar")?,
        created_at: from_millis(row.try_get("created_at")?),
    })
}

async fn find_comment(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Comment>, sqlx::Error> {
    let row = sqlx::query(&format!("{SELECT_COMMENT} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    row.as_ref().map(map_comment_row).transpose()
}

pub async fn list_comments(
    State(state): State<AppState>,
    Query(query): Query<CommentQuery>,
) -> ApiResult<Json<Vec<Comment>>> {
    let rows = sqlx::query(&format!(
        "{SELECT_COMMENT} WHERE (?1 IS NULL OR card_id = ?1) ORDER BY created_at DESC, id DESC"
    ))
    .bind(query.card_id)
    .fetch_all(&state.pool)
    .await?;
    let comments = rows
        .iter()
        .map(map_comment_row)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(comments))
}

pub async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Comment>> {
    let mut conn = state.pool.acquire().await?;
    let comment = find_comment(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found("comment not found"))?;
    Ok(Json(comment))
}

/// Author name and avatar fall back to the commenting user's profile.
pub async fn create_comment(
    State(state): State<AppState>,
    Json(payload): Json<CommentPayload>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    if payload.card_id.trim().is_empty() || payload.message.trim().is_empty() {
        return Err(ApiError::bad_request("cardId and message are required"));
    }
    let rating = payload.rating.unwrap_or(DEFAULT_RATING);
    if !RATING_RANGE.contains(&rating) {
        return Err(ApiError::bad_request("rating must be between 1 and 5"));
    }

    let mut conn = state.pool.acquire().await?;
    let Some(author) = find_user_by_id(&mut conn, payload.user_id).await? else {
        return Err(ApiError::bad_request("invalid user id"));
    };
    let author_name = payload
        .author_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(author.profile.display_name);
    let author_avatar = payload.author_avatar.or(author.profile.photo_url);

    let result = sqlx::query(
        r#"
        INSERT INTO user_comments (user_id, card_id, message, rating, author_name, author_avatar, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(payload.user_id)
    .bind(&payload.card_id)
    .bind(&payload.message)
    .bind(rating)
    .bind(&author_name)
    .bind(&author_avatar)
    .bind(now_millis())
    .execute(&mut *conn)
    .await?;

    let comment = find_comment(&mut conn, result.last_insert_rowid())
        .await?
        .ok_or_else(|| ApiError::internal("created comment vanished"))?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let result = sqlx::query("DELETE FROM user_comments WHERE id = ?1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("comment not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_by_card(
    State(state): State<AppState>,
    Query(query): Query<CardIdQuery>,
) -> ApiResult<StatusCode> {
    let result = sqlx::query("DELETE FROM user_comments WHERE card_id = ?1")
        .bind(&query.card_id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("no comments for card"));
    }
    tracing::info!(card_id = %query.card_id, removed = result.rows_affected(), "card comments removed");
    Ok(StatusCode::NO_CONTENT)
}
