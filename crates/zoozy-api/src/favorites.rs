//! Cards a user bookmarked. A card is identified by its title and tip (the card kind),
//! optionally narrowed by image url.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use utoipa::ToSchema;
use zoozy_core::time::{from_millis, now_millis};

use crate::users::user_exists;
use crate::{ApiError, ApiResult, AppState};

const SELECT_FAVORITE: &str = r#"
    SELECT id, user_id, title, subtitle, image_url, profile_image_url, tip, created_at
    FROM user_favorites
"#;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: Option<String>,
    pub profile_image_url: Option<String>,
    pub tip: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavoritePayload {
    pub user_id: i64,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    pub tip: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteQuery {
    pub user_id: Option<i64>,
    pub tip: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardQuery {
    pub title: String,
    pub tip: String,
    pub image_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCardQuery {
    pub user_id: i64,
    pub title: String,
    pub tip: String,
    pub image_url: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CountResponse {
    pub count: i64,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteUser {
    pub user_id: i64,
    pub display_name: String,
    pub photo_url: Option<String>,
}

fn map_favorite_row(row: &SqliteRow) -> Result<Favorite, sqlx::Error> {
    Ok(Favorite {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        subtitle: row.try_get("subtitle")?,
        image_url: row.try_get("image_url")?,
        profile_image_url: row.try_get("profile_image_url")?,
        tip: row.try_get("tip")?,
        created_at: from_millis(row.try_get("created_at")?),
    })
}

async fn find_favorite(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Favorite>, sqlx::Error> {
    let row = sqlx::query(&format!("{SELECT_FAVORITE} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    row.as_ref().map(map_favorite_row).transpose()
}

fn image_filter(image_url: Option<&str>) -> Option<&str> {
    image_url.map(str::trim).filter(|url| !url.is_empty())
}

pub async fn list_favorites(
    State(state): State<AppState>,
    Query(query): Query<FavoriteQuery>,
) -> ApiResult<Json<Vec<Favorite>>> {
    let rows = sqlx::query(&format!(
        "{SELECT_FAVORITE} WHERE (?1 IS NULL OR user_id = ?1) AND (?2 IS NULL OR tip = ?2) ORDER BY created_at DESC, id DESC"
    ))
    .bind(query.user_id)
    .bind(query.tip)
    .fetch_all(&state.pool)
    .await?;
    let favorites = rows
        .iter()
        .map(map_favorite_row)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(favorites))
}

pub async fn get_favorite(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Favorite>> {
    let mut conn = state.pool.acquire().await?;
    let favorite = find_favorite(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found("favorite not found"))?;
    Ok(Json(favorite))
}

pub async fn create_favorite(
    State(state): State<AppState>,
    Json(payload): Json<FavoritePayload>,
) -> ApiResult<(StatusCode, Json<Favorite>)> {
    if payload.title.trim().is_empty() || payload.tip.trim().is_empty() {
        return Err(ApiError::bad_request("title and tip are required"));
    }

    let mut conn = state.pool.acquire().await?;
    if !user_exists(&mut conn, payload.user_id).await? {
        return Err(ApiError::bad_request("invalid user id"));
    }

    let duplicates: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM user_favorites
        WHERE user_id = ?1 AND title = ?2 AND tip = ?3 AND (?4 IS NULL OR image_url = ?4)
        "#,
    )
    .bind(payload.user_id)
    .bind(&payload.title)
    .bind(&payload.tip)
    .bind(image_filter(payload.image_url.as_deref()))
    .fetch_one(&mut *conn)
    .await?;
    if duplicates > 0 {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "CONFLICT",
            "card is already a favorite",
        ));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO user_favorites (user_id, title, subtitle, image_url, profile_image_url, tip, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(payload.user_id)
    .bind(&payload.title)
    .bind(&payload.subtitle)
    .bind(&payload.image_url)
    .bind(&payload.profile_image_url)
    .bind(&payload.tip)
    .bind(now_millis())
    .execute(&mut *conn)
    .await?;

    let favorite = find_favorite(&mut conn, result.last_insert_rowid())
        .await?
        .ok_or_else(|| ApiError::internal("created favorite vanished"))?;
    Ok((StatusCode::CREATED, Json(favorite)))
}

pub async fn delete_favorite(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let result = sqlx::query("DELETE FROM user_favorites WHERE id = ?1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("favorite not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Removes a user's favorite by card identity rather than by row id.
pub async fn delete_by_identifier(
    State(state): State<AppState>,
    Query(query): Query<UserCardQuery>,
) -> ApiResult<StatusCode> {
    let result = sqlx::query(
        r#"
        DELETE FROM user_favorites
        WHERE user_id = ?1 AND title = ?2 AND tip = ?3 AND (?4 IS NULL OR image_url = ?4)
        "#,
    )
    .bind(query.user_id)
    .bind(&query.title)
    .bind(&query.tip)
    .bind(image_filter(query.image_url.as_deref()))
    .execute(&state.pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("favorite not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn count_favorites(
    State(state): State<AppState>,
    Query(query): Query<CardQuery>,
) -> ApiResult<Json<CountResponse>> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM user_favorites WHERE title = ?1 AND tip = ?2 AND (?3 IS NULL OR image_url = ?3)",
    )
    .bind(&query.title)
    .bind(&query.tip)
    .bind(image_filter(query.image_url.as_deref()))
    .fetch_one(&state.pool)
    .await?;
    Ok(Json(CountResponse { count }))
}

/// Users who bookmarked the card.
pub async fn list_favorite_users(
    State(state): State<AppState>,
    Query(query): Query<CardQuery>,
) -> ApiResult<Json<Vec<FavoriteUser>>> {
    let rows = sqlx::query(
        r#"
        SELECT DISTINCT u.id AS user_id, u.display_name, u.photo_url
        FROM user_favorites f
        JOIN users u ON u.id = f.user_id
        WHERE f.title = ?1 AND f.tip = ?2 AND (?3 IS NULL OR f.image_url = ?3)
        ORDER BY u.id
        "#,
    )
    .bind(&query.title)
    .bind(&query.tip)
    .bind(image_filter(query.image_url.as_deref()))
    .fetch_all(&state.pool)
    .await?;

    let mut users = Vec::with_capacity(rows.len());
    for row in rows {
        users.push(FavoriteUser {
            user_id: row.try_get("user_id")?,
            display_name: row.try_get("display_name")?,
            photo_url: row.try_get("photo_url")?,
        });
    }
    Ok(Json(users))
}
