use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use utoipa::ToSchema;
use zoozy_core::time::{from_millis, now_millis};

use crate::{ApiError, ApiResult, AppState};

pub(crate) const PROVIDER_LOCAL: &str = "local";
pub(crate) const PROVIDER_GOOGLE: &str = "google";
const PROVIDER_FIREBASE: &str = "firebase";

/// Minimum length of an inline `data:image` photo accepted on profile update.
const MIN_INLINE_PHOTO_LEN: usize = 20;

const SELECT_USER: &str = r#"
    SELECT id, firebase_uid, email, password_hash, display_name, photo_url, provider,
           is_active, created_at, updated_at
    FROM users
"#;

/// Public view of an account.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub firebase_uid: Option<String>,
    pub email: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub provider: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Full account row, credentials included.
#[derive(Debug, Clone)]
pub(crate) struct UserRecord {
    pub profile: UserProfile,
    pub password_hash: Option<String>,
}

fn map_user_row(row: &SqliteRow) -> Result<UserRecord, sqlx::Error> {
    let updated_at: Option<i64> = row.try_get("updated_at")?;
    Ok(UserRecord {
        profile: UserProfile {
            id: row.try_get("id")?,
            firebase_uid: row.try_get("firebase_uid")?,
            email: row.try_get("email")?,
            display_name: row.try_get("display_name")?,
            photo_url: row.try_get("photo_url")?,
            provider: row.try_get("provider")?,
            is_active: row.try_get("is_active")?,
            created_at: from_millis(row.try_get("created_at")?),
            updated_at: updated_at.map(from_millis),
        },
        password_hash: row.try_get("password_hash")?,
    })
}

pub(crate) async fn find_user_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query(&format!("{SELECT_USER} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    row.as_ref().map(map_user_row).transpose()
}

pub(crate) async fn find_user_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query(&format!("{SELECT_USER} WHERE email = ?1"))
        .bind(normalize_email(email))
        .fetch_optional(conn)
        .await?;
    row.as_ref().map(map_user_row).transpose()
}

pub(crate) async fn find_user_by_firebase_uid(
    conn: &mut SqliteConnection,
    firebase_uid: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query(&format!("{SELECT_USER} WHERE firebase_uid = ?1"))
        .bind(firebase_uid)
        .fetch_optional(conn)
        .await?;
    row.as_ref().map(map_user_row).transpose()
}

pub(crate) async fn find_user_by_reset_token(
    conn: &mut SqliteConnection,
    token: &str,
    now: i64,
) -> Result<Vec<UserRecord>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        "{SELECT_USER} WHERE password_reset_token = ?1 AND password_reset_token_expiry > ?2"
    ))
    .bind(token)
    .bind(now)
    .fetch_all(conn)
    .await?;
    rows.iter().map(map_user_row).collect()
}

pub(crate) async fn user_exists(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?1")
        .bind(id)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn normalize_photo(photo_url: Option<&str>) -> Option<String> {
    photo_url
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncUserRequest {
    #[serde(default)]
    pub firebase_uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

impl SyncUserRequest {
    fn provider(&self) -> &str {
        match self.provider.as_deref().map(str::trim) {
            Some(provider) if !provider.is_empty() => provider,
            _ => PROVIDER_FIREBASE,
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct UserIdResponse {
    pub message: String,
    pub id: i64,
}

#[derive(Serialize, ToSchema)]
pub struct ExistsResponse {
    pub exists: bool,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserResponse {
    pub message: String,
    pub id: i64,
    pub display_name: String,
    pub photo_url: Option<String>,
}

pub async fn get_user_by_firebase_uid(
    State(state): State<AppState>,
    Path(firebase_uid): Path<String>,
) -> ApiResult<Json<UserProfile>> {
    let mut conn = state.pool.acquire().await?;
    let user = find_user_by_firebase_uid(&mut conn, &firebase_uid)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    Ok(Json(user.profile))
}

pub async fn user_exists_by_uid(
    State(state): State<AppState>,
    Path(firebase_uid): Path<String>,
) -> ApiResult<Json<ExistsResponse>> {
    let mut conn = state.pool.acquire().await?;
    let exists = find_user_by_firebase_uid(&mut conn, &firebase_uid)
        .await?
        .is_some();
    Ok(Json(ExistsResponse { exists }))
}

/// Upserts the client-side Firebase account mirror by uid.
pub async fn sync_user(
    State(state): State<AppState>,
    Json(payload): Json<SyncUserRequest>,
) -> ApiResult<Json<UserIdResponse>> {
    if payload.firebase_uid.trim().is_empty() {
        return Err(ApiError::bad_request("firebaseUid is required"));
    }

    let now = now_millis();
    let mut conn = state.pool.acquire().await?;
    let existing = find_user_by_firebase_uid(&mut conn, &payload.firebase_uid).await?;

    let id = match existing {
        Some(user) => {
            sqlx::query(
                "UPDATE users SET email = ?1, display_name = ?2, photo_url = ?3, provider = ?4, updated_at = ?5 WHERE id = ?6",
            )
            .bind(normalize_email(&payload.email))
            .bind(&payload.display_name)
            .bind(normalize_photo(payload.photo_url.as_deref()))
            .bind(payload.provider())
            .bind(now)
            .bind(user.profile.id)
            .execute(&mut *conn)
            .await?;
            user.profile.id
        }
        None => insert_firebase_user(&mut conn, &payload, now).await?,
    };

    Ok(Json(UserIdResponse {
        message: "User synced".to_string(),
        id,
    }))
}

pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<SyncUserRequest>,
) -> ApiResult<(StatusCode, Json<UserIdResponse>)> {
    if payload.firebase_uid.trim().is_empty() {
        return Err(ApiError::bad_request("firebaseUid is required"));
    }

    let mut conn = state.pool.acquire().await?;
    if find_user_by_firebase_uid(&mut conn, &payload.firebase_uid)
        .await?
        .is_some()
    {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "USER_EXISTS",
            "user already exists",
        ));
    }

    let id = insert_firebase_user(&mut conn, &payload, now_millis()).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserIdResponse {
            message: "User created".to_string(),
            id,
        }),
    ))
}

async fn insert_firebase_user(
    conn: &mut SqliteConnection,
    payload: &SyncUserRequest,
    now: i64,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO users (firebase_uid, email, display_name, photo_url, provider, is_active, created_at) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
    )
    .bind(&payload.firebase_uid)
    .bind(normalize_email(&payload.email))
    .bind(&payload.display_name)
    .bind(normalize_photo(payload.photo_url.as_deref()))
    .bind(payload.provider())
    .bind(now)
    .execute(conn)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Profile edit. An absent photo keeps the current one; a present photo is stored only
/// when it is an inline `data:image` URI, otherwise the photo is cleared.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<UpdateUserResponse>> {
    let id: i64 = id
        .parse()
        .map_err(|_| ApiError::bad_request("user id must be numeric"))?;

    let mut conn = state.pool.acquire().await?;
    let user = find_user_by_id(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    let mut profile = user.profile;
    if let Some(display_name) = payload.display_name.filter(|name| !name.is_empty()) {
        profile.display_name = display_name;
    }
    if let Some(photo_url) = payload.photo_url {
        let trimmed = photo_url.trim();
        if trimmed.len() > MIN_INLINE_PHOTO_LEN && trimmed.starts_with("data:image") {
            profile.photo_url = Some(trimmed.to_string());
        } else {
            tracing::debug!(user_id = id, length = trimmed.len(), "rejected profile photo");
            profile.photo_url = None;
        }
    }

    sqlx::query("UPDATE users SET display_name = ?1, photo_url = ?2, updated_at = ?3 WHERE id = ?4")
        .bind(&profile.display_name)
        .bind(&profile.photo_url)
        .bind(now_millis())
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(Json(UpdateUserResponse {
        message: "User updated".to_string(),
        id,
        display_name: profile.display_name,
        photo_url: profile.photo_url,
    }))
}
