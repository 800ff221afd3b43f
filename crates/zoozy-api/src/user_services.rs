//! Services users advertise. Advertising a service also publishes a matching job so other
//! users are notified.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use utoipa::ToSchema;
use zoozy_core::time::{from_millis, now_millis};

use crate::notifications::notify_new_job;
use crate::user_requests::{insert_job, NewJob};
use crate::users::{find_user_by_id, UserProfile};
use crate::{ApiError, ApiResult, AppState};

const SERVICE_JOB_PET_NAME: &str = "Service Request";
const SERVICE_JOB_WINDOW_DAYS: i64 = 30;

const SELECT_SERVICE: &str = r#"
    SELECT id, user_id, service_name, service_icon, price, description, address,
           created_at, updated_at
    FROM user_services
"#;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserService {
    pub id: i64,
    pub user_id: i64,
    pub service_name: String,
    pub service_icon: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A service listed together with its owner's public profile.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnedService {
    #[serde(flatten)]
    pub service: UserService,
    pub display_name: String,
    pub email: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserServicePayload {
    #[serde(default)]
    pub id: Option<i64>,
    pub user_id: i64,
    pub service_name: String,
    #[serde(default)]
    pub service_icon: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: String,
}

impl UserServicePayload {
    fn validate(&self) -> ApiResult<()> {
        if self.service_name.trim().is_empty() || self.address.trim().is_empty() {
            return Err(ApiError::bad_request("serviceName and address are required"));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceQuery {
    pub user_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherServicesQuery {
    pub exclude_user_id: Option<i64>,
}

fn map_service_row(row: &SqliteRow) -> Result<UserService, sqlx::Error> {
    Ok(UserService {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        service_name: row.try_get("service_name")?,
        service_icon: row.try_get("service_icon")?,
        price: row.try_get("price")?,
        description: row.try_get("description")?,
        address: row.try_get("address")?,
        created_at: from_millis(row.try_get("created_at")?),
        updated_at: from_millis(row.try_get("updated_at")?),
    })
}

async fn find_service(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<UserService>, sqlx::Error> {
    let row = sqlx::query(&format!("{SELECT_SERVICE} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    row.as_ref().map(map_service_row).transpose()
}

pub async fn list_services(
    State(state): State<AppState>,
    Query(query): Query<ServiceQuery>,
) -> ApiResult<Json<Vec<UserService>>> {
    let rows = sqlx::query(&format!(
        "{SELECT_SERVICE} WHERE (?1 IS NULL OR user_id = ?1) ORDER BY created_at DESC, id DESC"
    ))
    .bind(query.user_id)
    .fetch_all(&state.pool)
    .await?;
    let services = rows
        .iter()
        .map(map_service_row)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(services))
}

pub async fn list_other_services(
    State(state): State<AppState>,
    Query(query): Query<OtherServicesQuery>,
) -> ApiResult<Json<Vec<OwnedService>>> {
    let rows = sqlx::query(
        r#"
        SELECT s.id, s.user_id, s.service_name, s.service_icon, s.price, s.description, s.address,
               s.created_at, s.updated_at,
               u.display_name, u.email, u.photo_url
        FROM user_services s
        JOIN users u ON u.id = s.user_id
        WHERE (?1 IS NULL OR s.user_id != ?1)
        ORDER BY s.created_at DESC, s.id DESC
        "#,
    )
    .bind(query.exclude_user_id)
    .fetch_all(&state.pool)
    .await?;

    let mut services = Vec::with_capacity(rows.len());
    for row in &rows {
        services.push(OwnedService {
            service: map_service_row(row)?,
            display_name: row.try_get("display_name")?,
            email: row.try_get("email")?,
            photo_url: row.try_get("photo_url")?,
        });
    }
    Ok(Json(services))
}

pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserService>> {
    let mut conn = state.pool.acquire().await?;
    let service = find_service(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found("service not found"))?;
    Ok(Json(service))
}

pub async fn create_service(
    State(state): State<AppState>,
    Json(payload): Json<UserServicePayload>,
) -> ApiResult<(StatusCode, Json<UserService>)> {
    payload.validate()?;

    let (service, owner) = {
        let mut conn = state.pool.acquire().await?;
        let Some(owner) = find_user_by_id(&mut conn, payload.user_id).await? else {
            return Err(ApiError::bad_request("invalid user id"));
        };

        let now = now_millis();
        let result = sqlx::query(
            r#"
            INSERT INTO user_services (
                user_id, service_name, service_icon, price, description, address, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
        )
        .bind(payload.user_id)
        .bind(&payload.service_name)
        .bind(&payload.service_icon)
        .bind(&payload.price)
        .bind(&payload.description)
        .bind(&payload.address)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        let service = find_service(&mut conn, result.last_insert_rowid())
            .await?
            .ok_or_else(|| ApiError::internal("created service vanished"))?;
        (service, owner.profile)
    };

    if let Err(err) = publish_service_job(&state.pool, &owner, &service).await {
        tracing::warn!(service_id = service.id, error = %err, "failed to publish job for service");
    }

    Ok((StatusCode::CREATED, Json(service)))
}

/// Posts a 30-day job advertising the service and notifies other users about it.
async fn publish_service_job(
    pool: &SqlitePool,
    owner: &UserProfile,
    service: &UserService,
) -> Result<i64, sqlx::Error> {
    let start_date = Utc::now();
    let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;
    let job_id = insert_job(
        &mut tx,
        &NewJob {
            user_id: owner.id,
            pet_name: SERVICE_JOB_PET_NAME,
            service_name: &service.service_name,
            user_photo: owner.photo_url.as_deref(),
            start_date,
            end_date: start_date + Duration::days(SERVICE_JOB_WINDOW_DAYS),
            day_diff: SERVICE_JOB_WINDOW_DAYS,
            note: service.description.as_deref(),
            location: Some(service.address.as_str()),
        },
    )
    .await?;
    notify_new_job(&mut tx, owner.id, &owner.display_name, job_id).await?;
    tx.commit().await?;
    Ok(job_id)
}

pub async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UserServicePayload>,
) -> ApiResult<StatusCode> {
    if payload.id.is_some_and(|body_id| body_id != id) {
        return Err(ApiError::bad_request("id in path and body differ"));
    }
    payload.validate()?;

    let result = sqlx::query(
        r#"
        UPDATE user_services
        SET service_name = ?1, service_icon = ?2, price = ?3, description = ?4, address = ?5,
            updated_at = ?6
        WHERE id = ?7
        "#,
    )
    .bind(&payload.service_name)
    .bind(&payload.service_icon)
    .bind(&payload.price)
    .bind(&payload.description)
    .bind(&payload.address)
    .bind(now_millis())
    .bind(id)
    .execute(&state.pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("service not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_service(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let result = sqlx::query("DELETE FROM user_services WHERE id = ?1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("service not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
