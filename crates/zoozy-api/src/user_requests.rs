//! Jobs: care requests users publish for other users to pick up.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use utoipa::ToSchema;
use zoozy_core::time::{from_millis, now_millis};
use zoozy_sync::dto::parse_date_time;

use crate::notifications::notify_new_job;
use crate::users::find_user_by_id;
use crate::{ApiError, ApiResult, AppState};

const SELECT_JOB: &str = r#"
    SELECT id, user_id, pet_name, service_name, user_photo, start_date, end_date, day_diff,
           note, location, created_at, updated_at
    FROM user_requests
"#;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i64,
    pub user_id: i64,
    pub pet_name: String,
    pub service_name: String,
    pub user_photo: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub day_diff: i64,
    pub note: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    #[serde(default)]
    pub id: Option<i64>,
    pub user_id: i64,
    pub pet_name: String,
    pub service_name: String,
    #[serde(default)]
    pub user_photo: Option<String>,
    #[serde(deserialize_with = "deserialize_date")]
    pub start_date: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_date")]
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub day_diff: Option<i64>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl JobPayload {
    fn validate(&self) -> ApiResult<()> {
        if self.pet_name.trim().is_empty() || self.service_name.trim().is_empty() {
            return Err(ApiError::bad_request("petName and serviceName are required"));
        }
        if self.end_date < self.start_date {
            return Err(ApiError::bad_request("endDate must not precede startDate"));
        }
        Ok(())
    }

    fn day_diff(&self) -> i64 {
        self.day_diff
            .unwrap_or_else(|| (self.end_date - self.start_date).num_days())
    }
}

pub(crate) fn deserialize_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date_time(&raw).ok_or_else(|| de::Error::custom(format!("invalid date: {raw}")))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobQuery {
    pub user_id: Option<i64>,
}

fn map_job_row(row: &SqliteRow) -> Result<Job, sqlx::Error> {
    Ok(Job {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        pet_name: row.try_get("pet_name")?,
        service_name: row.try_get("service_name")?,
        user_photo: row.try_get("user_photo")?,
        start_date: from_millis(row.try_get("start_date")?),
        end_date: from_millis(row.try_get("end_date")?),
        day_diff: row.try_get("day_diff")?,
        note: row.try_get("note")?,
        location: row.try_get("location")?,
        created_at: from_millis(row.try_get("created_at")?),
        updated_at: from_millis(row.try_get("updated_at")?),
    })
}

pub(crate) async fn find_job(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Job>, sqlx::Error> {
    let row = sqlx::query(&format!("{SELECT_JOB} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    row.as_ref().map(map_job_row).transpose()
}

/// Fields of a job about to be inserted.
pub(crate) struct NewJob<'a> {
    pub user_id: i64,
    pub pet_name: &'a str,
    pub service_name: &'a str,
    pub user_photo: Option<&'a str>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub day_diff: i64,
    pub note: Option<&'a str>,
    pub location: Option<&'a str>,
}

pub(crate) async fn insert_job(
    conn: &mut SqliteConnection,
    job: &NewJob<'_>,
) -> Result<i64, sqlx::Error> {
    let now = now_millis();
    let result = sqlx::query(
        r#"
        INSERT INTO user_requests (
            user_id, pet_name, service_name, user_photo, start_date, end_date, day_diff,
            note, location, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
        "#,
    )
    .bind(job.user_id)
    .bind(job.pet_name)
    .bind(job.service_name)
    .bind(job.user_photo)
    .bind(job.start_date.timestamp_millis())
    .bind(job.end_date.timestamp_millis())
    .bind(job.day_diff)
    .bind(job.note)
    .bind(job.location)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobQuery>,
) -> ApiResult<Json<Vec<Job>>> {
    let rows = sqlx::query(&format!(
        "{SELECT_JOB} WHERE (?1 IS NULL OR user_id = ?1) ORDER BY created_at DESC, id DESC"
    ))
    .bind(query.user_id)
    .fetch_all(&state.pool)
    .await?;
    let jobs = rows.iter().map(map_job_row).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(jobs))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Job>> {
    let mut conn = state.pool.acquire().await?;
    let job = find_job(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found("job not found"))?;
    Ok(Json(job))
}

/// Publishes a job and announces it to every other active user in the same transaction.
pub async fn create_job(
    State(state): State<AppState>,
    Json(payload): Json<JobPayload>,
) -> ApiResult<(StatusCode, Json<Job>)> {
    payload.validate()?;

    let mut tx = state.pool.begin_with("BEGIN IMMEDIATE").await?;
    let Some(poster) = find_user_by_id(&mut tx, payload.user_id).await? else {
        return Err(ApiError::bad_request("invalid user id"));
    };

    let job_id = insert_job(
        &mut tx,
        &NewJob {
            user_id: payload.user_id,
            pet_name: &payload.pet_name,
            service_name: &payload.service_name,
            user_photo: payload.user_photo.as_deref(),
            start_date: payload.start_date,
            end_date: payload.end_date,
            day_diff: payload.day_diff(),
            note: payload.note.as_deref(),
            location: payload.location.as_deref(),
        },
    )
    .await?;
    notify_new_job(&mut tx, poster.profile.id, &poster.profile.display_name, job_id).await?;

    let job = find_job(&mut tx, job_id)
        .await?
        .ok_or_else(|| ApiError::internal("created job vanished"))?;
    tx.commit().await?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<JobPayload>,
) -> ApiResult<StatusCode> {
    if payload.id.is_some_and(|body_id| body_id != id) {
        return Err(ApiError::bad_request("id in path and body differ"));
    }
    payload.validate()?;

    let result = sqlx::query(
        r#"
        UPDATE user_requests
        SET pet_name = ?1, service_name = ?2, user_photo = ?3, start_date = ?4, end_date = ?5,
            day_diff = ?6, note = ?7, location = ?8, updated_at = ?9
        WHERE id = ?10
        "#,
    )
    .bind(&payload.pet_name)
    .bind(&payload.service_name)
    .bind(&payload.user_photo)
    .bind(payload.start_date.timestamp_millis())
    .bind(payload.end_date.timestamp_millis())
    .bind(payload.day_diff())
    .bind(&payload.note)
    .bind(&payload.location)
    .bind(now_millis())
    .bind(id)
    .execute(&state.pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("job not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let result = sqlx::query("DELETE FROM user_requests WHERE id = ?1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("job not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
