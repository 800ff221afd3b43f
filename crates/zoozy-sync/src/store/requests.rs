use super::parse_id;
use super::queries::{
    DELETE_REQUEST, INSERT_REQUEST, SELECT_REQUESTS, SELECT_REQUEST_BY_EXTERNAL_ID,
    SELECT_REQUEST_BY_ID, UPDATE_REQUEST,
};
use crate::model::ServiceRequest;
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;
use zoozy_core::time::from_millis;

#[derive(Debug, Clone, Copy, Default)]
pub struct RequestFilter {
    pub pet_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
}

#[derive(Debug, FromRow)]
struct RequestRow {
    id: String,
    external_id: String,
    pet_profile_id: String,
    service_provider_id: String,
    service_type: String,
    preferred_date: i64,
    status: String,
    notes: Option<String>,
    live_tracking_url: Option<String>,
    video_call_enabled: bool,
    created_at: i64,
    updated_at: i64,
}

impl RequestRow {
    fn into_model(self) -> Result<ServiceRequest, sqlx::Error> {
        Ok(ServiceRequest {
            id: parse_id(&self.id)?,
            external_id: self.external_id,
            pet_profile_id: parse_id(&self.pet_profile_id)?,
            service_provider_id: parse_id(&self.service_provider_id)?,
            service_type: self.service_type,
            preferred_date: from_millis(self.preferred_date),
            status: self.status,
            notes: self.notes,
            live_tracking_url: self.live_tracking_url,
            video_call_enabled: self.video_call_enabled,
            created_at: from_millis(self.created_at),
            updated_at: from_millis(self.updated_at),
        })
    }
}

pub async fn find_request_by_external_id(
    conn: &mut SqliteConnection,
    external_id: &str,
) -> Result<Option<ServiceRequest>, sqlx::Error> {
    let row = sqlx::query_as::<_, RequestRow>(SELECT_REQUEST_BY_EXTERNAL_ID)
        .bind(external_id)
        .fetch_optional(conn)
        .await?;
    row.map(RequestRow::into_model).transpose()
}

pub async fn get_request(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<ServiceRequest>, sqlx::Error> {
    let row = sqlx::query_as::<_, RequestRow>(SELECT_REQUEST_BY_ID)
        .bind(id.to_string())
        .fetch_optional(conn)
        .await?;
    row.map(RequestRow::into_model).transpose()
}

/// Newest first; unset filter fields match every row.
pub async fn list_requests(
    conn: &mut SqliteConnection,
    filter: RequestFilter,
) -> Result<Vec<ServiceRequest>, sqlx::Error> {
    let rows = sqlx::query_as::<_, RequestRow>(SELECT_REQUESTS)
        .bind(filter.pet_id.map(|id| id.to_string()))
        .bind(filter.provider_id.map(|id| id.to_string()))
        .fetch_all(conn)
        .await?;
    rows.into_iter().map(RequestRow::into_model).collect()
}

pub async fn insert_request(
    conn: &mut SqliteConnection,
    request: &ServiceRequest,
) -> Result<(), sqlx::Error> {
    sqlx::query(INSERT_REQUEST)
        .bind(request.id.to_string())
        .bind(&request.external_id)
        .bind(request.pet_profile_id.to_string())
        .bind(request.service_provider_id.to_string())
        .bind(&request.service_type)
        .bind(request.preferred_date.timestamp_millis())
        .bind(&request.status)
        .bind(&request.notes)
        .bind(&request.live_tracking_url)
        .bind(request.video_call_enabled)
        .bind(request.created_at.timestamp_millis())
        .bind(request.updated_at.timestamp_millis())
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn update_request(
    conn: &mut SqliteConnection,
    request: &ServiceRequest,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(UPDATE_REQUEST)
        .bind(request.id.to_string())
        .bind(&request.external_id)
        .bind(request.pet_profile_id.to_string())
        .bind(request.service_provider_id.to_string())
        .bind(&request.service_type)
        .bind(request.preferred_date.timestamp_millis())
        .bind(&request.status)
        .bind(&request.notes)
        .bind(&request.live_tracking_url)
        .bind(request.video_call_enabled)
        .bind(request.updated_at.timestamp_millis())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_request(conn: &mut SqliteConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(DELETE_REQUEST)
        .bind(id.to_string())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
