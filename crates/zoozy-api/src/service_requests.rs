use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use utoipa::ToSchema;
use uuid::Uuid;
use zoozy_sync::model::DEFAULT_REQUEST_STATUS;
use zoozy_sync::store::{self, RequestFilter};
use zoozy_sync::{PetProfile, ServiceProvider, ServiceRequest};

use crate::user_requests::deserialize_date;
use crate::{parse_uuid, ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequestPayload {
    #[serde(default, alias = "firebaseId")]
    pub external_id: Option<String>,
    pub pet_profile_id: Uuid,
    pub service_provider_id: Uuid,
    pub service_type: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub preferred_date: DateTime<Utc>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub live_tracking_url: Option<String>,
    #[serde(default)]
    pub video_call_enabled: bool,
}

impl ServiceRequestPayload {
    fn external_id(&self) -> Option<&str> {
        self.external_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn status(&self) -> String {
        match self.status.as_deref().map(str::trim) {
            Some(status) if !status.is_empty() => status.to_string(),
            _ => DEFAULT_REQUEST_STATUS.to_string(),
        }
    }

    /// Both parents must already exist; this surface never creates placeholders.
    async fn check_parents(&self, conn: &mut SqliteConnection) -> ApiResult<()> {
        if self.service_type.trim().is_empty() {
            return Err(ApiError::bad_request("serviceType is required"));
        }
        if store::get_pet(&mut *conn, self.pet_profile_id).await?.is_none() {
            return Err(ApiError::bad_request("invalid pet profile id"));
        }
        if store::get_provider(&mut *conn, self.service_provider_id)
            .await?
            .is_none()
        {
            return Err(ApiError::bad_request("invalid service provider id"));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequestQuery {
    pub pet_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
}

/// A service request with its pet and provider embedded.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequestView {
    #[serde(flatten)]
    pub request: ServiceRequest,
    pub pet_profile: Option<PetProfile>,
    pub service_provider: Option<ServiceProvider>,
}

async fn embed(
    conn: &mut SqliteConnection,
    requests: Vec<ServiceRequest>,
) -> Result<Vec<ServiceRequestView>, sqlx::Error> {
    let mut pets: HashMap<Uuid, Option<PetProfile>> = HashMap::new();
    let mut providers: HashMap<Uuid, Option<ServiceProvider>> = HashMap::new();
    let mut views = Vec::with_capacity(requests.len());

    for request in requests {
        if !pets.contains_key(&request.pet_profile_id) {
            let pet = store::get_pet(&mut *conn, request.pet_profile_id).await?;
            pets.insert(request.pet_profile_id, pet);
        }
        if !providers.contains_key(&request.service_provider_id) {
            let provider = store::get_provider(&mut *conn, request.service_provider_id).await?;
            providers.insert(request.service_provider_id, provider);
        }
        views.push(ServiceRequestView {
            pet_profile: pets.get(&request.pet_profile_id).cloned().flatten(),
            service_provider: providers
                .get(&request.service_provider_id)
                .cloned()
                .flatten(),
            request,
        });
    }
    Ok(views)
}

pub async fn list_requests(
    State(state): State<AppState>,
    Query(query): Query<ServiceRequestQuery>,
) -> ApiResult<Json<Vec<ServiceRequestView>>> {
    let mut conn = state.pool.acquire().await?;
    let requests = store::list_requests(
        &mut conn,
        RequestFilter {
            pet_id: query.pet_id,
            provider_id: query.provider_id,
        },
    )
    .await?;
    Ok(Json(embed(&mut conn, requests).await?))
}

pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ServiceRequestView>> {
    let id = parse_uuid(&id)?;
    let mut conn = state.pool.acquire().await?;
    let request = store::get_request(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found("service request not found"))?;
    let mut views = embed(&mut conn, vec![request]).await?;
    views
        .pop()
        .map(Json)
        .ok_or_else(|| ApiError::internal("embedding produced no view"))
}

pub async fn create_request(
    State(state): State<AppState>,
    Json(payload): Json<ServiceRequestPayload>,
) -> ApiResult<(StatusCode, Json<ServiceRequest>)> {
    let mut conn = state.pool.acquire().await?;
    payload.check_parents(&mut conn).await?;

    let external_id = payload
        .external_id()
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    if store::find_request_by_external_id(&mut conn, &external_id)
        .await?
        .is_some()
    {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "CONFLICT",
            "a service request with this external id already exists",
        ));
    }

    let now = Utc::now();
    let request = ServiceRequest {
        id: Uuid::new_v4(),
        external_id,
        pet_profile_id: payload.pet_profile_id,
        service_provider_id: payload.service_provider_id,
        service_type: payload.service_type.clone(),
        preferred_date: payload.preferred_date,
        status: payload.status(),
        notes: payload.notes,
        live_tracking_url: payload.live_tracking_url,
        video_call_enabled: payload.video_call_enabled,
        created_at: now,
        updated_at: now,
    };
    store::insert_request(&mut conn, &request).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn update_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ServiceRequestPayload>,
) -> ApiResult<Json<ServiceRequest>> {
    let id = parse_uuid(&id)?;
    let mut conn = state.pool.acquire().await?;
    let mut request = store::get_request(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found("service request not found"))?;
    payload.check_parents(&mut conn).await?;

    if let Some(external_id) = payload.external_id() {
        if external_id != request.external_id
            && store::find_request_by_external_id(&mut conn, external_id)
                .await?
                .is_some()
        {
            return Err(ApiError::new(
                StatusCode::CONFLICT,
                "CONFLICT",
                "a service request with this external id already exists",
            ));
        }
        request.external_id = external_id.to_string();
    }

    request.status = payload.status();
    request.pet_profile_id = payload.pet_profile_id;
    request.service_provider_id = payload.service_provider_id;
    request.service_type = payload.service_type;
    request.preferred_date = payload.preferred_date;
    request.notes = payload.notes;
    request.live_tracking_url = payload.live_tracking_url;
    request.video_call_enabled = payload.video_call_enabled;
    request.updated_at = Utc::now();

    store::update_request(&mut conn, &request).await?;
    Ok(Json(request))
}

pub async fn delete_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_uuid(&id)?;
    let mut conn = state.pool.acquire().await?;
    if !store::delete_request(&mut conn, id).await? {
        return Err(ApiError::not_found("service request not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
