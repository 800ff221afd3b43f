use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use zoozy_sync::{store, Rating, ServiceProvider, ServiceProviderDto};

use crate::{parse_uuid, ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderPayload {
    #[serde(default, alias = "firebaseId")]
    pub external_id: Option<String>,
    pub name: String,
    pub service_type: String,
    #[serde(default)]
    pub description: Option<String>,
    pub location: String,
    #[serde(default)]
    pub contact_info: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<f64>)]
    pub rating: Option<Rating>,
    #[serde(default)]
    pub offers_live_tracking: bool,
    #[serde(default)]
    pub offers_video_call: bool,
}

impl ProviderPayload {
    fn validate(&self) -> ApiResult<()> {
        if self.name.trim().is_empty()
            || self.service_type.trim().is_empty()
            || self.location.trim().is_empty()
        {
            return Err(ApiError::bad_request("name, serviceType and location are required"));
        }
        Ok(())
    }

    fn external_id(&self) -> Option<&str> {
        self.external_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn into_dto(self, external_id: String) -> ServiceProviderDto {
        ServiceProviderDto {
            external_id,
            name: self.name,
            service_type: self.service_type,
            description: self.description,
            location: self.location,
            contact_info: self.contact_info,
            rating: self.rating,
            offers_live_tracking: self.offers_live_tracking,
            offers_video_call: self.offers_video_call,
        }
    }
}

fn duplicate_external_id() -> ApiError {
    ApiError::new(
        StatusCode::CONFLICT,
        "CONFLICT",
        "a provider with this external id already exists",
    )
}

pub async fn list_providers(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ServiceProvider>>> {
    let mut conn = state.pool.acquire().await?;
    Ok(Json(store::list_providers(&mut conn).await?))
}

pub async fn get_provider(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ServiceProvider>> {
    let id = parse_uuid(&id)?;
    let mut conn = state.pool.acquire().await?;
    let provider = store::get_provider(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found("service provider not found"))?;
    Ok(Json(provider))
}

pub async fn create_provider(
    State(state): State<AppState>,
    Json(payload): Json<ProviderPayload>,
) -> ApiResult<(StatusCode, Json<ServiceProvider>)> {
    payload.validate()?;
    let external_id = payload
        .external_id()
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut conn = state.pool.acquire().await?;
    if store::find_provider_by_external_id(&mut conn, &external_id)
        .await?
        .is_some()
    {
        return Err(duplicate_external_id());
    }

    let provider = payload.into_dto(external_id).into_provider(Utc::now());
    store::insert_provider(&mut conn, &provider).await?;
    tracing::info!(provider_id = %provider.id, external_id = %provider.external_id, "service provider created");
    Ok((StatusCode::CREATED, Json(provider)))
}

pub async fn update_provider(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ProviderPayload>,
) -> ApiResult<Json<ServiceProvider>> {
    let id = parse_uuid(&id)?;
    payload.validate()?;

    let mut conn = state.pool.acquire().await?;
    let mut provider = store::get_provider(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found("service provider not found"))?;

    let external_id = payload
        .external_id()
        .map(str::to_string)
        .unwrap_or_else(|| provider.external_id.clone());
    if external_id != provider.external_id
        && store::find_provider_by_external_id(&mut conn, &external_id)
            .await?
            .is_some()
    {
        return Err(duplicate_external_id());
    }

    provider.external_id = external_id.clone();
    payload
        .into_dto(external_id)
        .apply_to(&mut provider, Utc::now());
    store::update_provider(&mut conn, &provider).await?;
    Ok(Json(provider))
}

pub async fn delete_provider(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_uuid(&id)?;
    let mut conn = state.pool.acquire().await?;
    if store::count_requests_for_provider(&mut conn, id).await? > 0 {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "REFERENCED",
            "service provider is referenced by service requests",
        ));
    }
    if !store::delete_provider(&mut conn, id).await? {
        return Err(ApiError::not_found("service provider not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
