use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use zoozy_sync::{store, PetProfile, PetProfileDto};

use crate::{parse_uuid, ApiError, ApiResult, AppState};

/// Pet fields accepted by the REST surface. Unlike the sync batch, the external id is
/// optional here and defaults to a generated one.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PetPayload {
    #[serde(default, alias = "firebaseId")]
    pub external_id: Option<String>,
    pub name: String,
    pub species: String,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub vaccination_status: Option<String>,
    #[serde(default)]
    pub health_notes: Option<String>,
    pub owner_name: String,
    #[serde(default)]
    pub owner_contact: String,
}

impl PetPayload {
    fn validate(&self) -> ApiResult<()> {
        if self.name.trim().is_empty()
            || self.species.trim().is_empty()
            || self.owner_name.trim().is_empty()
        {
            return Err(ApiError::bad_request("name, species and ownerName are required"));
        }
        Ok(())
    }

    fn external_id(&self) -> Option<&str> {
        self.external_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn into_dto(self, external_id: String) -> PetProfileDto {
        PetProfileDto {
            external_id,
            name: self.name,
            species: self.species,
            breed: self.breed,
            age: self.age,
            vaccination_status: self.vaccination_status,
            health_notes: self.health_notes,
            owner_name: self.owner_name,
            owner_contact: self.owner_contact,
        }
    }
}

pub async fn list_pets(State(state): State<AppState>) -> ApiResult<Json<Vec<PetProfile>>> {
    let mut conn = state.pool.acquire().await?;
    let pets = store::list_pets(&mut conn).await?;
    Ok(Json(pets))
}

pub async fn get_pet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PetProfile>> {
    let id = parse_uuid(&id)?;
    let mut conn = state.pool.acquire().await?;
    let pet = store::get_pet(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found("pet profile not found"))?;
    Ok(Json(pet))
}

pub async fn create_pet(
    State(state): State<AppState>,
    Json(payload): Json<PetPayload>,
) -> ApiResult<(StatusCode, Json<PetProfile>)> {
    payload.validate()?;
    let external_id = payload
        .external_id()
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut conn = state.pool.acquire().await?;
    if store::find_pet_by_external_id(&mut conn, &external_id)
        .await?
        .is_some()
    {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "CONFLICT",
            "a pet with this external id already exists",
        ));
    }

    let pet = payload.into_dto(external_id).into_profile(Utc::now());
    store::insert_pet(&mut conn, &pet).await?;
    tracing::info!(pet_id = %pet.id, external_id = %pet.external_id, "pet profile created");
    Ok((StatusCode::CREATED, Json(pet)))
}

pub async fn update_pet(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<PetPayload>,
) -> ApiResult<Json<PetProfile>> {
    let id = parse_uuid(&id)?;
    payload.validate()?;

    let mut conn = state.pool.acquire().await?;
    let mut pet = store::get_pet(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::not_found("pet profile not found"))?;

    let external_id = payload
        .external_id()
        .map(str::to_string)
        .unwrap_or_else(|| pet.external_id.clone());
    if external_id != pet.external_id
        && store::find_pet_by_external_id(&mut conn, &external_id)
            .await?
            .is_some()
    {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "CONFLICT",
            "a pet with this external id already exists",
        ));
    }

    pet.external_id = external_id.clone();
    payload.into_dto(external_id).apply_to(&mut pet, Utc::now());
    store::update_pet(&mut conn, &pet).await?;
    Ok(Json(pet))
}

pub async fn delete_pet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_uuid(&id)?;
    let mut conn = state.pool.acquire().await?;
    if store::count_requests_for_pet(&mut conn, id).await? > 0 {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "REFERENCED",
            "pet profile is referenced by service requests",
        ));
    }
    if !store::delete_pet(&mut conn, id).await? {
        return Err(ApiError::not_found("pet profile not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
