//! SQLite persistence for the reconciliation entities.
//!
//! Every function takes a `&mut SqliteConnection` so callers can run it against a
//! pooled connection or an open transaction alike.

mod pets;
mod providers;
mod queries;
mod requests;
mod sync_logs;

pub use pets::{
    count_requests_for_pet, delete_pet, find_pet_by_external_id, get_pet, insert_pet, list_pets,
    update_pet,
};
pub use providers::{
    count_requests_for_provider, delete_provider, find_provider_by_external_id, get_provider,
    insert_provider, list_providers, update_provider,
};
pub use requests::{
    delete_request, find_request_by_external_id, get_request, insert_request, list_requests,
    update_request, RequestFilter,
};
pub use sync_logs::{insert_sync_log, list_recent_sync_logs};

use crate::model::{PetProfile, ServiceProvider};
use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

/// Internal id of a parent row, and whether it had to be created to satisfy a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub id: Uuid,
    pub created: bool,
}

/// Looks a pet up by external id, inserting a placeholder pet when none exists.
pub async fn resolve_or_create_pet(
    conn: &mut SqliteConnection,
    external_id: &str,
) -> Result<Resolved, sqlx::Error> {
    if let Some(pet) = find_pet_by_external_id(&mut *conn, external_id).await? {
        return Ok(Resolved {
            id: pet.id,
            created: false,
        });
    }

    let placeholder = PetProfile::placeholder(external_id, Utc::now());
    insert_pet(&mut *conn, &placeholder).await?;
    tracing::debug!(external_id, pet_id = %placeholder.id, "created placeholder pet");
    Ok(Resolved {
        id: placeholder.id,
        created: true,
    })
}

/// Looks a provider up by external id, inserting a placeholder with the given service type
/// when none exists.
pub async fn resolve_or_create_provider(
    conn: &mut SqliteConnection,
    external_id: &str,
    service_type: &str,
) -> Result<Resolved, sqlx::Error> {
    if let Some(provider) = find_provider_by_external_id(&mut *conn, external_id).await? {
        return Ok(Resolved {
            id: provider.id,
            created: false,
        });
    }

    let placeholder = ServiceProvider::placeholder(external_id, service_type, Utc::now());
    insert_provider(&mut *conn, &placeholder).await?;
    tracing::debug!(external_id, provider_id = %placeholder.id, "created placeholder provider");
    Ok(Resolved {
        id: placeholder.id,
        created: true,
    })
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid, sqlx::Error> {
    Uuid::parse_str(raw).map_err(|err| sqlx::Error::Decode(Box::new(err)))
}
