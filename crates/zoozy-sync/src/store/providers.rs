use super::parse_id;
use super::queries::{
    COUNT_REQUESTS_FOR_PROVIDER, DELETE_PROVIDER, INSERT_PROVIDER, SELECT_PROVIDERS,
    SELECT_PROVIDER_BY_EXTERNAL_ID, SELECT_PROVIDER_BY_ID, UPDATE_PROVIDER,
};
use crate::model::{Rating, ServiceProvider};
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;
use zoozy_core::time::from_millis;

#[derive(Debug, FromRow)]
struct ProviderRow {
    id: String,
    external_id: String,
    name: String,
    service_type: String,
    description: Option<String>,
    location: String,
    contact_info: Option<String>,
    rating_hundredths: Option<i64>,
    offers_live_tracking: bool,
    offers_video_call: bool,
    created_at: i64,
    updated_at: i64,
}

impl ProviderRow {
    fn into_model(self) -> Result<ServiceProvider, sqlx::Error> {
        let rating = self
            .rating_hundredths
            .map(Rating::from_hundredths)
            .transpose()
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(ServiceProvider {
            id: parse_id(&self.id)?,
            external_id: self.external_id,
            name: self.name,
            service_type: self.service_type,
            description: self.description,
            location: self.location,
            contact_info: self.contact_info,
            rating,
            offers_live_tracking: self.offers_live_tracking,
            offers_video_call: self.offers_video_call,
            created_at: from_millis(self.created_at),
            updated_at: from_millis(self.updated_at),
        })
    }
}

pub async fn find_provider_by_external_id(
    conn: &mut SqliteConnection,
    external_id: &str,
) -> Result<Option<ServiceProvider>, sqlx::Error> {
    let row = sqlx::query_as::<_, ProviderRow>(SELECT_PROVIDER_BY_EXTERNAL_ID)
        .bind(external_id)
        .fetch_optional(conn)
        .await?;
    row.map(ProviderRow::into_model).transpose()
}

pub async fn get_provider(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<ServiceProvider>, sqlx::Error> {
    let row = sqlx::query_as::<_, ProviderRow>(SELECT_PROVIDER_BY_ID)
        .bind(id.to_string())
        .fetch_optional(conn)
        .await?;
    row.map(ProviderRow::into_model).transpose()
}

pub async fn list_providers(
    conn: &mut SqliteConnection,
) -> Result<Vec<ServiceProvider>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ProviderRow>(SELECT_PROVIDERS)
        .fetch_all(conn)
        .await?;
    rows.into_iter().map(ProviderRow::into_model).collect()
}

pub async fn insert_provider(
    conn: &mut SqliteConnection,
    provider: &ServiceProvider,
) -> Result<(), sqlx::Error> {
    sqlx::query(INSERT_PROVIDER)
        .bind(provider.id.to_string())
        .bind(&provider.external_id)
        .bind(&provider.name)
        .bind(&provider.service_type)
        .bind(&provider.description)
        .bind(&provider.location)
        .bind(&provider.contact_info)
        .bind(provider.rating.map(Rating::hundredths))
        .bind(provider.offers_live_tracking)
        .bind(provider.offers_video_call)
        .bind(provider.created_at.timestamp_millis())
        .bind(provider.updated_at.timestamp_millis())
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn update_provider(
    conn: &mut SqliteConnection,
    provider: &ServiceProvider,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(UPDATE_PROVIDER)
        .bind(provider.id.to_string())
        .bind(&provider.external_id)
        .bind(&provider.name)
        .bind(&provider.service_type)
        .bind(&provider.description)
        .bind(&provider.location)
        .bind(&provider.contact_info)
        .bind(provider.rating.map(Rating::hundredths))
        .bind(provider.offers_live_tracking)
        .bind(provider.offers_video_call)
        .bind(provider.updated_at.timestamp_millis())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_provider(conn: &mut SqliteConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(DELETE_PROVIDER)
        .bind(id.to_string())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_requests_for_provider(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(COUNT_REQUESTS_FOR_PROVIDER)
        .bind(id.to_string())
        .fetch_one(conn)
        .await
}
