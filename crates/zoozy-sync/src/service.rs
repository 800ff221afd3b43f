use crate::dto::{PetProfileDto, ServiceProviderDto, ServiceRequestDto, SyncReport, SyncRequest};
use crate::error::SyncError;
use crate::model::{Change, SyncLog};
use crate::store;
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use zoozy_core::metrics;

#[cfg(test)]
mod tests;

/// Merges externally captured pets, providers and service requests into the store.
///
/// The three passes run in a fixed order (pets, providers, requests) so that a request
/// can reference a pet or provider introduced earlier in the same batch. All writes,
/// including the audit row, share one transaction.
#[derive(Clone)]
pub struct SyncService {
    pool: SqlitePool,
    service_name: &'static str,
}

struct RequestOutcome {
    change: Change,
    pet_created: bool,
    provider_created: bool,
}

impl SyncService {
    pub fn new(pool: SqlitePool, service_name: &'static str) -> Self {
        Self { pool, service_name }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn sync(
        &self,
        request: SyncRequest,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        let payload_source = request.payload_source().to_string();
        let result = self.run(request, &payload_source, cancel).await;

        match &result {
            Ok(report) => {
                metrics::inc_sync_run(self.service_name, metrics::SYNC_RESULT_SUCCESS);
                self.record_changes(report);
                tracing::info!(
                    payload_source = %payload_source,
                    pets_created = report.pets_created,
                    pets_updated = report.pets_updated,
                    providers_created = report.providers_created,
                    providers_updated = report.providers_updated,
                    requests_created = report.requests_created,
                    requests_updated = report.requests_updated,
                    "sync completed"
                );
            }
            Err(SyncError::Cancelled) => {
                metrics::inc_sync_run(self.service_name, metrics::SYNC_RESULT_CANCELLED);
                tracing::warn!(payload_source = %payload_source, "sync cancelled; changes rolled back");
            }
            Err(err) => {
                metrics::inc_sync_run(self.service_name, metrics::SYNC_RESULT_ERROR);
                tracing::error!(payload_source = %payload_source, error = %err, "sync failed");
            }
        }
        result
    }

    async fn run(
        &self,
        request: SyncRequest,
        payload_source: &str,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        request.validate()?;
        let SyncRequest {
            pets,
            providers,
            requests,
            ..
        } = request;
        let mut report = SyncReport::default();

        checkpoint(cancel)?;
        // IMMEDIATE takes the write lock up front so concurrent syncs queue on the busy
        // timeout instead of failing on lock upgrade. Dropping the transaction rolls it back.
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        checkpoint(cancel)?;
        for dto in pets.unwrap_or_default() {
            match upsert_pet(&mut tx, dto, cancel).await? {
                Change::Created => report.pets_created += 1,
                Change::Updated => report.pets_updated += 1,
            }
        }

        checkpoint(cancel)?;
        for dto in providers.unwrap_or_default() {
            match upsert_provider(&mut tx, dto, cancel).await? {
                Change::Created => report.providers_created += 1,
                Change::Updated => report.providers_updated += 1,
            }
        }

        checkpoint(cancel)?;
        for dto in requests.unwrap_or_default() {
            let outcome = upsert_request(&mut tx, dto, cancel).await?;
            report.pets_created += u32::from(outcome.pet_created);
            report.providers_created += u32::from(outcome.provider_created);
            match outcome.change {
                Change::Created => report.requests_created += 1,
                Change::Updated => report.requests_updated += 1,
            }
        }

        report.synced_at = Utc::now();
        let log = SyncLog {
            id: Uuid::new_v4(),
            payload_source: payload_source.to_string(),
            pets_processed: i64::from(report.pets_processed()),
            providers_processed: i64::from(report.providers_processed()),
            requests_processed: i64::from(report.requests_processed()),
            synced_at: report.synced_at,
            notes: Some(format!("Total changes: {}", report.total_changes())),
        };
        checkpoint(cancel)?;
        store::insert_sync_log(&mut tx, &log).await?;

        checkpoint(cancel)?;
        tx.commit().await?;
        Ok(report)
    }

    fn record_changes(&self, report: &SyncReport) {
        let counts = [
            ("pet", Change::Created, report.pets_created),
            ("pet", Change::Updated, report.pets_updated),
            ("provider", Change::Created, report.providers_created),
            ("provider", Change::Updated, report.providers_updated),
            ("request", Change::Created, report.requests_created),
            ("request", Change::Updated, report.requests_updated),
        ];
        for (entity, change, count) in counts {
            metrics::add_sync_changes(self.service_name, entity, change.as_str(), u64::from(count));
        }
    }
}

fn checkpoint(cancel: &CancellationToken) -> Result<(), SyncError> {
    if cancel.is_cancelled() {
        return Err(SyncError::Cancelled);
    }
    Ok(())
}

async fn upsert_pet(
    conn: &mut SqliteConnection,
    dto: PetProfileDto,
    cancel: &CancellationToken,
) -> Result<Change, SyncError> {
    checkpoint(cancel)?;
    let existing = store::find_pet_by_external_id(&mut *conn, &dto.external_id).await?;
    let now = Utc::now();

    checkpoint(cancel)?;
    match existing {
        Some(mut pet) => {
            dto.apply_to(&mut pet, now);
            store::update_pet(&mut *conn, &pet).await?;
            Ok(Change::Updated)
        }
        None => {
            store::insert_pet(&mut *conn, &dto.into_profile(now)).await?;
            Ok(Change::Created)
        }
    }
}

async fn upsert_provider(
    conn: &mut SqliteConnection,
    dto: ServiceProviderDto,
    cancel: &CancellationToken,
) -> Result<Change, SyncError> {
    checkpoint(cancel)?;
    let existing = store::find_provider_by_external_id(&mut *conn, &dto.external_id).await?;
    let now = Utc::now();

    checkpoint(cancel)?;
    match existing {
        Some(mut provider) => {
            dto.apply_to(&mut provider, now);
            store::update_provider(&mut *conn, &provider).await?;
            Ok(Change::Updated)
        }
        None => {
            store::insert_provider(&mut *conn, &dto.into_provider(now)).await?;
            Ok(Change::Created)
        }
    }
}

async fn upsert_request(
    conn: &mut SqliteConnection,
    dto: ServiceRequestDto,
    cancel: &CancellationToken,
) -> Result<RequestOutcome, SyncError> {
    checkpoint(cancel)?;
    let pet = store::resolve_or_create_pet(&mut *conn, &dto.pet_external_id).await?;

    checkpoint(cancel)?;
    let provider =
        store::resolve_or_create_provider(&mut *conn, &dto.provider_external_id, &dto.service_type)
            .await?;

    checkpoint(cancel)?;
    let existing = store::find_request_by_external_id(&mut *conn, &dto.external_id).await?;
    let now = Utc::now();

    checkpoint(cancel)?;
    let change = match existing {
        Some(mut request) => {
            dto.apply_to(&mut request, pet.id, provider.id, now);
            store::update_request(&mut *conn, &request).await?;
            Change::Updated
        }
        None => {
            store::insert_request(&mut *conn, &dto.into_request(pet.id, provider.id, now)).await?;
            Change::Created
        }
    };

    Ok(RequestOutcome {
        change,
        pet_created: pet.created,
        provider_created: provider.created,
    })
}
