use super::*;
use crate::model::PetProfile;
use serde_json::{json, Value};

async fn setup() -> SyncService {
    let pool = zoozy_core::db::connect_in_memory().await.unwrap();
    zoozy_core::migrations::run(&pool).await.unwrap();
    SyncService::new(pool, "zoozy-sync-test")
}

fn request(value: Value) -> SyncRequest {
    serde_json::from_value(value).unwrap()
}

fn pet(external_id: &str, name: &str) -> Value {
    json!({
        "externalId": external_id,
        "name": name,
        "species": "dog",
        "breed": "beagle",
        "age": 3,
        "ownerName": "Ana",
        "ownerContact": "555-0101"
    })
}

fn service_request(external_id: &str, pet_id: &str, provider_id: &str) -> Value {
    json!({
        "externalId": external_id,
        "petExternalId": pet_id,
        "providerExternalId": provider_id,
        "serviceType": "walking",
        "preferredDate": "2025-06-01T08:00:00Z"
    })
}

async fn count(service: &SyncService, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(service.pool())
        .await
        .unwrap()
}

async fn pet_by_external_id(service: &SyncService, external_id: &str) -> PetProfile {
    let mut conn = service.pool().acquire().await.unwrap();
    store::find_pet_by_external_id(&mut conn, external_id)
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn repeated_sync_converges_on_last_payload() {
    let service = setup().await;
    let cancel = CancellationToken::new();

    let first = service
        .sync(request(json!({ "pets": [pet("pet-1", "Rex")] })), &cancel)
        .await
        .unwrap();
    assert_eq!(first.pets_created, 1);

    let mut renamed = pet("pet-1", "Rex II");
    renamed["breed"] = Value::Null;
    let second = service
        .sync(request(json!({ "pets": [renamed] })), &cancel)
        .await
        .unwrap();
    assert_eq!(second.pets_created, 0);
    assert_eq!(second.pets_updated, 1);

    assert_eq!(count(&service, "pet_profiles").await, 1);
    let stored = pet_by_external_id(&service, "pet-1").await;
    assert_eq!(stored.name, "Rex II");
    assert_eq!(stored.breed, None);
    assert!(stored.updated_at >= stored.created_at);
}

#[tokio::test]
async fn missing_parents_become_single_placeholders() {
    let service = setup().await;
    let cancel = CancellationToken::new();

    let report = service
        .sync(
            request(json!({
                "requests": [
                    service_request("req-1", "pet-ghost", "prov-ghost"),
                    service_request("req-2", "pet-ghost", "prov-ghost")
                ]
            })),
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(report.pets_created, 1);
    assert_eq!(report.providers_created, 1);
    assert_eq!(report.requests_created, 2);
    assert_eq!(count(&service, "pet_profiles").await, 1);
    assert_eq!(count(&service, "service_providers").await, 1);

    let mut conn = service.pool().acquire().await.unwrap();
    let pet = store::find_pet_by_external_id(&mut conn, "pet-ghost")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pet.name, "Unknown");
    assert_eq!(pet.species, "unknown");
    let provider = store::find_provider_by_external_id(&mut conn, "prov-ghost")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(provider.service_type, "walking");
    assert_eq!(provider.location, "Unknown");

    let stored = store::find_request_by_external_id(&mut conn, "req-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.pet_profile_id, pet.id);
    assert_eq!(stored.service_provider_id, provider.id);
    assert_eq!(stored.status, "pending");
}

#[tokio::test]
async fn mixed_batch_reports_expected_counters() {
    let service = setup().await;
    let cancel = CancellationToken::new();
    service
        .sync(request(json!({ "pets": [pet("pet-existing", "Old")] })), &cancel)
        .await
        .unwrap();

    let report = service
        .sync(
            request(json!({
                "payloadSource": "mobile",
                "pets": [pet("pet-a", "A"), pet("pet-b", "B"), pet("pet-existing", "New")],
                "providers": [],
                "requests": [service_request("req-1", "pet-a", "prov-new")]
            })),
            &cancel,
        )
        .await
        .unwrap();

    assert_eq!(report.pets_created, 2);
    assert_eq!(report.pets_updated, 1);
    assert_eq!(report.providers_created, 1);
    assert_eq!(report.providers_updated, 0);
    assert_eq!(report.requests_created, 1);
    assert_eq!(report.requests_updated, 0);
    assert_eq!(report.total_changes(), 5);

    // The request resolved the pet from the same batch instead of a placeholder.
    assert_eq!(count(&service, "pet_profiles").await, 3);

    let mut conn = service.pool().acquire().await.unwrap();
    let logs = store::list_recent_sync_logs(&mut conn, 1).await.unwrap();
    assert_eq!(logs[0].payload_source, "mobile");
    assert_eq!(logs[0].pets_processed, 3);
    assert_eq!(logs[0].providers_processed, 1);
    assert_eq!(logs[0].requests_processed, 1);
    assert_eq!(logs[0].notes.as_deref(), Some("Total changes: 5"));
}

#[tokio::test]
async fn empty_batch_still_writes_audit_row() {
    let service = setup().await;

    let report = service
        .sync(request(json!({})), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.total_changes(), 0);
    assert_eq!(count(&service, "sync_logs").await, 1);

    let mut conn = service.pool().acquire().await.unwrap();
    let logs = store::list_recent_sync_logs(&mut conn, 10).await.unwrap();
    assert_eq!(logs[0].payload_source, "firebase");
    assert_eq!(logs[0].pets_processed, 0);
    assert_eq!(logs[0].providers_processed, 0);
    assert_eq!(logs[0].requests_processed, 0);
}

#[tokio::test]
async fn duplicate_ids_within_a_batch_last_one_wins() {
    let service = setup().await;

    let report = service
        .sync(
            request(json!({ "pets": [pet("pet-1", "First"), pet("pet-1", "Second")] })),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(report.pets_created, 1);
    assert_eq!(report.pets_updated, 1);
    assert_eq!(count(&service, "pet_profiles").await, 1);
    assert_eq!(pet_by_external_id(&service, "pet-1").await.name, "Second");
}

#[tokio::test]
async fn provider_rating_keeps_two_fraction_digits() {
    let service = setup().await;

    service
        .sync(
            request(json!({
                "providers": [{
                    "externalId": "prov-1",
                    "name": "Happy Paws",
                    "serviceType": "grooming",
                    "location": "Ankara",
                    "rating": 4.256,
                    "offersVideoCall": true
                }]
            })),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let mut conn = service.pool().acquire().await.unwrap();
    let provider = store::find_provider_by_external_id(&mut conn, "prov-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(provider.rating.map(|rating| rating.hundredths()), Some(426));
    assert!(provider.offers_video_call);
    assert!(!provider.offers_live_tracking);
}

#[tokio::test]
async fn existing_request_is_repointed_on_update() {
    let service = setup().await;
    let cancel = CancellationToken::new();
    service
        .sync(
            request(json!({ "requests": [service_request("req-1", "pet-1", "prov-1")] })),
            &cancel,
        )
        .await
        .unwrap();

    let mut moved = service_request("req-1", "pet-2", "prov-1");
    moved["status"] = json!("confirmed");
    let report = service
        .sync(request(json!({ "requests": [moved] })), &cancel)
        .await
        .unwrap();
    assert_eq!(report.requests_updated, 1);
    assert_eq!(report.pets_created, 1);
    assert_eq!(report.providers_created, 0);

    let pet_two = pet_by_external_id(&service, "pet-2").await;
    let mut conn = service.pool().acquire().await.unwrap();
    let stored = store::find_request_by_external_id(&mut conn, "req-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.pet_profile_id, pet_two.id);
    assert_eq!(stored.status, "confirmed");
}

#[tokio::test]
async fn cancelled_sync_writes_nothing() {
    let service = setup().await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = service
        .sync(request(json!({ "pets": [pet("pet-1", "Rex")] })), &cancel)
        .await;
    assert!(matches!(result, Err(SyncError::Cancelled)));
    assert_eq!(count(&service, "pet_profiles").await, 0);
    assert_eq!(count(&service, "sync_logs").await, 0);
}

#[tokio::test]
async fn invalid_batch_is_rejected_before_any_write() {
    let service = setup().await;

    let result = service
        .sync(
            request(json!({
                "pets": [pet("pet-1", "Rex")],
                "requests": [service_request("req-1", "", "prov-1")]
            })),
            &CancellationToken::new(),
        )
        .await;
    assert!(matches!(result, Err(SyncError::InvalidInput(_))));
    assert_eq!(count(&service, "pet_profiles").await, 0);
    assert_eq!(count(&service, "sync_logs").await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_syncs_on_a_shared_file_all_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("zoozy.db").display());
    let pool = zoozy_core::db::connect(&url).await.unwrap();
    zoozy_core::migrations::run(&pool).await.unwrap();
    let service = SyncService::new(pool, "zoozy-sync-test");

    let writers: Vec<String> = (0..8).map(|writer| format!("Rex {writer}")).collect();
    let mut handles = Vec::new();
    for name in &writers {
        let pets: Vec<Value> = (0..20)
            .map(|index| pet(&format!("pet-{index}"), name))
            .collect();
        let payload = request(json!({
            "pets": pets,
            "requests": [service_request("req-shared", "pet-0", "prov-shared")]
        }));
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let cancel = CancellationToken::new();
            let result = service.sync(payload, &cancel).await;
            result
        }));
    }

    let mut failures = Vec::new();
    for handle in handles {
        if let Err(err) = handle.await.unwrap() {
            failures.push(err.to_string());
        }
    }
    assert!(failures.is_empty(), "syncs failed: {failures:?}");

    assert_eq!(count(&service, "pet_profiles").await, 20);
    assert_eq!(count(&service, "service_providers").await, 1);
    assert_eq!(count(&service, "service_requests").await, 1);
    assert_eq!(count(&service, "sync_logs").await, 8);

    // Whole batches commit one after another, so every pet carries the same winner's name.
    let winner = pet_by_external_id(&service, "pet-0").await.name;
    assert!(writers.contains(&winner));
    for index in 1..20 {
        let stored = pet_by_external_id(&service, &format!("pet-{index}")).await;
        assert_eq!(stored.name, winner);
    }
}
