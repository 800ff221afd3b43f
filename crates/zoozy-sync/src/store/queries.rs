pub(super) const SELECT_PET_BY_ID: &str = r#"
    SELECT id, external_id, name, species, breed, age, vaccination_status, health_notes,
           owner_name, owner_contact, created_at, updated_at
    FROM pet_profiles
    WHERE id = ?1
"#;

pub(super) const SELECT_PET_BY_EXTERNAL_ID: &str = r#"
    SELECT id, external_id, name, species, breed, age, vaccination_status, health_notes,
           owner_name, owner_contact, created_at, updated_at
    FROM pet_profiles
    WHERE external_id = ?1
"#;

pub(super) const SELECT_PETS: &str = r#"
    SELECT id, external_id, name, species, breed, age, vaccination_status, health_notes,
           owner_name, owner_contact, created_at, updated_at
    FROM pet_profiles
    ORDER BY updated_at DESC
"#;

pub(super) const INSERT_PET: &str = r#"
    INSERT INTO pet_profiles (
        id, external_id, name, species, breed, age, vaccination_status, health_notes,
        owner_name, owner_contact, created_at, updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
"#;

pub(super) const UPDATE_PET: &str = r#"
    UPDATE pet_profiles
    SET external_id = ?2,
        name = ?3,
        species = ?4,
        breed = ?5,
        age = ?6,
        vaccination_status = ?7,
        health_notes = ?8,
        owner_name = ?9,
        owner_contact = ?10,
        updated_at = ?11
    WHERE id = ?1
"#;

pub(super) const DELETE_PET: &str = "DELETE FROM pet_profiles WHERE id = ?1";

pub(super) const COUNT_REQUESTS_FOR_PET: &str =
    "SELECT COUNT(*) FROM service_requests WHERE pet_profile_id = ?1";

pub(super) const SELECT_PROVIDER_BY_ID: &str = r#"
    SELECT id, external_id, name, service_type, description, location, contact_info,
           rating_hundredths, offers_live_tracking, offers_video_call, created_at, updated_at
    FROM service_providers
    WHERE id = ?1
"#;

pub(super) const SELECT_PROVIDER_BY_EXTERNAL_ID: &str = r#"
    SELECT id, external_id, name, service_type, description, location, contact_info,
           rating_hundredths, offers_live_tracking, offers_video_call, created_at, updated_at
    FROM service_providers
    WHERE external_id = ?1
"#;

pub(super) const SELECT_PROVIDERS: &str = r#"
    SELECT id, external_id, name, service_type, description, location, contact_info,
           rating_hundredths, offers_live_tracking, offers_video_call, created_at, updated_at
    FROM service_providers
    ORDER BY updated_at DESC
"#;

pub(super) const INSERT_PROVIDER: &str = r#"
    INSERT INTO service_providers (
        id, external_id, name, service_type, description, location, contact_info,
        rating_hundredths, offers_live_tracking, offers_video_call, created_at, updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
"#;

pub(super) const UPDATE_PROVIDER: &str = r#"
    UPDATE service_providers
    SET external_id = ?2,
        name = ?3,
        service_type = ?4,
        description = ?5,
        location = ?6,
        contact_info = ?7,
        rating_hundredths = ?8,
        offers_live_tracking = ?9,
        offers_video_call = ?10,
        updated_at = ?11
    WHERE id = ?1
"#;

pub(super) const DELETE_PROVIDER: &str = "DELETE FROM service_providers WHERE id = ?1";

pub(super) const COUNT_REQUESTS_FOR_PROVIDER: &str =
    "SELECT COUNT(*) FROM service_requests WHERE service_provider_id = ?1";

pub(super) const SELECT_REQUEST_BY_ID: &str = r#"
    SELECT id, external_id, pet_profile_id, service_provider_id, service_type, preferred_date,
           status, notes, live_tracking_url, video_call_enabled, created_at, updated_at
    FROM service_requests
    WHERE id = ?1
"#;

pub(super) const SELECT_REQUEST_BY_EXTERNAL_ID: &str = r#"
    SELECT id, external_id, pet_profile_id, service_provider_id, service_type, preferred_date,
           status, notes, live_tracking_url, video_call_enabled, created_at, updated_at
    FROM service_requests
    WHERE external_id = ?1
"#;

pub(super) const SELECT_REQUESTS: &str = r#"
    SELECT id, external_id, pet_profile_id, service_provider_id, service_type, preferred_date,
           status, notes, live_tracking_url, video_call_enabled, created_at, updated_at
    FROM service_requests
    WHERE (?1 IS NULL OR pet_profile_id = ?1)
      AND (?2 IS NULL OR service_provider_id = ?2)
    ORDER BY created_at DESC
"#;

pub(super) const INSERT_REQUEST: &str = r#"
    INSERT INTO service_requests (
        id, external_id, pet_profile_id, service_provider_id, service_type, preferred_date,
        status, notes, live_tracking_url, video_call_enabled, created_at, updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
"#;

pub(super) const UPDATE_REQUEST: &str = r#"
    UPDATE service_requests
    SET external_id = ?2,
        pet_profile_id = ?3,
        service_provider_id = ?4,
        service_type = ?5,
        preferred_date = ?6,
        status = ?7,
        notes = ?8,
        live_tracking_url = ?9,
        video_call_enabled = ?10,
        updated_at = ?11
    WHERE id = ?1
"#;

pub(super) const DELETE_REQUEST: &str = "DELETE FROM service_requests WHERE id = ?1";

pub(super) const INSERT_SYNC_LOG: &str = r#"
    INSERT INTO sync_logs (
        id, payload_source, pets_processed, providers_processed, requests_processed,
        synced_at, notes
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#;

pub(super) const SELECT_RECENT_SYNC_LOGS: &str = r#"
    SELECT id, payload_source, pets_processed, providers_processed, requests_processed,
           synced_at, notes
    FROM sync_logs
    ORDER BY synced_at DESC
    LIMIT ?1
"#;
