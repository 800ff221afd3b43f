use crate::error::SyncError;
use crate::model::{
    PetProfile, Rating, ServiceProvider, ServiceRequest, DEFAULT_PAYLOAD_SOURCE,
    DEFAULT_REQUEST_STATUS,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;
use uuid::Uuid;

/// Batch pushed by a mobile client from its local Firebase store.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    #[serde(default)]
    pub payload_source: Option<String>,
    #[serde(default)]
    pub pets: Option<Vec<PetProfileDto>>,
    #[serde(default)]
    pub providers: Option<Vec<ServiceProviderDto>>,
    #[serde(default)]
    pub requests: Option<Vec<ServiceRequestDto>>,
}

impl SyncRequest {
    pub fn payload_source(&self) -> &str {
        match self.payload_source.as_deref().map(str::trim) {
            Some(source) if !source.is_empty() => source,
            _ => DEFAULT_PAYLOAD_SOURCE,
        }
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        for pet in self.pets.iter().flatten() {
            require_id("pet externalId", &pet.external_id)?;
        }
        for provider in self.providers.iter().flatten() {
            require_id("provider externalId", &provider.external_id)?;
        }
        for request in self.requests.iter().flatten() {
            require_id("request externalId", &request.external_id)?;
            require_id("request petExternalId", &request.pet_external_id)?;
            require_id("request providerExternalId", &request.provider_external_id)?;
        }
        Ok(())
    }
}

fn require_id(field: &str, value: &str) -> Result<(), SyncError> {
    if value.trim().is_empty() {
        return Err(SyncError::InvalidInput(format!("{field} is required")));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PetProfileDto {
    #[serde(alias = "firebaseId")]
    pub external_id: String,
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

impl PetProfileDto {
    pub fn into_profile(self, now: DateTime<Utc>) -> PetProfile {
        let mut profile = PetProfile::placeholder(&self.external_id, now);
        self.apply_to(&mut profile, now);
        profile
    }

    /// Overwrites every mutable field; identity and `created_at` are kept.
    pub fn apply_to(self, profile: &mut PetProfile, now: DateTime<Utc>) {
        profile.name = self.name;
        profile.species = self.species;
        profile.breed = self.breed;
        profile.age = self.age;
        profile.vaccination_status = self.vaccination_status;
        profile.health_notes = self.health_notes;
        profile.owner_name = self.owner_name;
        profile.owner_contact = self.owner_contact;
        profile.updated_at = now;
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProviderDto {
    #[serde(alias = "firebaseId")]
    pub external_id: String,
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

impl ServiceProviderDto {
    pub fn into_provider(self, now: DateTime<Utc>) -> ServiceProvider {
        let mut provider = ServiceProvider::placeholder(&self.external_id, &self.service_type, now);
        self.apply_to(&mut provider, now);
        provider
    }

    pub fn apply_to(self, provider: &mut ServiceProvider, now: DateTime<Utc>) {
        provider.name = self.name;
        provider.service_type = self.service_type;
        provider.description = self.description;
        provider.location = self.location;
        provider.contact_info = self.contact_info;
        provider.rating = self.rating;
        provider.offers_live_tracking = self.offers_live_tracking;
        provider.offers_video_call = self.offers_video_call;
        provider.updated_at = now;
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequestDto {
    #[serde(alias = "firebaseId")]
    pub external_id: String,
    #[serde(alias = "petFirebaseId")]
    pub pet_external_id: String,
    #[serde(alias = "providerFirebaseId")]
    pub provider_external_id: String,
    pub service_type: String,
    #[serde(deserialize_with = "deserialize_preferred_date")]
    pub preferred_date: DateTime<Utc>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub live_tracking_url: Option<String>,
    #[serde(default)]
    pub video_call_enabled: bool,
}

impl ServiceRequestDto {
    pub fn into_request(
        self,
        pet_profile_id: Uuid,
        service_provider_id: Uuid,
        now: DateTime<Utc>,
    ) -> ServiceRequest {
        ServiceRequest {
            id: Uuid::new_v4(),
            external_id: self.external_id,
            pet_profile_id,
            service_provider_id,
            service_type: self.service_type,
            preferred_date: self.preferred_date,
            status: self.status,
            notes: self.notes,
            live_tracking_url: self.live_tracking_url,
            video_call_enabled: self.video_call_enabled,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_to(
        self,
        request: &mut ServiceRequest,
        pet_profile_id: Uuid,
        service_provider_id: Uuid,
        now: DateTime<Utc>,
    ) {
        request.pet_profile_id = pet_profile_id;
        request.service_provider_id = service_provider_id;
        request.service_type = self.service_type;
        request.preferred_date = self.preferred_date;
        request.status = self.status;
        request.notes = self.notes;
        request.live_tracking_url = self.live_tracking_url;
        request.video_call_enabled = self.video_call_enabled;
        request.updated_at = now;
    }
}

fn default_status() -> String {
    DEFAULT_REQUEST_STATUS.to_string()
}

fn deserialize_preferred_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date_time(&raw)
        .ok_or_else(|| de::Error::custom(format!("invalid preferredDate: {raw}")))
}

/// Accepts RFC 3339, or an ISO date-time / date without offset taken as UTC.
pub fn parse_date_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Outcome counters of one sync call.
#[derive(Debug, Clone, Default, PartialEq, Eq, ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct SyncReport {
    pub pets_created: u32,
    pub pets_updated: u32,
    pub providers_created: u32,
    pub providers_updated: u32,
    pub requests_created: u32,
    pub requests_updated: u32,
    pub synced_at: DateTime<Utc>,
}

impl SyncReport {
    pub fn total_changes(&self) -> u32 {
        self.pets_processed() + self.providers_processed() + self.requests_processed()
    }

    pub fn pets_processed(&self) -> u32 {
        self.pets_created + self.pets_updated
    }

    pub fn providers_processed(&self) -> u32 {
        self.providers_created + self.providers_updated
    }

    pub fn requests_processed(&self) -> u32 {
        self.requests_created + self.requests_updated
    }
}

impl Serialize for SyncReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SyncReport", 8)?;
        state.serialize_field("petsCreated", &self.pets_created)?;
        state.serialize_field("petsUpdated", &self.pets_updated)?;
        state.serialize_field("providersCreated", &self.providers_created)?;
        state.serialize_field("providersUpdated", &self.providers_updated)?;
        state.serialize_field("requestsCreated", &self.requests_created)?;
        state.serialize_field("requestsUpdated", &self.requests_updated)?;
        state.serialize_field("totalChanges", &self.total_changes())?;
        state.serialize_field("syncedAt", &self.synced_at)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn empty_object_defaults_every_list() {
        let request: SyncRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(request.payload_source(), "firebase");
        assert!(request.pets.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn legacy_firebase_aliases_are_accepted() {
        let dto: ServiceRequestDto = serde_json::from_value(json!({
            "firebaseId": "req-1",
            "petFirebaseId": "pet-1",
            "providerFirebaseId": "prov-1",
            "serviceType": "walking",
            "preferredDate": "2025-03-01T09:30:00"
        }))
        .unwrap();
        assert_eq!(dto.external_id, "req-1");
        assert_eq!(dto.pet_external_id, "pet-1");
        assert_eq!(dto.status, "pending");
        assert!(!dto.video_call_enabled);
        assert_eq!(
            dto.preferred_date,
            Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap()
        );
    }

    #[test]
    fn preferred_date_honours_offsets() {
        let parsed = parse_date_time("2025-03-01T09:30:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 3, 1, 7, 30, 0).unwrap());
        assert!(parse_date_time("2025-03-01").is_some());
        assert!(parse_date_time("next tuesday").is_none());
    }

    #[test]
    fn out_of_range_rating_fails_deserialization() {
        let result: Result<ServiceProviderDto, _> = serde_json::from_value(json!({
            "externalId": "prov-1",
            "name": "Paws",
            "serviceType": "grooming",
            "location": "Izmir",
            "rating": 12.5
        }));
        assert!(result.is_err());
    }

    #[test]
    fn blank_external_id_is_rejected() {
        let request: SyncRequest = serde_json::from_value(json!({
            "pets": [{"externalId": " ", "name": "Rex", "species": "dog", "ownerName": "Ana"}]
        }))
        .unwrap();
        assert!(matches!(request.validate(), Err(SyncError::InvalidInput(_))));
    }

    #[test]
    fn report_serializes_total_changes() {
        let report = SyncReport {
            pets_created: 2,
            pets_updated: 1,
            providers_created: 1,
            requests_created: 1,
            ..SyncReport::default()
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["totalChanges"], 5);
        assert_eq!(value["petsCreated"], 2);
        assert_eq!(value["providersUpdated"], 0);
    }
}
