use crate::error::RatingError;
use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

pub const PLACEHOLDER_NAME: &str = "Unknown";
pub const PLACEHOLDER_SPECIES: &str = "unknown";
pub const PLACEHOLDER_LOCATION: &str = "Unknown";
pub const DEFAULT_REQUEST_STATUS: &str = "pending";
pub const DEFAULT_PAYLOAD_SOURCE: &str = "firebase";

/// Provider rating with two fractional digits, held as integer hundredths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rating(i64);

impl Rating {
    pub const MAX_HUNDREDTHS: i64 = 999;

    pub fn from_hundredths(hundredths: i64) -> Result<Self, RatingError> {
        if !(0..=Self::MAX_HUNDREDTHS).contains(&hundredths) {
            return Err(RatingError::OutOfRange(hundredths as f64 / 100.0));
        }
        Ok(Self(hundredths))
    }

    pub fn from_f64(value: f64) -> Result<Self, RatingError> {
        if !value.is_finite() {
            return Err(RatingError::NotFinite);
        }
        let hundredths = (value * 100.0).round();
        if hundredths < 0.0 || hundredths > Self::MAX_HUNDREDTHS as f64 {
            return Err(RatingError::OutOfRange(value));
        }
        Ok(Self(hundredths as i64))
    }

    pub fn hundredths(self) -> i64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Rating::from_f64(value).map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Created,
    Updated,
}

impl Change {
    pub fn as_str(self) -> &'static str {
        match self {
            Change::Created => "created",
            Change::Updated => "updated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PetProfile {
    pub id: Uuid,
    pub external_id: String,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub age: Option<i32>,
    pub vaccination_status: Option<String>,
    pub health_notes: Option<String>,
    pub owner_name: String,
    pub owner_contact: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PetProfile {
    /// Stand-in parent row for a service request that names an unknown pet.
    pub fn placeholder(external_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            external_id: external_id.to_string(),
            name: PLACEHOLDER_NAME.to_string(),
            species: PLACEHOLDER_SPECIES.to_string(),
            breed: None,
            age: None,
            vaccination_status: None,
            health_notes: None,
            owner_name: PLACEHOLDER_NAME.to_string(),
            owner_contact: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProvider {
    pub id: Uuid,
    pub external_id: String,
    pub name: String,
    pub service_type: String,
    pub description: Option<String>,
    pub location: String,
    pub contact_info: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub rating: Option<Rating>,
    pub offers_live_tracking: bool,
    pub offers_video_call: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceProvider {
    /// Stand-in parent row; the service type comes from the request that referenced it.
    pub fn placeholder(external_id: &str, service_type: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            external_id: external_id.to_string(),
            name: PLACEHOLDER_NAME.to_string(),
            service_type: service_type.to_string(),
            description: None,
            location: PLACEHOLDER_LOCATION.to_string(),
            contact_info: None,
            rating: None,
            offers_live_tracking: false,
            offers_video_call: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: Uuid,
    pub external_id: String,
    pub pet_profile_id: Uuid,
    pub service_provider_id: Uuid,
    pub service_type: String,
    pub preferred_date: DateTime<Utc>,
    pub status: String,
    pub notes: Option<String>,
    pub live_tracking_url: Option<String>,
    pub video_call_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncLog {
    pub id: Uuid,
    pub payload_source: String,
    pub pets_processed: i64,
    pub providers_processed: i64,
    pub requests_processed: i64,
    pub synced_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_rounds_to_hundredths() {
        let rating = Rating::from_f64(4.567).unwrap();
        assert_eq!(rating.hundredths(), 457);
        assert_eq!(rating.to_string(), "4.57");
        assert_eq!(Rating::from_f64(5.0).unwrap().to_string(), "5.00");
    }

    #[test]
    fn rating_rejects_out_of_range_values() {
        assert_eq!(Rating::from_f64(10.0), Err(RatingError::OutOfRange(10.0)));
        assert!(Rating::from_f64(-0.5).is_err());
        assert_eq!(Rating::from_f64(f64::NAN), Err(RatingError::NotFinite));
        assert!(Rating::from_hundredths(1000).is_err());
    }

    #[test]
    fn placeholders_use_fixed_literals() {
        let now = Utc::now();
        let pet = PetProfile::placeholder("pet-1", now);
        assert_eq!(pet.name, "Unknown");
        assert_eq!(pet.species, "unknown");
        assert_eq!(pet.owner_contact, "");

        let provider = ServiceProvider::placeholder("prov-1", "walking", now);
        assert_eq!(provider.service_type, "walking");
        assert_eq!(provider.location, "Unknown");
        assert!(provider.rating.is_none());
    }
}
