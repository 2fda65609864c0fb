//! Domain models shared between the service layers and storage adapters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Coordinate;

/// A tracked animal
///
/// Read-only to the sighting pipeline; created by registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    pub id: Uuid,
    pub name: String,
    /// When the animal was last seen at registration time
    pub last_known_time: DateTime<Utc>,
    /// Where the animal was last seen at registration time
    pub last_known_location: Coordinate,
}

/// Registration input for a new animal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnimal {
    pub name: String,
    pub last_known_time: DateTime<Utc>,
    pub last_known_location: Coordinate,
}

/// An unverified observation submitted by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SightingReport {
    pub animal_id: Uuid,
    pub observed_time: DateTime<Utc>,
    pub location: Coordinate,
    #[serde(default)]
    pub image_reference: Option<String>,
}

/// A persisted, accepted sighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SightingRecord {
    pub id: Uuid,
    pub animal_id: Uuid,
    pub observed_time: DateTime<Utc>,
    pub location: Coordinate,
    pub image_reference: Option<String>,
    pub reporter_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl SightingRecord {
    /// Stamp an accepted report with its identity and provenance
    pub fn from_report(
        report: SightingReport,
        id: Uuid,
        reporter_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            animal_id: report.animal_id,
            observed_time: report.observed_time,
            location: report.location,
            image_reference: report.image_reference,
            reporter_id,
            created_at,
        }
    }
}

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
}

/// Someone to notify about a new sighting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub user_id: Uuid,
    pub display_name: String,
    pub email: String,
}

impl From<User> for Recipient {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            display_name: user.display_name,
            email: user.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_report_keeps_report_fields() {
        let report = SightingReport {
            animal_id: Uuid::new_v4(),
            observed_time: Utc::now(),
            location: Coordinate::new(1.0, 2.0),
            image_reference: Some("sightings/abc.jpg".to_string()),
        };
        let id = Uuid::new_v4();
        let reporter = Uuid::new_v4();
        let created = Utc::now();

        let record = SightingRecord::from_report(report.clone(), id, reporter, created);

        assert_eq!(record.id, id);
        assert_eq!(record.reporter_id, reporter);
        assert_eq!(record.created_at, created);
        assert_eq!(record.animal_id, report.animal_id);
        assert_eq!(record.observed_time, report.observed_time);
        assert_eq!(record.location, report.location);
        assert_eq!(record.image_reference, report.image_reference);
    }

    #[test]
    fn test_report_image_reference_is_optional_in_json() {
        let json = serde_json::json!({
            "animal_id": Uuid::nil(),
            "observed_time": "2024-03-01T10:00:00Z",
            "location": { "latitude": 1.5, "longitude": -2.5 }
        });
        let report: SightingReport = serde_json::from_value(json).unwrap();
        assert!(report.image_reference.is_none());
        assert_eq!(report.location, Coordinate::new(1.5, -2.5));
    }
}
