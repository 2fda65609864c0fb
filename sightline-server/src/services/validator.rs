//! Acceptance rules for incoming sighting reports
//!
//! Rules run in a fixed order and the first failure wins:
//! 1. coordinates in range
//! 2. distance from the reference point at least `min_distance_meters`
//! 3. observation not in the future (if enabled)
//! 4. observation strictly after the reference time (if enabled)
//!
//! The reference is the animal's latest sighting when one exists, otherwise
//! the animal's registration data. Location and time always come from the
//! same reference.

use chrono::{DateTime, Utc};

use sightline_common::config::ValidationConfig;
use sightline_common::models::{Animal, SightingRecord, SightingReport};
use sightline_common::{distance, Coordinate, Error, Result};

/// Reports strictly closer than this (meters) are duplicates of the last position
pub const DEFAULT_MIN_DISTANCE_METERS: f64 = 5000.0;

/// Which temporal checks are enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalPolicy {
    pub reject_future: bool,
    pub require_after_reference: bool,
}

impl TemporalPolicy {
    /// Both checks enabled
    pub const fn strict() -> Self {
        Self {
            reject_future: true,
            require_after_reference: true,
        }
    }

    /// No temporal checks
    pub const fn disabled() -> Self {
        Self {
            reject_future: false,
            require_after_reference: false,
        }
    }
}

impl Default for TemporalPolicy {
    fn default() -> Self {
        Self::strict()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationPolicy {
    pub min_distance_meters: f64,
    pub temporal: TemporalPolicy,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            min_distance_meters: DEFAULT_MIN_DISTANCE_METERS,
            temporal: TemporalPolicy::strict(),
        }
    }
}

impl From<&ValidationConfig> for ValidationPolicy {
    fn from(config: &ValidationConfig) -> Self {
        Self {
            min_distance_meters: config.min_distance_meters,
            temporal: TemporalPolicy {
                reject_future: config.reject_future,
                require_after_reference: config.require_after_reference,
            },
        }
    }
}

/// Where and when the animal was last known to be
#[derive(Debug, Clone, Copy)]
struct Reference {
    location: Coordinate,
    time: DateTime<Utc>,
}

impl Reference {
    fn select(animal: &Animal, latest: Option<&SightingRecord>) -> Self {
        match latest {
            Some(record) => Self {
                location: record.location,
                time: record.observed_time,
            },
            None => Self {
                location: animal.last_known_location,
                time: animal.last_known_time,
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SightingValidator {
    policy: ValidationPolicy,
}

impl SightingValidator {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    /// Decide whether `report` may be accepted
    ///
    /// `latest` is the animal's most recent recorded sighting, if any.
    /// `now` is passed in so the future-time rule is deterministic.
    pub fn validate(
        &self,
        report: &SightingReport,
        animal: &Animal,
        latest: Option<&SightingRecord>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        report.location.validate()?;

        let reference = Reference::select(animal, latest);

        let distance_meters = distance(report.location, reference.location);
        if distance_meters < self.policy.min_distance_meters {
            return Err(Error::SightingTooClose { distance_meters });
        }

        let temporal = self.policy.temporal;
        if temporal.reject_future && report.observed_time > now {
            return Err(Error::InvalidObservationTime(
                "observation time cannot be in the future".to_string(),
            ));
        }
        if temporal.require_after_reference && report.observed_time <= reference.time {
            return Err(Error::InvalidObservationTime(format!(
                "observation time must be after the last recorded sighting ({})",
                reference.time.to_rfc3339()
            )));
        }

        Ok(())
    }
}
