//! Sighting ingestion: validate, persist, publish

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use sightline_common::models::{SightingRecord, SightingReport};
use sightline_common::{time, uuid_utils, Error, NotificationBroker, NotificationEvent, Result};

use crate::repository::{AnimalRepository, SightingRepository};
use crate::services::validator::{SightingValidator, ValidationPolicy};

/// Per-animal submit locks
///
/// Entries are created on demand and removed when the last holder or
/// waiter for an animal is gone.
#[derive(Default)]
struct AnimalLocks {
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl AnimalLocks {
    async fn acquire(&self, animal_id: Uuid) -> AnimalGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(animal_id).or_default().clone()
        };
        let guard = lock.clone().lock_owned().await;
        AnimalGuard {
            locks: self,
            animal_id,
            lock,
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

struct AnimalGuard<'a> {
    locks: &'a AnimalLocks,
    animal_id: Uuid,
    lock: Arc<AsyncMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for AnimalGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the map and this guard still reference the lock: nobody is waiting
        if Arc::strong_count(&self.lock) == 2
            && locks
                .get(&self.animal_id)
                .is_some_and(|l| Arc::ptr_eq(l, &self.lock))
        {
            locks.remove(&self.animal_id);
        }
    }
}

/// Orchestrates one incoming report end to end
///
/// Exactly one [`NotificationEvent`] is published per persisted sighting and
/// none for a rejected or failed report. Publication is fire-and-forget:
/// once the record is stored the caller gets success, whatever happens to
/// the notification afterwards.
///
/// Submits for the same animal are serialized from the latest-sighting read
/// through persistence, so each report is validated against the record the
/// previous accepted report wrote. Submits for different animals run
/// concurrently.
pub struct SightingIngestor {
    animals: Arc<dyn AnimalRepository>,
    sightings: Arc<dyn SightingRepository>,
    broker: NotificationBroker,
    validator: SightingValidator,
    locks: AnimalLocks,
}

impl SightingIngestor {
    pub fn new(
        animals: Arc<dyn AnimalRepository>,
        sightings: Arc<dyn SightingRepository>,
        broker: NotificationBroker,
        policy: ValidationPolicy,
    ) -> Self {
        Self {
            animals,
            sightings,
            broker,
            validator: SightingValidator::new(policy),
            locks: AnimalLocks::default(),
        }
    }

    /// Accept or reject `report` on behalf of `reporter_id`
    ///
    /// Errors: `AnimalNotFound`, the validator's typed rejections (unchanged),
    /// or `Internal` for unexpected repository failures.
    pub async fn submit(&self, report: SightingReport, reporter_id: Uuid) -> Result<SightingRecord> {
        let animal_id = report.animal_id;

        let animal = match self.animals.get_by_id(animal_id).await {
            Ok(animal) => animal,
            Err(Error::NotFound(_)) => return Err(Error::AnimalNotFound(animal_id)),
            Err(e) => {
                error!(animal_id = %animal_id, error = %e, "Unexpected error getting animal by id");
                return Err(Error::internal("failed to retrieve animal"));
            }
        };

        let _guard = self.locks.acquire(animal_id).await;

        let latest = self
            .sightings
            .get_latest_by_animal_id(animal_id)
            .await
            .map_err(|e| {
                error!(animal_id = %animal_id, error = %e, "Unexpected error getting latest sighting");
                Error::internal("failed to retrieve latest sighting")
            })?;

        if let Err(rejection) = self
            .validator
            .validate(&report, &animal, latest.as_ref(), time::now())
        {
            if !rejection.kind().is_validation() {
                error!(animal_id = %animal_id, error = %rejection, "Unexpected validator failure");
                return Err(Error::internal("failed to validate sighting"));
            }
            debug!(
                animal_id = %animal_id,
                reporter_id = %reporter_id,
                kind = ?rejection.kind(),
                "Sighting rejected: {}",
                rejection
            );
            return Err(rejection);
        }

        let record = SightingRecord::from_report(report, uuid_utils::generate(), reporter_id, time::now());

        self.sightings.create(&record).await.map_err(|e| {
            error!(animal_id = %animal_id, sighting_id = %record.id, error = %e, "Unexpected error creating sighting");
            Error::internal("failed to create sighting")
        })?;

        info!(
            animal_id = %animal_id,
            sighting_id = %record.id,
            reporter_id = %reporter_id,
            "Sighting recorded"
        );

        if let Err(e) = self.broker.publish(NotificationEvent::from_record(&record)) {
            // Shutdown in progress; the record stands, the alert is lost
            warn!(sighting_id = %record.id, error = %e, "Notification not published");
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_lock_entry_removed_after_release() {
        let locks = AnimalLocks::default();
        let animal = Uuid::new_v4();

        {
            let _guard = locks.acquire(animal).await;
            assert_eq!(locks.len(), 1);
        }
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn test_same_animal_waits_other_animal_does_not() {
        let locks = Arc::new(AnimalLocks::default());
        let animal = Uuid::new_v4();
        let first = locks.acquire(animal).await;

        // A different animal is not blocked
        let other = tokio::time::timeout(Duration::from_millis(200), locks.acquire(Uuid::new_v4())).await;
        assert!(other.is_ok());
        drop(other);

        // The same animal is blocked until the first guard goes away
        let blocked = tokio::time::timeout(Duration::from_millis(50), locks.acquire(animal)).await;
        assert!(blocked.is_err());

        drop(first);
        let second = tokio::time::timeout(Duration::from_millis(200), locks.acquire(animal)).await;
        assert!(second.is_ok());
        drop(second);
        assert_eq!(locks.len(), 0);
    }
}
