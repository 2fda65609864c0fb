//! Read side for recorded sightings

use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use sightline_common::models::SightingRecord;
use sightline_common::{Error, Result};

use crate::pagination::Page;
use crate::repository::{AnimalRepository, SightingRepository};

pub struct SightingQuery {
    animals: Arc<dyn AnimalRepository>,
    sightings: Arc<dyn SightingRepository>,
}

impl SightingQuery {
    pub fn new(animals: Arc<dyn AnimalRepository>, sightings: Arc<dyn SightingRepository>) -> Self {
        Self { animals, sightings }
    }

    /// Sightings of one animal, newest observation first
    pub async fn list(&self, animal_id: Uuid, page: Page) -> Result<Vec<SightingRecord>> {
        match self.animals.get_by_id(animal_id).await {
            Ok(_) => {}
            Err(Error::NotFound(_)) => return Err(Error::AnimalNotFound(animal_id)),
            Err(e) => {
                error!(animal_id = %animal_id, error = %e, "Failed to look up animal for listing");
                return Err(Error::internal("failed to retrieve animal"));
            }
        }

        self.sightings
            .list_by_animal_id(animal_id, page.limit, page.offset)
            .await
            .map_err(|e| {
                error!(animal_id = %animal_id, error = %e, "Failed to list sightings");
                Error::internal("failed to list sightings")
            })
    }
}
