//! Animal registration

use std::sync::Arc;
use tracing::{error, info};

use sightline_common::models::{Animal, NewAnimal};
use sightline_common::{time, uuid_utils, Error, Result};

use crate::pagination::Page;
use crate::repository::AnimalRepository;

pub struct AnimalRegistry {
    animals: Arc<dyn AnimalRepository>,
}

impl AnimalRegistry {
    pub fn new(animals: Arc<dyn AnimalRepository>) -> Self {
        Self { animals }
    }

    /// Validate and store a new animal
    pub async fn register(&self, input: NewAnimal) -> Result<Animal> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("name must not be empty".to_string()));
        }
        input.last_known_location.validate()?;
        if input.last_known_time > time::now() {
            return Err(Error::InvalidObservationTime(
                "last known time cannot be in the future".to_string(),
            ));
        }

        let animal = Animal {
            id: uuid_utils::generate(),
            name: name.to_string(),
            last_known_time: input.last_known_time,
            last_known_location: input.last_known_location,
        };

        match self.animals.create(&animal).await {
            Ok(()) => {}
            Err(e @ Error::Conflict(_)) => return Err(e),
            Err(e) => {
                error!(name = %animal.name, error = %e, "Failed to create animal");
                return Err(Error::internal("failed to create animal"));
            }
        }

        info!(animal_id = %animal.id, name = %animal.name, "Animal registered");
        Ok(animal)
    }

    pub async fn list(&self, page: Page) -> Result<Vec<Animal>> {
        self.animals.list(page.limit, page.offset).await.map_err(|e| {
            error!(error = %e, "Failed to list animals");
            Error::internal("failed to list animals")
        })
    }
}
