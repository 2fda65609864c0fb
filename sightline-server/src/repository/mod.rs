//! Persistence collaborators
//!
//! The sighting pipeline only sees these traits. Two adapters exist:
//! [`MemoryStore`] for tests and throwaway instances, [`SqliteStore`] for
//! real deployments. Both are safe for concurrent use from many tasks.
//!
//! Lookups of a single entity that does not exist fail with
//! [`sightline_common::Error::NotFound`]; anything else is a backend failure.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use sightline_common::models::{Animal, SightingRecord, User};
use sightline_common::Result;

#[async_trait]
pub trait AnimalRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Animal>;

    /// Fails with `Conflict` when the name is already taken
    async fn create(&self, animal: &Animal) -> Result<()>;

    /// Animals ordered by most recent `last_known_time`
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Animal>>;
}

#[async_trait]
pub trait SightingRepository: Send + Sync {
    /// Most recently observed sighting, `None` if the animal has none
    async fn get_latest_by_animal_id(&self, animal_id: Uuid) -> Result<Option<SightingRecord>>;

    async fn create(&self, record: &SightingRecord) -> Result<()>;

    /// Sightings newest-observed first
    async fn list_by_animal_id(
        &self,
        animal_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SightingRecord>>;

    /// Every user who has reported the animal, each listed once
    async fn list_distinct_reporter_ids(&self, animal_id: Uuid) -> Result<Vec<Uuid>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<User>;

    /// Fails with `Conflict` when the email is already registered
    async fn create(&self, user: &User) -> Result<()>;
}

/// The three repositories as trait objects
#[derive(Clone)]
pub struct Repositories {
    pub animals: Arc<dyn AnimalRepository>,
    pub sightings: Arc<dyn SightingRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    /// Use one store for all three repositories
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: AnimalRepository + SightingRepository + UserRepository + 'static,
    {
        Self {
            animals: store.clone(),
            sightings: store.clone(),
            users: store,
        }
    }
}
