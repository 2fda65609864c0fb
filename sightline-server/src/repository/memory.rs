//! In-memory repository adapter

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

use sightline_common::models::{Animal, SightingRecord, User};
use sightline_common::{Error, Result};

use super::{AnimalRepository, SightingRepository, UserRepository};

/// Process-local store implementing every repository trait
#[derive(Debug, Default)]
pub struct MemoryStore {
    animals: RwLock<HashMap<Uuid, Animal>>,
    sightings: RwLock<Vec<SightingRecord>>,
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    let offset = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
    let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
    items.into_iter().skip(offset).take(limit).collect()
}

#[async_trait]
impl AnimalRepository for MemoryStore {
    async fn get_by_id(&self, id: Uuid) -> Result<Animal> {
        self.animals
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("animal {}", id)))
    }

    async fn create(&self, animal: &Animal) -> Result<()> {
        let mut animals = self.animals.write().await;
        if animals.values().any(|a| a.name == animal.name) {
            return Err(Error::Conflict(format!("animal name '{}' already exists", animal.name)));
        }
        animals.insert(animal.id, animal.clone());
        Ok(())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Animal>> {
        let mut animals: Vec<Animal> = self.animals.read().await.values().cloned().collect();
        animals.sort_by(|a, b| {
            b.last_known_time
                .cmp(&a.last_known_time)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(page(animals, limit, offset))
    }
}

#[async_trait]
impl SightingRepository for MemoryStore {
    async fn get_latest_by_animal_id(&self, animal_id: Uuid) -> Result<Option<SightingRecord>> {
        Ok(self
            .sightings
            .read()
            .await
            .iter()
            .filter(|s| s.animal_id == animal_id)
            .max_by(|a, b| {
                a.observed_time
                    .cmp(&b.observed_time)
                    .then_with(|| a.created_at.cmp(&b.created_at))
            })
            .cloned())
    }

    async fn create(&self, record: &SightingRecord) -> Result<()> {
        let mut sightings = self.sightings.write().await;
        if sightings.iter().any(|s| s.id == record.id) {
            return Err(Error::Conflict(format!("sighting {} already exists", record.id)));
        }
        sightings.push(record.clone());
        Ok(())
    }

    async fn list_by_animal_id(
        &self,
        animal_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SightingRecord>> {
        let mut matching: Vec<SightingRecord> = self
            .sightings
            .read()
            .await
            .iter()
            .filter(|s| s.animal_id == animal_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.observed_time
                .cmp(&a.observed_time)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(page(matching, limit, offset))
    }

    async fn list_distinct_reporter_ids(&self, animal_id: Uuid) -> Result<Vec<Uuid>> {
        let sightings = self.sightings.read().await;
        let mut seen = HashSet::new();
        Ok(sightings
            .iter()
            .filter(|s| s.animal_id == animal_id)
            .map(|s| s.reporter_id)
            .filter(|id| seen.insert(*id))
            .collect())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn get_by_id(&self, id: Uuid) -> Result<User> {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("user {}", id)))
    }

    async fn create(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(Error::Conflict(format!("email '{}' already registered", user.email)));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }
}
