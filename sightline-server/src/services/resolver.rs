//! Who should hear about a new sighting

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

use sightline_common::models::Recipient;
use sightline_common::{Error, Result};

use crate::repository::{SightingRepository, UserRepository};

/// Maps an animal to the users who have previously reported it
pub struct SighterResolver {
    sightings: Arc<dyn SightingRepository>,
    users: Arc<dyn UserRepository>,
}

impl SighterResolver {
    pub fn new(sightings: Arc<dyn SightingRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { sightings, users }
    }

    /// Distinct recipients for `animal_id`, in first-reported order
    ///
    /// A reporter whose user record cannot be loaded is skipped with a
    /// warning. Failing to list reporters at all is an `Internal` error and
    /// the caller drops the event.
    pub async fn resolve(&self, animal_id: Uuid) -> Result<Vec<Recipient>> {
        let reporter_ids = self
            .sightings
            .list_distinct_reporter_ids(animal_id)
            .await
            .map_err(|e| {
                error!(animal_id = %animal_id, error = %e, "Failed to list reporters");
                Error::internal("failed to list reporters")
            })?;

        let mut seen = HashSet::with_capacity(reporter_ids.len());
        let mut recipients = Vec::with_capacity(reporter_ids.len());

        for user_id in reporter_ids {
            if !seen.insert(user_id) {
                continue;
            }
            match self.users.get_by_id(user_id).await {
                Ok(user) => recipients.push(Recipient::from(user)),
                Err(e) => {
                    warn!(animal_id = %animal_id, user_id = %user_id, error = %e, "Skipping unresolvable reporter");
                }
            }
        }

        Ok(recipients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sightline_common::models::{SightingRecord, User};
    use std::collections::HashMap;

    /// Returns a fixed reporter list, duplicates included
    struct FixedReporters(Result<Vec<Uuid>>);

    #[async_trait]
    impl SightingRepository for FixedReporters {
        async fn get_latest_by_animal_id(&self, _: Uuid) -> Result<Option<SightingRecord>> {
            Ok(None)
        }
        async fn create(&self, _: &SightingRecord) -> Result<()> {
            Ok(())
        }
        async fn list_by_animal_id(&self, _: Uuid, _: i64, _: i64) -> Result<Vec<SightingRecord>> {
            Ok(Vec::new())
        }
        async fn list_distinct_reporter_ids(&self, _: Uuid) -> Result<Vec<Uuid>> {
            match &self.0 {
                Ok(ids) => Ok(ids.clone()),
                Err(e) => Err(Error::internal(e.to_string())),
            }
        }
    }

    struct Users(HashMap<Uuid, User>);

    #[async_trait]
    impl UserRepository for Users {
        async fn get_by_id(&self, id: Uuid) -> Result<User> {
            self.0
                .get(&id)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("user {}", id)))
        }
        async fn create(&self, _: &User) -> Result<()> {
            Ok(())
        }
    }

    fn user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            display_name: name.to_string(),
            email: format!("{}@example.org", name.to_lowercase()),
        }
    }

    fn resolver(ids: Result<Vec<Uuid>>, users: &[User]) -> SighterResolver {
        let users = users.iter().map(|u| (u.id, u.clone())).collect();
        SighterResolver::new(Arc::new(FixedReporters(ids)), Arc::new(Users(users)))
    }

    #[tokio::test]
    async fn test_duplicates_collapse_in_first_seen_order() {
        let a = user("Ana");
        let b = user("Budi");
        let resolver = resolver(Ok(vec![a.id, b.id, a.id]), &[a.clone(), b.clone()]);

        let recipients = resolver.resolve(Uuid::new_v4()).await.unwrap();
        assert_eq!(recipients.len(), 2);
        assert_eq!(recipients[0].user_id, a.id);
        assert_eq!(recipients[1].user_id, b.id);
        assert_eq!(recipients[1].email, "budi@example.org");
    }

    #[tokio::test]
    async fn test_missing_user_is_skipped() {
        let a = user("Ana");
        let ghost = Uuid::new_v4();
        let resolver = resolver(Ok(vec![ghost, a.id]), &[a.clone()]);

        let recipients = resolver.resolve(Uuid::new_v4()).await.unwrap();
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].user_id, a.id);
    }

    #[tokio::test]
    async fn test_no_reporters() {
        let resolver = resolver(Ok(Vec::new()), &[]);
        assert!(resolver.resolve(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listing_failure_is_internal() {
        let resolver = resolver(Err(Error::internal("disk on fire")), &[]);
        let err = resolver.resolve(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }
}
