//! Shared fixtures for sightline-server integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

use sightline_common::models::{Animal, User};
use sightline_common::Coordinate;
use sightline_server::mailer::{EmailSender, MailError};
use sightline_server::repository::{AnimalRepository, MemoryStore, UserRepository};

/// One captured `send` call
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub email: String,
    pub template: String,
    pub data: serde_json::Value,
}

/// Email sender that records deliveries, with per-address failure and delay injection
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<SentMessage>>,
    attempts: Mutex<Vec<String>>,
    fail_for: HashSet<String>,
    delay_for: HashMap<String, Duration>,
}

impl RecordingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, email: &str) -> Self {
        self.fail_for.insert(email.to_string());
        self
    }

    pub fn delayed_for(mut self, email: &str, delay: Duration) -> Self {
        self.delay_for.insert(email.to_string(), delay);
        self
    }

    /// Successful deliveries in completion order
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Every address a send was attempted for, successful or not
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(
        &self,
        recipient_email: &str,
        template_name: &str,
        data: &serde_json::Value,
    ) -> Result<(), MailError> {
        self.attempts.lock().unwrap().push(recipient_email.to_string());

        if let Some(delay) = self.delay_for.get(recipient_email) {
            tokio::time::sleep(*delay).await;
        }
        if self.fail_for.contains(recipient_email) {
            return Err(MailError::Transport(format!("{} rejected", recipient_email)));
        }

        self.sent.lock().unwrap().push(SentMessage {
            email: recipient_email.to_string(),
            template: template_name.to_string(),
            data: data.clone(),
        });
        Ok(())
    }
}

/// Register an animal last seen at `(latitude, longitude)` at `last_known_time`
pub async fn seed_animal(
    store: &MemoryStore,
    latitude: f64,
    longitude: f64,
    last_known_time: DateTime<Utc>,
) -> Animal {
    let animal = Animal {
        id: Uuid::new_v4(),
        name: format!("animal-{}", Uuid::new_v4()),
        last_known_time,
        last_known_location: Coordinate::new(latitude, longitude),
    };
    AnimalRepository::create(store, &animal).await.unwrap();
    animal
}

pub async fn seed_user(store: &MemoryStore, name: &str) -> User {
    let user = User {
        id: Uuid::new_v4(),
        display_name: name.to_string(),
        email: format!("{}@example.org", name.to_lowercase()),
    };
    UserRepository::create(store, &user).await.unwrap();
    user
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    Utc::now() - ChronoDuration::days(days)
}

pub fn hours_ago(hours: i64) -> DateTime<Utc> {
    Utc::now() - ChronoDuration::hours(hours)
}
