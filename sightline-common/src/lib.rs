//! # Sightline Common Library
//!
//! Shared code for the Sightline sighting service:
//! - Coordinates and great-circle distance
//! - Domain models (animals, sightings, users, recipients)
//! - Error taxonomy with explicit kinds
//! - Notification events and the in-process broker
//! - Configuration loading
//! - Id and timestamp helpers

pub mod config;
pub mod error;
pub mod events;
pub mod geo;
pub mod models;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, ErrorKind, Result};
pub use events::{BrokerError, NotificationBroker, NotificationEvent, NotificationSubscription};
pub use geo::{distance, Coordinate};
