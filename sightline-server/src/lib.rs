//! sightline-server library interface
//!
//! Sighting ingestion, notification fan-out and the HTTP transport.
//! Exposed as a library so integration tests can assemble the same
//! components `main` wires together.

pub mod api;
pub mod error;
pub mod mailer;
pub mod pagination;
pub mod repository;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use sightline_common::NotificationBroker;

use crate::repository::Repositories;
use crate::services::{AnimalRegistry, SightingIngestor, SightingQuery, ValidationPolicy};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub ingestor: Arc<SightingIngestor>,
    pub sightings: Arc<SightingQuery>,
    pub animals: Arc<AnimalRegistry>,
    pub repos: Repositories,
}

impl AppState {
    /// Wire the request-side services over a set of repositories
    pub fn new(repos: Repositories, broker: NotificationBroker, policy: ValidationPolicy) -> Self {
        let ingestor = SightingIngestor::new(
            repos.animals.clone(),
            repos.sightings.clone(),
            broker,
            policy,
        );
        let sightings = SightingQuery::new(repos.animals.clone(), repos.sightings.clone());
        let animals = AnimalRegistry::new(repos.animals.clone());

        Self {
            ingestor: Arc::new(ingestor),
            sightings: Arc::new(sightings),
            animals: Arc::new(animals),
            repos,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::animal_routes())
        .merge(api::sighting_routes())
        .merge(api::user_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
