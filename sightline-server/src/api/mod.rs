//! HTTP API handlers

pub mod animals;
pub mod auth;
pub mod health;
pub mod sightings;
pub mod users;

pub use animals::animal_routes;
pub use auth::{ReporterId, USER_ID_HEADER};
pub use health::health_routes;
pub use sightings::sighting_routes;
pub use users::user_routes;

use axum::extract::rejection::{JsonRejection, PathRejection};

use crate::ApiError;

/// Body rejections are rendered in the same envelope as domain errors
pub(crate) fn json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::BadRequest(rejection.body_text())
}

/// Malformed path segments, e.g. a non-UUID animal id
pub(crate) fn path_rejection(rejection: PathRejection) -> ApiError {
    ApiError::BadRequest(rejection.body_text())
}
