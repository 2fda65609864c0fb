//! Reporter identity
//!
//! Authentication is handled upstream; by the time a request reaches this
//! service the authenticated user id is carried in the `X-User-Id` header.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use sightline_common::uuid_utils;

use crate::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated user submitting the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReporterId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for ReporterId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("missing X-User-Id header".to_string()))?;

        let value = value
            .to_str()
            .map_err(|_| ApiError::Unauthorized("malformed X-User-Id header".to_string()))?;

        uuid_utils::parse(value)
            .map(ReporterId)
            .map_err(|_| ApiError::Unauthorized("malformed X-User-Id header".to_string()))
    }
}
