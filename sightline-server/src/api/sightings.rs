//! Sighting submission and listing

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use sightline_common::models::{SightingRecord, SightingReport};
use sightline_common::Coordinate;

use crate::api::{json_rejection, path_rejection, ReporterId};
use crate::pagination::{Page, PageParams};
use crate::{ApiResult, AppState};

/// Request body for a new sighting; the animal comes from the path
#[derive(Debug, Deserialize)]
pub struct SightingRequest {
    pub observed_time: DateTime<Utc>,
    pub location: Coordinate,
    #[serde(default)]
    pub image_reference: Option<String>,
}

/// POST /animals/:id/sightings
pub async fn submit_sighting(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    ReporterId(reporter_id): ReporterId,
    payload: Result<Json<SightingRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SightingRecord>)> {
    let Path(animal_id) = path.map_err(path_rejection)?;
    let Json(request) = payload.map_err(json_rejection)?;
    let report = SightingReport {
        animal_id,
        observed_time: request.observed_time,
        location: request.location,
        image_reference: request.image_reference,
    };

    let record = state.ingestor.submit(report, reporter_id).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /animals/:id/sightings?limit&offset
pub async fn list_sightings(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Vec<SightingRecord>>> {
    let Path(animal_id) = path.map_err(path_rejection)?;
    let records = state.sightings.list(animal_id, Page::from_params(params)).await?;
    Ok(Json(records))
}

pub fn sighting_routes() -> Router<AppState> {
    Router::new().route(
        "/animals/:id/sightings",
        get(list_sightings).post(submit_sighting),
    )
}
