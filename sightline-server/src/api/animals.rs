//! Animal registration and listing

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use sightline_common::models::{Animal, NewAnimal};

use crate::api::json_rejection;
use crate::pagination::{Page, PageParams};
use crate::{ApiResult, AppState};

/// POST /animals
pub async fn create_animal(
    State(state): State<AppState>,
    payload: Result<Json<NewAnimal>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Animal>)> {
    let Json(input) = payload.map_err(json_rejection)?;
    let animal = state.animals.register(input).await?;
    Ok((StatusCode::CREATED, Json(animal)))
}

/// GET /animals?limit&offset
pub async fn list_animals(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Vec<Animal>>> {
    let animals = state.animals.list(Page::from_params(params)).await?;
    Ok(Json(animals))
}

pub fn animal_routes() -> Router<AppState> {
    Router::new().route("/animals", get(list_animals).post(create_animal))
}
