//! User registration
//!
//! Only what notification delivery needs: a display name and an address.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tracing::{error, info};

use sightline_common::models::User;
use sightline_common::{uuid_utils, Error};

use crate::api::json_rejection;
use crate::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct NewUserRequest {
    pub display_name: String,
    pub email: String,
}

impl NewUserRequest {
    fn into_user(self) -> Result<User, Error> {
        let display_name = self.display_name.trim();
        if display_name.is_empty() {
            return Err(Error::InvalidInput("display_name must not be empty".to_string()));
        }

        let email = self.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err(Error::InvalidInput(format!("invalid email address '{}'", email))),
        }

        Ok(User {
            id: uuid_utils::generate(),
            display_name: display_name.to_string(),
            email: email.to_string(),
        })
    }
}

/// POST /users
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<NewUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let Json(request) = payload.map_err(json_rejection)?;
    let user = request.into_user()?;

    match state.repos.users.create(&user).await {
        Ok(()) => {}
        Err(e @ Error::Conflict(_)) => return Err(e.into()),
        Err(e) => {
            error!(error = %e, "Failed to create user");
            return Err(Error::internal("failed to create user").into());
        }
    }

    info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/users", post(create_user))
}
