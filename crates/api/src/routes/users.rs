//! User registration hook, publishing on behalf of the user service.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use common::UserId;
use saga::UserRegistrar;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Builds the registration route around a registrar.
pub fn router(registrar: UserRegistrar) -> Router {
    Router::new()
        .route("/users", post(register))
        .with_state(registrar)
}

#[derive(Deserialize)]
pub struct RegisterUserRequest {
    pub user_id: i64,
}

#[derive(Serialize)]
pub struct RegisterUserResponse {
    pub user_id: UserId,
}

/// POST /users — announce a registered user.
///
/// Answers 202: the orders service learns about the user asynchronously.
pub async fn register(
    State(registrar): State<UserRegistrar>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<RegisterUserResponse>), ApiError> {
    let user_id = UserId::new(req.user_id);
    registrar.register(user_id).await?;
    Ok((StatusCode::ACCEPTED, Json(RegisterUserResponse { user_id })))
}
