//! Error type for the authentication endpoints.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use quad_api::ApiError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("password hashing failed: {0}")]
  PasswordHash(String),

  #[error(transparent)]
  Api(#[from] ApiError),
}

impl From<quad_core::Error> for Error {
  fn from(e: quad_core::Error) -> Self { Error::Api(e.into()) }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::PasswordHash(msg) => {
        tracing::error!(error = %msg, "password hashing failed");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "detail": msg }))).into_response()
      }
      Error::Api(e) => e.into_response(),
    }
  }
}
