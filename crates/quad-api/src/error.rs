//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use quad_core::{ErrorKind, store::StoreError};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler. Rendered as `{"detail": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("Authentication credentials were not provided.")]
  Unauthorized,

  #[error("{0}")]
  BadRequest(String),

  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error: domain rule violations keep their message and
  /// map to 4xx, anything else is a store fault.
  pub fn store<E: StoreError>(e: E) -> Self {
    match e.domain() {
      Some(domain) => domain.clone().into(),
      None => ApiError::Store(Box::new(e)),
    }
  }
}

impl From<quad_core::Error> for ApiError {
  fn from(e: quad_core::Error) -> Self {
    let message = e.to_string();
    match e.kind() {
      ErrorKind::Validation => ApiError::BadRequest(message),
      ErrorKind::Permission => ApiError::Forbidden(message),
      ErrorKind::NotFound => ApiError::NotFound(message),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };
    (status, Json(json!({ "detail": self.to_string() }))).into_response()
  }
}
