//! The authenticated user behind a request.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

/// Id of the authenticated user.
///
/// The API router never authenticates by itself: whatever sits in front of it
/// (the server's bearer-token middleware, or a test) inserts an `Actor` into
/// the request extensions. Handlers taking an `Actor` reject requests without
/// one with 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for Actor {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    parts.extensions.get::<Actor>().copied().ok_or(ApiError::Unauthorized)
  }
}
