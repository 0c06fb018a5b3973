//! Handlers for `/notifications` endpoints.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use quad_core::{notification::NotificationView, store::SocialStore};
use serde::Deserialize;
use serde_json::Value;

use crate::{ApiState, actor::Actor, error::ApiError, status};

/// `GET /notifications`: newest first.
pub async fn list<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
) -> Result<Json<Vec<NotificationView>>, ApiError> {
  Ok(Json(state.store.list_notifications(actor).await.map_err(ApiError::store)?))
}

/// `POST /notifications/mark-all-read`
pub async fn mark_all_read<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
) -> Result<Json<Value>, ApiError> {
  let marked = state.store.mark_all_read(actor).await.map_err(ApiError::store)?;
  tracing::debug!(user_id = actor, marked, "marked notifications read");
  Ok(status("ok"))
}

/// `POST /notifications/{id}/mark-read`
pub async fn mark_read<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
  state.store.mark_read(actor, id).await.map_err(ApiError::store)?;
  Ok(status("ok"))
}

#[derive(Debug, Deserialize)]
pub struct PushTokenBody {
  #[serde(default)]
  pub token: String,
}

/// `POST /notifications/push-tokens`: body `{"token": "..."}`
pub async fn register_push_token<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Json(body): Json<PushTokenBody>,
) -> Result<impl IntoResponse, ApiError> {
  let token = state
    .store
    .register_push_token(actor, body.token)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(token)))
}
