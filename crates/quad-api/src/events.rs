//! Handlers for `/events/events` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`, `POST` | `/events/events` | Latest start first; create returns 201 |
//! | `GET`, `PUT`, `DELETE` | `/events/events/{id}` | Edit and delete are creator-only |
//! | `POST` | `/events/events/{id}/interested`, `/going` | Upsert; the first RSVP notifies the creator |
//! | `POST` | `/events/events/{id}/uninterested` | Removes the RSVP |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use quad_core::{
  event::{AttendanceStatus, Event, EventUpdate, EventView, NewEvent},
  store::SocialStore,
};
use serde_json::Value;

use crate::{ApiState, actor::Actor, error::ApiError, push, status};

/// `GET /events/events`
pub async fn list<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
) -> Result<Json<Vec<EventView>>, ApiError> {
  Ok(Json(state.store.list_events(actor).await.map_err(ApiError::store)?))
}

/// `POST /events/events`
pub async fn create<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Json(body): Json<NewEvent>,
) -> Result<impl IntoResponse, ApiError> {
  let event = state.store.create_event(actor, body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(event)))
}

/// `GET /events/events/{id}`
pub async fn get_one<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<i64>,
) -> Result<Json<EventView>, ApiError> {
  let event = state
    .store
    .get_event(actor, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("Event not found".into()))?;
  Ok(Json(event))
}

/// `PUT /events/events/{id}`
pub async fn update<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<i64>,
  Json(body): Json<EventUpdate>,
) -> Result<Json<Event>, ApiError> {
  let event = state.store.update_event(actor, id, body).await.map_err(ApiError::store)?;
  Ok(Json(event))
}

/// `DELETE /events/events/{id}`
pub async fn delete<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
  state.store.delete_event(actor, id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

async fn rsvp<S: SocialStore>(
  state: &ApiState<S>,
  actor: i64,
  id: i64,
  attendance: AttendanceStatus,
) -> Result<Json<Value>, ApiError> {
  let engagement = state
    .store
    .set_attendance(actor, id, attendance)
    .await
    .map_err(ApiError::store)?;
  if let Some(notification) = &engagement.notification {
    push::deliver(state.store.as_ref(), &state.push, notification).await;
  }
  Ok(status(attendance.into()))
}

/// `POST /events/events/{id}/interested`
pub async fn interested<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
  rsvp(&state, actor, id, AttendanceStatus::Interested).await
}

/// `POST /events/events/{id}/going`
pub async fn going<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
  rsvp(&state, actor, id, AttendanceStatus::Going).await
}

/// `POST /events/events/{id}/uninterested`
pub async fn uninterested<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
  state.store.clear_attendance(actor, id).await.map_err(ApiError::store)?;
  Ok(status("uninterested"))
}
