//! Handlers for `/messages` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/messages/conversations` | The actor's conversations, latest activity first |
//! | `POST` | `/messages/start` | Body: `{"user_id": 9}`; get-or-create |
//! | `GET`, `POST` | `/messages/conversations/{id}/messages` | Participants only; `GET` marks read |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use quad_core::{
  message::{ConversationView, MessageView},
  store::SocialStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{ApiState, actor::Actor, error::ApiError};

/// `GET /messages/conversations`
pub async fn list_conversations<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
) -> Result<Json<Vec<ConversationView>>, ApiError> {
  let conversations = state
    .store
    .list_conversations(actor)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(conversations))
}

#[derive(Debug, Deserialize)]
pub struct StartBody {
  pub user_id: Option<i64>,
}

/// `POST /messages/start`
pub async fn start<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Json(body): Json<StartBody>,
) -> Result<Json<Value>, ApiError> {
  let other = body
    .user_id
    .ok_or_else(|| ApiError::BadRequest("user_id is required".into()))?;
  let conversation = state
    .store
    .start_conversation(actor, other)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "conversation_id": conversation.id })))
}

/// `GET /messages/conversations/{id}/messages`
pub async fn list_messages<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<i64>,
) -> Result<Json<Vec<MessageView>>, ApiError> {
  let messages = state.store.list_messages(actor, id).await.map_err(ApiError::store)?;
  Ok(Json(messages))
}

#[derive(Debug, Deserialize)]
pub struct SendBody {
  #[serde(default)]
  pub text: String,
}

/// `POST /messages/conversations/{id}/messages`: body `{"text": "..."}`
pub async fn send<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<i64>,
  Json(body): Json<SendBody>,
) -> Result<impl IntoResponse, ApiError> {
  let message = state
    .store
    .send_message(actor, id, body.text)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(message)))
}
