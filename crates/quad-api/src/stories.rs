//! Handlers for `/posts/stories` and `/posts/story-replies` endpoints.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use quad_core::{
  store::SocialStore,
  story::{NewStory, NewStoryReply, StoryReplyView, StoryView},
};
use serde::Deserialize;
use serde_json::Value;

use crate::{ApiState, actor::Actor, error::ApiError, status};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Point in time to evaluate expiry at. Defaults to now.
  pub as_of: Option<DateTime<Utc>>,
}

/// `GET /posts/stories[?as_of=<rfc3339>]`: unexpired stories by the actor and
/// everyone they follow.
pub async fn list<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<StoryView>>, ApiError> {
  let stories = state
    .store
    .list_stories(actor, params.as_of)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(stories))
}

/// `POST /posts/stories`: body `{"image_url": "..."}`
pub async fn create<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Json(body): Json<NewStory>,
) -> Result<impl IntoResponse, ApiError> {
  let story = state.store.create_story(actor, body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(story)))
}

/// `DELETE /posts/stories/{id}`
pub async fn delete<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
  state.store.delete_story(actor, id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /posts/stories/{id}/like`
pub async fn like<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
  state.store.like_story(actor, id).await.map_err(ApiError::store)?;
  Ok(status("liked"))
}

/// `POST /posts/stories/{id}/unlike`
pub async fn unlike<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
  state.store.unlike_story(actor, id).await.map_err(ApiError::store)?;
  Ok(status("unliked"))
}

// ─── Replies ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReplyParams {
  pub story: Option<i64>,
}

/// `GET /posts/story-replies?story=<id>`
pub async fn list_replies<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(_): Actor,
  Query(params): Query<ReplyParams>,
) -> Result<Json<Vec<StoryReplyView>>, ApiError> {
  let story = params
    .story
    .ok_or_else(|| ApiError::BadRequest("story is required".into()))?;
  let replies = state.store.list_story_replies(story).await.map_err(ApiError::store)?;
  Ok(Json(replies))
}

/// `POST /posts/story-replies`: body `{"story": 1, "content": "..."}`
pub async fn create_reply<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Json(body): Json<NewStoryReply>,
) -> Result<impl IntoResponse, ApiError> {
  let reply = state
    .store
    .create_story_reply(actor, body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(reply)))
}

/// `DELETE /posts/story-replies/{id}`
pub async fn delete_reply<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
  state.store.delete_story_reply(actor, id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
