//! Handlers for `/posts/posts` and `/posts/comments` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`, `POST` | `/posts/posts` | Optional `?user_id=`; create returns 201 + [`Post`] |
//! | `GET`, `PUT`, `DELETE` | `/posts/posts/{id}` | Edit and delete are author-only |
//! | `POST` | `/posts/posts/{id}/like`, `/unlike` | Idempotent |
//! | `GET`  | `/posts/posts/{id}/share_url` | |
//! | `GET`, `POST` | `/posts/comments` | `?post=` required on `GET` |
//! | `DELETE` | `/posts/comments/{id}` | Author-only |
//! | `POST` | `/posts/comments/{id}/like`, `/unlike` | No notification |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use quad_core::{
  post::{CommentView, NewComment, NewPost, Post, PostUpdate, PostView},
  store::SocialStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{ApiState, actor::Actor, error::ApiError, push, status};

// ─── Posts ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Restrict the feed to one author.
  pub user_id: Option<i64>,
}

/// `GET /posts/posts[?user_id=<id>]`
pub async fn list<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<PostView>>, ApiError> {
  let posts = state
    .store
    .list_posts(actor, params.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(posts))
}

/// `POST /posts/posts`
pub async fn create<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Json(body): Json<NewPost>,
) -> Result<impl IntoResponse, ApiError> {
  let post = state.store.create_post(actor, body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(post)))
}

/// `GET /posts/posts/{id}`
pub async fn get_one<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<i64>,
) -> Result<Json<PostView>, ApiError> {
  let post = state
    .store
    .get_post(actor, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("Post not found".into()))?;
  Ok(Json(post))
}

/// `PUT /posts/posts/{id}`
pub async fn update<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<i64>,
  Json(body): Json<PostUpdate>,
) -> Result<Json<Post>, ApiError> {
  let post = state.store.edit_post(actor, id, body).await.map_err(ApiError::store)?;
  Ok(Json(post))
}

/// `DELETE /posts/posts/{id}`
pub async fn delete<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
  state.store.delete_post(actor, id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /posts/posts/{id}/like`
pub async fn like<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
  let engagement = state.store.like_post(actor, id).await.map_err(ApiError::store)?;
  if let Some(notification) = &engagement.notification {
    push::deliver(state.store.as_ref(), &state.push, notification).await;
  }
  Ok(status("liked"))
}

/// `POST /posts/posts/{id}/unlike`
pub async fn unlike<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
  state.store.unlike_post(actor, id).await.map_err(ApiError::store)?;
  Ok(status("unliked"))
}

/// `GET /posts/posts/{id}/share_url`
pub async fn share_url<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
  let post = state
    .store
    .get_post(actor, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("Post not found".into()))?;
  let share_url = format!("{}/api/posts/posts/{}/", state.public_base_url, post.id);
  Ok(Json(json!({ "share_url": share_url, "post_id": post.id })))
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CommentParams {
  pub post: Option<i64>,
}

/// `GET /posts/comments?post=<id>`: top-level comments, oldest first.
pub async fn list_comments<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(_): Actor,
  Query(params): Query<CommentParams>,
) -> Result<Json<Vec<CommentView>>, ApiError> {
  let post = params
    .post
    .ok_or_else(|| ApiError::BadRequest("post is required".into()))?;
  let comments = state.store.list_comments(post).await.map_err(ApiError::store)?;
  Ok(Json(comments))
}

/// `POST /posts/comments`: body `{"post": 1, "content": "...", "parent": null}`
pub async fn create_comment<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Json(body): Json<NewComment>,
) -> Result<impl IntoResponse, ApiError> {
  let (comment, notification) = state
    .store
    .create_comment(actor, body)
    .await
    .map_err(ApiError::store)?;
  if let Some(notification) = &notification {
    push::deliver(state.store.as_ref(), &state.push, notification).await;
  }
  Ok((StatusCode::CREATED, Json(comment)))
}

/// `DELETE /posts/comments/{id}`
pub async fn delete_comment<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
  state.store.delete_comment(actor, id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /posts/comments/{id}/like`
pub async fn like_comment<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
  state.store.like_comment(actor, id).await.map_err(ApiError::store)?;
  Ok(status("liked"))
}

/// `POST /posts/comments/{id}/unlike`
pub async fn unlike_comment<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
  state.store.unlike_comment(actor, id).await.map_err(ApiError::store)?;
  Ok(status("unliked"))
}
