//! Handlers for `/accounts` endpoints other than registration and login.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/accounts/me` | The actor's [`UserView`] |
//! | `GET`  | `/accounts/users/{id}` | 404 if not found |
//! | `GET`, `PUT` | `/accounts/profile` | Partial update on `PUT` |
//! | `GET`  | `/accounts/profile/{id}/share` | `{"share_url": ...}` |
//! | `PATCH` | `/accounts/update-email` | Body: `{"university_email": ...}` or `{"email": ...}` |
//! | `POST`, `DELETE` | `/accounts/follow/{id}` | Follow / unfollow |
//! | `GET`  | `/accounts/friends`, `/friend-requests`, `/friend-suggestions` | |
//! | `GET`  | `/accounts/search?q=&type=` | `type` is `users` (default), `posts`, or anything else for both |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use quad_core::{
  graph::{SearchKind, SearchResults},
  store::SocialStore,
  user::{Profile, ProfileUpdate, UserView},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{ApiState, actor::Actor, error::ApiError, push, status};

// ─── Users ───────────────────────────────────────────────────────────────────

/// `GET /accounts/me`
pub async fn me<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
) -> Result<Json<UserView>, ApiError> {
  let user = state
    .store
    .get_user(actor)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
  Ok(Json(user))
}

/// `GET /accounts/users/{id}`
pub async fn get_user<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(_): Actor,
  Path(id): Path<i64>,
) -> Result<Json<UserView>, ApiError> {
  let user = state
    .store
    .get_user(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
  Ok(Json(user))
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// `GET /accounts/profile`
pub async fn get_profile<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
) -> Result<Json<Profile>, ApiError> {
  let profile = state.store.get_profile(actor).await.map_err(ApiError::store)?;
  Ok(Json(profile))
}

/// `PUT /accounts/profile`
pub async fn update_profile<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Json(update): Json<ProfileUpdate>,
) -> Result<Json<Profile>, ApiError> {
  let profile = state
    .store
    .update_profile(actor, update)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(profile))
}

/// `GET /accounts/profile/{id}/share`
pub async fn profile_share_url<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(_): Actor,
  Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
  let user = state
    .store
    .get_user(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
  let share_url = format!("{}/profile/{}", state.public_base_url, user.id);
  Ok(Json(json!({ "share_url": share_url })))
}

/// Both spellings are accepted; `university_email` wins when both are sent.
#[derive(Debug, Deserialize)]
pub struct UpdateEmailBody {
  pub university_email: Option<String>,
  pub email:            Option<String>,
}

/// `PATCH /accounts/update-email`
pub async fn update_email<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Json(body): Json<UpdateEmailBody>,
) -> Result<Json<Value>, ApiError> {
  let email = body.university_email.or(body.email).unwrap_or_default();
  let email = state
    .store
    .update_email(actor, email)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "status": "ok", "university_email": email })))
}

// ─── Follow graph ────────────────────────────────────────────────────────────

/// `POST /accounts/follow/{id}`
pub async fn follow<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(target): Path<i64>,
) -> Result<Json<Value>, ApiError> {
  let engagement = state.store.follow(actor, target).await.map_err(ApiError::store)?;
  if let Some(notification) = &engagement.notification {
    push::deliver(state.store.as_ref(), &state.push, notification).await;
  }
  Ok(status("following"))
}

/// `DELETE /accounts/follow/{id}`
pub async fn unfollow<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Path(target): Path<i64>,
) -> Result<Json<Value>, ApiError> {
  state.store.unfollow(actor, target).await.map_err(ApiError::store)?;
  Ok(status("unfollowed"))
}

/// `GET /accounts/friends`
pub async fn friends<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
) -> Result<Json<Vec<UserView>>, ApiError> {
  Ok(Json(state.store.friends(actor).await.map_err(ApiError::store)?))
}

/// `GET /accounts/friend-requests`
pub async fn friend_requests<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
) -> Result<Json<Vec<UserView>>, ApiError> {
  Ok(Json(state.store.friend_requests(actor).await.map_err(ApiError::store)?))
}

/// `GET /accounts/friend-suggestions`
pub async fn friend_suggestions<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
) -> Result<Json<Vec<UserView>>, ApiError> {
  Ok(Json(state.store.friend_suggestions(actor).await.map_err(ApiError::store)?))
}

// ─── Search ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
  #[serde(default)]
  pub q:    String,
  #[serde(rename = "type")]
  pub kind: Option<String>,
}

/// `GET /accounts/search?q=<query>[&type=users|posts|all]`
pub async fn search<S: SocialStore>(
  State(state): State<ApiState<S>>,
  Actor(actor): Actor,
  Query(params): Query<SearchParams>,
) -> Result<Json<SearchResults>, ApiError> {
  let kind = SearchKind::from_param(params.kind.as_deref());
  let results = state
    .store
    .search(actor, params.q, kind)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(results))
}
