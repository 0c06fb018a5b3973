//! JSON REST API for Quad.
//!
//! Exposes an axum [`Router`] backed by any [`quad_core::store::SocialStore`].
//! Authentication, TLS and transport concerns are the caller's responsibility:
//! the caller resolves credentials and inserts an [`Actor`] into the request
//! extensions before the request reaches these handlers.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", quad_api::api_router(state.clone()))
//! ```

pub mod accounts;
pub mod actor;
pub mod error;
pub mod events;
pub mod messages;
pub mod notifications;
pub mod posts;
pub mod push;
pub mod stories;

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{delete, get, patch, post},
};
use quad_core::store::SocialStore;
use serde_json::{Value, json};

pub use actor::Actor;
pub use error::ApiError;
pub use push::PushGateway;

/// Shared state threaded through all API handlers.
pub struct ApiState<S> {
  pub store:           Arc<S>,
  pub push:            PushGateway,
  /// Prefix of the share links handed out for profiles and posts.
  pub public_base_url: Arc<str>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:           Arc::clone(&self.store),
      push:            self.push.clone(),
      public_base_url: Arc::clone(&self.public_base_url),
    }
  }
}

impl<S> ApiState<S> {
  pub fn new(store: Arc<S>, push: PushGateway, public_base_url: &str) -> Self {
    Self { store, push, public_base_url: public_base_url.trim_end_matches('/').into() }
  }
}

/// `{"status": "<status>"}`
pub(crate) fn status(status: &'static str) -> Json<Value> { Json(json!({ "status": status })) }

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: SocialStore + 'static,
{
  Router::new()
    // Accounts and the follow graph
    .route("/accounts/me", get(accounts::me::<S>))
    .route("/accounts/users/{id}", get(accounts::get_user::<S>))
    .route("/accounts/profile", get(accounts::get_profile::<S>).put(accounts::update_profile::<S>))
    .route("/accounts/profile/{id}/share", get(accounts::profile_share_url::<S>))
    .route("/accounts/update-email", patch(accounts::update_email::<S>))
    .route("/accounts/follow/{id}", post(accounts::follow::<S>).delete(accounts::unfollow::<S>))
    .route("/accounts/friends", get(accounts::friends::<S>))
    .route("/accounts/friend-requests", get(accounts::friend_requests::<S>))
    .route("/accounts/friend-suggestions", get(accounts::friend_suggestions::<S>))
    .route("/accounts/search", get(accounts::search::<S>))
    // Posts and comments
    .route("/posts/posts", get(posts::list::<S>).post(posts::create::<S>))
    .route(
      "/posts/posts/{id}",
      get(posts::get_one::<S>).put(posts::update::<S>).delete(posts::delete::<S>),
    )
    .route("/posts/posts/{id}/like", post(posts::like::<S>))
    .route("/posts/posts/{id}/unlike", post(posts::unlike::<S>))
    .route("/posts/posts/{id}/share_url", get(posts::share_url::<S>))
    .route("/posts/comments", get(posts::list_comments::<S>).post(posts::create_comment::<S>))
    .route("/posts/comments/{id}", delete(posts::delete_comment::<S>))
    .route("/posts/comments/{id}/like", post(posts::like_comment::<S>))
    .route("/posts/comments/{id}/unlike", post(posts::unlike_comment::<S>))
    // Stories
    .route("/posts/stories", get(stories::list::<S>).post(stories::create::<S>))
    .route("/posts/stories/{id}", delete(stories::delete::<S>))
    .route("/posts/stories/{id}/like", post(stories::like::<S>))
    .route("/posts/stories/{id}/unlike", post(stories::unlike::<S>))
    .route("/posts/story-replies", get(stories::list_replies::<S>).post(stories::create_reply::<S>))
    .route("/posts/story-replies/{id}", delete(stories::delete_reply::<S>))
    // Messaging
    .route("/messages/conversations", get(messages::list_conversations::<S>))
    .route("/messages/start", post(messages::start::<S>))
    .route(
      "/messages/conversations/{id}/messages",
      get(messages::list_messages::<S>).post(messages::send::<S>),
    )
    // Events
    .route("/events/events", get(events::list::<S>).post(events::create::<S>))
    .route(
      "/events/events/{id}",
      get(events::get_one::<S>).put(events::update::<S>).delete(events::delete::<S>),
    )
    .route("/events/events/{id}/interested", post(events::interested::<S>))
    .route("/events/events/{id}/going", post(events::going::<S>))
    .route("/events/events/{id}/uninterested", post(events::uninterested::<S>))
    // Notifications
    .route("/notifications", get(notifications::list::<S>))
    .route("/notifications/mark-all-read", post(notifications::mark_all_read::<S>))
    .route("/notifications/{id}/mark-read", post(notifications::mark_read::<S>))
    .route("/notifications/push-tokens", post(notifications::register_push_token::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
