//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use quad_core::{store::AccountStore, user::NewUser};
use quad_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::{Actor, ApiState, PushGateway, api_router};

async fn make_state() -> ApiState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  ApiState::new(Arc::new(store), PushGateway::Disabled, "http://quad.test/")
}

async fn user(state: &ApiState<SqliteStore>, seat: &str, name: &str) -> i64 {
  state
    .store
    .register(NewUser {
      seat_number:      seat.into(),
      full_name:        name.into(),
      university_email: None,
      year:             None,
      department:       "Physics".into(),
      password_hash:    "hash".into(),
    })
    .await
    .unwrap()
    .id
}

async fn call(
  state: &ApiState<SqliteStore>,
  actor: Option<i64>,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(id) = actor {
    builder = builder.extension(Actor(id));
  }
  let req = match body {
    Some(body) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  let resp = api_router(state.clone()).oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, value)
}

// ── Authentication ──────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_actor_is_unauthorized() {
  let state = make_state().await;
  let (status, body) = call(&state, None, "GET", "/accounts/me", None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["detail"], "Authentication credentials were not provided.");
}

#[tokio::test]
async fn me_returns_the_actor() {
  let state = make_state().await;
  let ada = user(&state, "PH-1", "Ada").await;
  let (status, body) = call(&state, Some(ada), "GET", "/accounts/me", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["id"], ada);
  assert_eq!(body["seat_number"], "PH-1");
}

#[tokio::test]
async fn unknown_user_is_404() {
  let state = make_state().await;
  let ada = user(&state, "PH-1", "Ada").await;
  let (status, body) = call(&state, Some(ada), "GET", "/accounts/users/999", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["detail"], "User not found");
}

// ── Follow graph ────────────────────────────────────────────────────────────

#[tokio::test]
async fn follow_and_unfollow() {
  let state = make_state().await;
  let ada = user(&state, "PH-1", "Ada").await;
  let bob = user(&state, "PH-2", "Bob").await;

  let (status, body) =
    call(&state, Some(ada), "POST", &format!("/accounts/follow/{bob}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "status": "following" }));

  let (_, requests) = call(&state, Some(bob), "GET", "/accounts/friend-requests", None).await;
  assert_eq!(requests.as_array().unwrap().len(), 1);
  assert_eq!(requests[0]["id"], ada);

  let (_, notifications) = call(&state, Some(bob), "GET", "/notifications", None).await;
  assert_eq!(notifications.as_array().unwrap().len(), 1);
  assert_eq!(notifications[0]["type"], "follow");

  let (status, body) =
    call(&state, Some(ada), "DELETE", &format!("/accounts/follow/{bob}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "status": "unfollowed" }));
}

#[tokio::test]
async fn self_follow_is_bad_request() {
  let state = make_state().await;
  let ada = user(&state, "PH-1", "Ada").await;
  let (status, body) =
    call(&state, Some(ada), "POST", &format!("/accounts/follow/{ada}"), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["detail"], "Cannot follow yourself");
}

#[tokio::test]
async fn update_email_accepts_either_field() {
  let state = make_state().await;
  let ada = user(&state, "PH-1", "Ada").await;
  let (status, body) = call(
    &state,
    Some(ada),
    "PATCH",
    "/accounts/update-email",
    Some(json!({ "email": "ada@uni.example" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "status": "ok", "university_email": "ada@uni.example" }));

  let (status, _) = call(
    &state,
    Some(ada),
    "PATCH",
    "/accounts/update-email",
    Some(json!({ "university_email": "not-an-email" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn profile_share_url_uses_base() {
  let state = make_state().await;
  let ada = user(&state, "PH-1", "Ada").await;
  let (status, body) =
    call(&state, Some(ada), "GET", &format!("/accounts/profile/{ada}/share"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["share_url"], format!("http://quad.test/profile/{ada}"));
}

// ── Posts ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn post_lifecycle() {
  let state = make_state().await;
  let ada = user(&state, "PH-1", "Ada").await;
  let bob = user(&state, "PH-2", "Bob").await;

  let (status, post) =
    call(&state, Some(ada), "POST", "/posts/posts", Some(json!({ "content": "hello" }))).await;
  assert_eq!(status, StatusCode::CREATED);
  let id = post["id"].as_i64().unwrap();

  let (status, body) =
    call(&state, Some(ada), "GET", &format!("/posts/posts/{id}/share_url"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["share_url"], format!("http://quad.test/api/posts/posts/{id}/"));
  assert_eq!(body["post_id"], id);

  let (status, body) =
    call(&state, Some(bob), "POST", &format!("/posts/posts/{id}/like"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "status": "liked" }));

  let (_, view) = call(&state, Some(bob), "GET", &format!("/posts/posts/{id}"), None).await;
  assert_eq!(view["like_count"], 1);
  assert_eq!(view["is_liked"], true);
  assert_eq!(view["is_author"], false);

  let (status, body) =
    call(&state, Some(bob), "DELETE", &format!("/posts/posts/{id}"), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["detail"], "You do not have permission to delete this post.");

  let (status, _) = call(&state, Some(ada), "DELETE", &format!("/posts/posts/{id}"), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, body) = call(&state, Some(ada), "GET", &format!("/posts/posts/{id}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["detail"], "Post not found");
}

#[tokio::test]
async fn empty_post_is_rejected() {
  let state = make_state().await;
  let ada = user(&state, "PH-1", "Ada").await;
  let (status, _) =
    call(&state, Some(ada), "POST", "/posts/posts", Some(json!({ "content": "   " }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn comments_require_post_param() {
  let state = make_state().await;
  let ada = user(&state, "PH-1", "Ada").await;
  let (status, body) = call(&state, Some(ada), "GET", "/posts/comments", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["detail"], "post is required");
}

// ── Messaging ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn conversation_round_trip() {
  let state = make_state().await;
  let ada = user(&state, "PH-1", "Ada").await;
  let bob = user(&state, "PH-2", "Bob").await;
  let eve = user(&state, "PH-3", "Eve").await;

  let (status, body) =
    call(&state, Some(ada), "POST", "/messages/start", Some(json!({ "user_id": bob }))).await;
  assert_eq!(status, StatusCode::OK);
  let id = body["conversation_id"].as_i64().unwrap();

  let (_, again) =
    call(&state, Some(bob), "POST", "/messages/start", Some(json!({ "user_id": ada }))).await;
  assert_eq!(again["conversation_id"], id);

  let uri = format!("/messages/conversations/{id}/messages");
  let (status, message) =
    call(&state, Some(ada), "POST", &uri, Some(json!({ "text": "hi Bob" }))).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(message["is_read"], false);

  let (status, messages) = call(&state, Some(bob), "GET", &uri, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(messages.as_array().unwrap().len(), 1);
  assert_eq!(messages[0]["text"], "hi Bob");

  let (status, body) = call(&state, Some(eve), "GET", &uri, None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["detail"], "You are not a participant in this conversation.");
}

#[tokio::test]
async fn start_conversation_requires_user_id() {
  let state = make_state().await;
  let ada = user(&state, "PH-1", "Ada").await;
  let (status, body) = call(&state, Some(ada), "POST", "/messages/start", Some(json!({}))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["detail"], "user_id is required");

  let (status, _) =
    call(&state, Some(ada), "POST", "/messages/start", Some(json!({ "user_id": ada }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Events ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn event_rsvp_flow() {
  let state = make_state().await;
  let ada = user(&state, "PH-1", "Ada").await;
  let bob = user(&state, "PH-2", "Bob").await;

  let (status, event) = call(
    &state,
    Some(ada),
    "POST",
    "/events/events",
    Some(json!({
      "title": "Star party",
      "start_date": "2030-05-01T20:00:00Z",
      "end_date": "2030-05-01T23:00:00Z"
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let id = event["id"].as_i64().unwrap();

  let (_, body) =
    call(&state, Some(bob), "POST", &format!("/events/events/{id}/interested"), None).await;
  assert_eq!(body, json!({ "status": "interested" }));
  let (_, body) = call(&state, Some(bob), "POST", &format!("/events/events/{id}/going"), None).await;
  assert_eq!(body, json!({ "status": "going" }));

  let (_, view) = call(&state, Some(bob), "GET", &format!("/events/events/{id}"), None).await;
  assert_eq!(view["going_count"], 1);
  assert_eq!(view["interested_count"], 0);
  assert_eq!(view["is_going"], true);

  let (_, body) =
    call(&state, Some(bob), "POST", &format!("/events/events/{id}/uninterested"), None).await;
  assert_eq!(body, json!({ "status": "uninterested" }));

  let (status, _) = call(&state, Some(bob), "DELETE", &format!("/events/events/{id}"), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, body) = call(&state, Some(bob), "GET", "/events/events/999", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["detail"], "Event not found");
}

// ── Notifications ───────────────────────────────────────────────────────────

#[tokio::test]
async fn notifications_mark_read() {
  let state = make_state().await;
  let ada = user(&state, "PH-1", "Ada").await;
  let bob = user(&state, "PH-2", "Bob").await;
  call(&state, Some(ada), "POST", &format!("/accounts/follow/{bob}"), None).await;

  let (_, list) = call(&state, Some(bob), "GET", "/notifications", None).await;
  let id = list[0]["id"].as_i64().unwrap();
  assert_eq!(list[0]["is_read"], false);

  let (status, body) =
    call(&state, Some(ada), "POST", &format!("/notifications/{id}/mark-read"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["detail"], "Notification not found");

  let (status, body) =
    call(&state, Some(bob), "POST", &format!("/notifications/{id}/mark-read"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "status": "ok" }));

  let (_, list) = call(&state, Some(bob), "GET", "/notifications", None).await;
  assert_eq!(list[0]["is_read"], true);
}

#[tokio::test]
async fn push_token_registration_is_idempotent() {
  let state = make_state().await;
  let ada = user(&state, "PH-1", "Ada").await;
  for _ in 0..2 {
    let (status, body) = call(
      &state,
      Some(ada),
      "POST",
      "/notifications/push-tokens",
      Some(json!({ "token": "ExponentPushToken[abc]" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["token"], "ExponentPushToken[abc]");
  }
  let tokens = {
    use quad_core::store::NotificationStore;
    state.store.push_tokens(ada).await.unwrap()
  };
  assert_eq!(tokens, vec!["ExponentPushToken[abc]".to_string()]);
}
