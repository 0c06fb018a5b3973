//! Password hashing, bearer tokens and the account endpoints that deal with
//! credentials.
//!
//! Tokens are 32 random bytes, hex-encoded, handed to the client once at
//! login. Only their SHA-256 digest is stored, so a leaked database does not
//! leak usable sessions.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  Json,
  extract::{Request, State},
  http::{HeaderMap, StatusCode, header},
  middleware::Next,
  response::{IntoResponse, Response},
};
use quad_api::{Actor, ApiError};
use quad_core::{error::require_text, store::SocialStore, user::NewUser};
use rand_core::{OsRng, RngCore};
use serde::Deserialize;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use crate::{AppState, error::Error};

/// Minimum length accepted by `change-password`.
pub const MIN_PASSWORD_LEN: usize = 8;

// ─── Primitives ──────────────────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map_err(|e| Error::PasswordHash(e.to_string()))?
    .to_string();
  Ok(hash)
}

/// Check `password` against a stored PHC string. Malformed hashes never match.
pub fn verify_password(password: &str, phc: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(phc) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

/// A fresh opaque bearer token.
pub fn issue_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

/// The form in which a token is persisted.
pub fn token_digest(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

// ─── Middleware ──────────────────────────────────────────────────────────────

/// Resolve `Authorization: Bearer <token>` into an [`Actor`] extension.
///
/// Requests without a valid token pass through untouched; handlers that take
/// an `Actor` reject them with 401.
pub async fn resolve_actor<S: SocialStore + 'static>(
  State(state): State<AppState<S>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error> {
  if let Some(digest) = bearer_token(req.headers()).map(token_digest) {
    match state.store.session_user(digest).await.map_err(ApiError::store)? {
      Some(user_id) => {
        req.extensions_mut().insert(Actor(user_id));
      }
      None => tracing::debug!("unknown bearer token"),
    }
  }
  Ok(next.run(req).await)
}

// ─── Handlers ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  #[serde(default)]
  pub seat_number:      String,
  #[serde(default)]
  pub full_name:        String,
  #[serde(default)]
  pub password:         String,
  pub university_email: Option<String>,
  pub year:             Option<u32>,
  #[serde(default)]
  pub department:       String,
}

/// `POST /accounts/register`
pub async fn register<S: SocialStore + 'static>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, Error> {
  require_text("password", &body.password)?;
  let user = state
    .store
    .register(NewUser {
      seat_number:      body.seat_number,
      full_name:        body.full_name,
      university_email: body.university_email,
      year:             body.year,
      department:       body.department,
      password_hash:    hash_password(&body.password)?,
    })
    .await
    .map_err(ApiError::store)?;
  tracing::info!(user_id = user.id, seat_number = %user.seat_number, "registered user");

  let view = state
    .store
    .get_user(user.id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
  Ok((StatusCode::CREATED, Json(view)))
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  #[serde(default)]
  pub seat_number: String,
  #[serde(default)]
  pub password:    String,
}

/// `POST /accounts/login`: `{"token": ..., "user": UserView}`
pub async fn login<S: SocialStore + 'static>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<Value>, Error> {
  let invalid = || ApiError::BadRequest("Invalid seat number or password".into());

  let credentials = state
    .store
    .credentials_by_seat(body.seat_number.trim().to_owned())
    .await
    .map_err(ApiError::store)?
    .ok_or_else(invalid)?;
  if !verify_password(&body.password, &credentials.password_hash) {
    tracing::debug!(user_id = credentials.user_id, "login with wrong password");
    return Err(invalid().into());
  }

  let token = issue_token();
  state
    .store
    .create_session(credentials.user_id, token_digest(&token))
    .await
    .map_err(ApiError::store)?;
  let user = state
    .store
    .get_user(credentials.user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(invalid)?;
  Ok(Json(json!({ "token": token, "user": user })))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordBody {
  #[serde(default)]
  pub old_password:         String,
  #[serde(default)]
  pub new_password:         String,
  #[serde(default)]
  pub confirm_new_password: String,
}

/// `POST /accounts/change-password`
pub async fn change_password<S: SocialStore + 'static>(
  State(state): State<AppState<S>>,
  Actor(actor): Actor,
  Json(body): Json<ChangePasswordBody>,
) -> Result<Json<Value>, Error> {
  let bad = |msg: &str| Error::Api(ApiError::BadRequest(msg.to_owned()));

  if body.old_password.is_empty() || body.new_password.is_empty() {
    return Err(bad("Both old_password and new_password are required"));
  }
  let credentials = state
    .store
    .credentials_by_id(actor)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
  if !verify_password(&body.old_password, &credentials.password_hash) {
    return Err(bad("Invalid old password"));
  }
  if body.new_password.chars().count() < MIN_PASSWORD_LEN {
    return Err(bad("New password must be at least 8 characters long"));
  }
  if !body.confirm_new_password.is_empty() && body.confirm_new_password != body.new_password {
    return Err(bad("New passwords do not match"));
  }

  let hash = hash_password(&body.new_password)?;
  state
    .store
    .set_password_hash(actor, hash)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(user_id = actor, "password changed");
  Ok(Json(json!({ "status": "ok" })))
}
