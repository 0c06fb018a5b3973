//! HTTP server for Quad.
//!
//! Wraps the [`quad_api`] router with bearer-token authentication, the
//! public registration and login endpoints, and request tracing.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware, routing::post};
use quad_api::{ApiState, PushGateway};
use quad_core::store::SocialStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `QUAD_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  #[serde(default = "default_store_path")]
  pub store_path:       PathBuf,
  /// Prefix for share links, e.g. `https://quad.example.edu`.
  #[serde(default = "default_public_base_url")]
  pub public_base_url:  String,
  /// Webhook that fans notifications out to devices. Push is off when unset.
  #[serde(default)]
  pub push_gateway_url: Option<String>,
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 8000 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/quad/quad.db") }

fn default_public_base_url() -> String { "http://localhost:8000".into() }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             default_host(),
      port:             default_port(),
      store_path:       default_store_path(),
      public_base_url:  default_public_base_url(),
      push_gateway_url: None,
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the server's own handlers and middleware.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
  pub push:   PushGateway,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      config: Arc::clone(&self.config),
      push:   self.push.clone(),
    }
  }
}

impl<S> AppState<S> {
  pub fn new(store: S, config: ServerConfig) -> Self {
    let push = PushGateway::from_url(config.push_gateway_url.clone());
    Self { store: Arc::new(store), config: Arc::new(config), push }
  }

  fn api_state(&self) -> ApiState<S> {
    ApiState::new(Arc::clone(&self.store), self.push.clone(), &self.config.public_base_url)
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router, with everything mounted under `/api`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: SocialStore + 'static,
{
  let accounts = Router::new()
    .route("/accounts/register", post(auth::register::<S>))
    .route("/accounts/login", post(auth::login::<S>))
    .route("/accounts/change-password", post(auth::change_password::<S>))
    .with_state(state.clone());

  let api = accounts
    .merge(quad_api::api_router(state.api_state()))
    .layer(middleware::from_fn_with_state(state, auth::resolve_actor::<S>));

  Router::new()
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────
