//! HTTP server for the program document store.
//!
//! Wraps the [`pdms_api`] router with bearer-token authentication, the
//! public session routes, CORS, and request tracing.

pub mod auth;
pub mod error;
pub mod session;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware, routing::post};
use pdms_core::store::{AccountStore, DocumentStore};
use serde::Deserialize;
use tower_http::{
  cors::{AllowOrigin, Any, CorsLayer},
  trace::TraceLayer,
};

use auth::JwtManager;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `PDMS_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                      String,
  pub port:                      u16,
  pub store_path:                PathBuf,
  /// HS256 signing secret for session tokens.
  pub jwt_secret:                String,
  #[serde(default = "default_creator_ttl")]
  pub creator_token_ttl_hours:   i64,
  #[serde(default = "default_developer_ttl")]
  pub developer_token_ttl_hours: i64,
  /// Empty disables developer login.
  #[serde(default)]
  pub developer_email:           String,
  /// PHC string produced by `--hash-password`.
  #[serde(default)]
  pub developer_password_hash:   String,
  /// Empty allows any origin.
  #[serde(default)]
  pub allowed_origins:           Vec<String>,
}

fn default_creator_ttl() -> i64 { 24 * 7 }

fn default_developer_ttl() -> i64 { 24 }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the session handlers.
#[derive(Clone)]
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
  pub tokens: Arc<JwtManager>,
}

impl<S> AppState<S> {
  pub fn new(store: S, config: ServerConfig) -> Self {
    Self {
      store:  Arc::new(store),
      tokens: Arc::new(JwtManager::new(&config.jwt_secret)),
      config: Arc::new(config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: DocumentStore + AccountStore + Clone + 'static,
{
  let protected = pdms_api::api_router(state.store.clone())
    .merge(
      Router::new()
        .route("/accounts", post(session::create_account::<S>))
        .with_state(state.clone()),
    )
    .route_layer(middleware::from_fn_with_state(
      state.tokens.clone(),
      auth::require_bearer,
    ));

  Router::new()
    .route("/api/creator/register", post(session::register::<S>))
    .route("/api/creator/login", post(session::creator_login::<S>))
    .route("/api/admin/login", post(session::admin_login::<S>))
    .route("/api/dev/login", post(session::developer_login::<S>))
    .with_state(state.clone())
    .nest("/api", protected)
    .layer(TraceLayer::new_for_http())
    .layer(cors(&state.config))
}

fn cors(config: &ServerConfig) -> CorsLayer {
  let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
  if config.allowed_origins.is_empty() {
    return layer.allow_origin(Any);
  }
  let origins = config
    .allowed_origins
    .iter()
    .filter_map(|o| o.parse().ok())
    .collect::<Vec<_>>();
  layer.allow_origin(AllowOrigin::list(origins))
}

// ─── Integration tests ────────────────────────────────────────────────────────
