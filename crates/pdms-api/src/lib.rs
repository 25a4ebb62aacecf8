//! JSON REST API for the program document store.
//!
//! Exposes an axum [`Router`] backed by any store implementing
//! [`DocumentStore`] and [`AccountStore`]. Authentication is the caller's
//! responsibility: the hosting server must insert an [`Actor`] into each
//! request's extensions.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", pdms_api::api_router(store.clone()))
//! ```

pub mod accounts;
pub mod actor;
pub mod documents;
pub mod error;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use pdms_core::store::{AccountStore, DocumentStore};

pub use actor::Actor;
pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: DocumentStore + AccountStore + 'static,
{
  Router::new()
    // Program documents
    .route("/pd/save", post(documents::save::<S>))
    .route("/pd/versions/{code}", get(documents::versions::<S>))
    .route("/pd/latest/{code}", get(documents::latest::<S>))
    .route("/pd/fetch/{id}", get(documents::fetch::<S>))
    .route("/pd/sections/{kind}/{code}", get(documents::sections::<S>))
    .route("/pd/history", get(documents::history::<S>))
    .route("/dashboard-stats", get(documents::dashboard_stats::<S>))
    // Accounts
    .route("/accounts", get(accounts::list::<S>))
    .route("/accounts/{id}", put(accounts::update::<S>).delete(accounts::delete::<S>))
    .with_state(store)
}
