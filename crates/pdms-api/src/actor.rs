//! The authenticated caller, as seen by API handlers.
//!
//! The hosting server authenticates the request and inserts an [`Actor`]
//! into the request extensions; handlers take it as an extractor. A request
//! without one is rejected with 401.

use axum::{extract::FromRequestParts, http::request::Parts};
use pdms_core::account::{Action, Role};

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
  /// Account identifier, or the configured email for the developer.
  pub account_id: String,
  pub role:       Role,
}

impl Actor {
  pub fn require(&self, action: Action) -> Result<(), ApiError> {
    if self.role.permits(action) {
      Ok(())
    } else {
      Err(ApiError::Forbidden(format!(
        "{} accounts may not perform this action",
        self.role.as_str()
      )))
    }
  }
}

impl<S> FromRequestParts<S> for Actor
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<Actor>()
      .cloned()
      .ok_or_else(|| ApiError::Unauthorized("authentication required".into()))
  }
}
