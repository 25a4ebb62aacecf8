//! Handlers for `/accounts` administration endpoints.
//!
//! Developers manage every stored account; admins only creator accounts.
//! Account creation needs password hashing and lives in the server crate.

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
};
use pdms_core::{
  account::{Account, AccountUpdate, Action, Role},
  store::AccountStore,
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{actor::Actor, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub role: Option<Role>,
}

/// `GET /accounts[?role=creator]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  actor: Actor,
  query: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: AccountStore,
{
  actor.require(Action::ManageCreators)?;
  let Query(params) = query?;
  let role = match params.role {
    Some(role) => {
      actor.require(role.management_action())?;
      Some(role)
    }
    None if actor.role.permits(Action::ManageAdmins) => None,
    None => Some(Role::Creator),
  };

  let accounts = store.list_accounts(role).await.map_err(ApiError::store)?;
  Ok(Json(json!({ "success": true, "count": accounts.len(), "accounts": accounts })))
}

/// Load `id` and check the caller may manage it.
async fn managed<S>(store: &S, actor: &Actor, id: Uuid) -> Result<Account, ApiError>
where
  S: AccountStore,
{
  let account = store
    .get_account(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;
  actor.require(account.role.management_action())?;
  Ok(account)
}

/// `PUT /accounts/{id}` — body: [`AccountUpdate`].
pub async fn update<S>(
  State(store): State<Arc<S>>,
  actor: Actor,
  path: Result<Path<Uuid>, PathRejection>,
  body: Result<Json<AccountUpdate>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: AccountStore,
{
  let Path(id) = path?;
  let Json(mut update) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  managed(store.as_ref(), &actor, id).await?;

  update.blocked_by = Some(actor.account_id.clone());
  let account = store
    .update_account(id, update)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

  tracing::info!(
    account_id = %id,
    status = account.status.as_str(),
    blocked = account.blocked,
    by = %actor.account_id,
    "updated account"
  );
  Ok(Json(json!({ "success": true, "message": "Account updated", "account": account })))
}

/// `DELETE /accounts/{id}`
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  actor: Actor,
  path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: AccountStore,
{
  let Path(id) = path?;
  managed(store.as_ref(), &actor, id).await?;
  if !store.delete_account(id).await.map_err(ApiError::store)? {
    return Err(ApiError::NotFound("Account not found".into()));
  }
  tracing::info!(account_id = %id, by = %actor.account_id, "deleted account");
  Ok(Json(json!({ "success": true, "message": "Account deleted" })))
}
