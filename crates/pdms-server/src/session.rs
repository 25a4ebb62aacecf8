//! Registration, login, and account creation.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/creator/register` | Creates an inactive creator |
//! | `POST` | `/api/creator/login` | Creator token |
//! | `POST` | `/api/admin/login` | Admin token |
//! | `POST` | `/api/dev/login` | Developer token; credentials from config |
//! | `POST` | `/api/accounts` | Behind the bearer middleware |

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Duration;
use pdms_api::{Actor, ApiError};
use pdms_core::{
  account::{AccountProfile, AccountStatus, NewAccount, Role, normalize_email},
  store::AccountStore,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
  AppState,
  auth::{hash_password, verify_password},
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

fn body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
  body
    .map(|Json(b)| b)
    .map_err(|e| ApiError::BadRequest(e.body_text()))
}

fn require_fields(fields: &[&str]) -> Result<(), ApiError> {
  if fields.iter().any(|f| f.trim().is_empty()) {
    return Err(ApiError::BadRequest(
      "Email, password and name are required".into(),
    ));
  }
  Ok(())
}

// ─── Registration ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
  pub email:    String,
  pub password: String,
  pub name:     String,
  #[serde(flatten)]
  pub profile:  AccountProfile,
}

/// `POST /api/creator/register` — the account stays inactive until an
/// administrator activates it.
pub async fn register<S>(
  State(state): State<AppState<S>>,
  req: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AccountStore,
{
  let req = body(req)?;
  require_fields(&[&req.email, &req.password, &req.name])?;

  let account = state
    .store
    .create_account(NewAccount {
      email:         req.email,
      password_hash: hash_password(&req.password)?,
      name:          req.name.trim().to_owned(),
      role:          Role::Creator,
      status:        AccountStatus::Inactive,
      profile:       req.profile,
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(account_id = %account.account_id, "creator registered");
  Ok((
    StatusCode::CREATED,
    Json(json!({
      "success": true,
      "message": "Registration submitted. Await admin approval.",
    })),
  ))
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
  pub email:    String,
  pub password: String,
}

pub async fn creator_login<S>(
  State(state): State<AppState<S>>,
  req: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AccountStore,
{
  login(&state, body(req)?, Role::Creator).await
}

pub async fn admin_login<S>(
  State(state): State<AppState<S>>,
  req: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AccountStore,
{
  login(&state, body(req)?, Role::Admin).await
}

async fn login<S>(
  state: &AppState<S>,
  req: LoginRequest,
  role: Role,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: AccountStore,
{
  if req.email.trim().is_empty() || req.password.is_empty() {
    return Err(ApiError::BadRequest("Email and password are required".into()));
  }

  let creds = state
    .store
    .find_credentials(&req.email)
    .await
    .map_err(ApiError::store)?
    .filter(|c| c.account.role == role)
    .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.into()))?;
  let account = creds.account;

  if account.blocked {
    return Err(ApiError::Forbidden("Account blocked.".into()));
  }
  if account.status != AccountStatus::Active {
    return Err(ApiError::Forbidden("Account pending approval".into()));
  }
  if !verify_password(&req.password, &creds.password_hash) {
    tracing::warn!(account_id = %account.account_id, "failed login");
    return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.into()));
  }

  let token = state.tokens.issue(
    &account.account_id.to_string(),
    role,
    Duration::hours(state.config.creator_token_ttl_hours),
  )?;

  tracing::info!(account_id = %account.account_id, role = role.as_str(), "logged in");
  Ok(Json(json!({
    "success": true,
    "token":   token,
    "account": {
      "id":    account.account_id,
      "email": account.email,
      "name":  account.name,
      "role":  account.role,
    },
  })))
}

/// `POST /api/dev/login` — the developer is not a stored account.
pub async fn developer_login<S>(
  State(state): State<AppState<S>>,
  req: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AccountStore,
{
  let req = body(req)?;
  let config = &state.config;

  let email = normalize_email(&req.email);
  let valid = !config.developer_email.is_empty()
    && email == normalize_email(&config.developer_email)
    && verify_password(&req.password, &config.developer_password_hash);
  if !valid {
    tracing::warn!("failed developer login");
    return Err(ApiError::Unauthorized(
      "Invalid System ID or Access Cipher".into(),
    ));
  }

  let token = state.tokens.issue(
    &email,
    Role::Developer,
    Duration::hours(config.developer_token_ttl_hours),
  )?;
  Ok(Json(json!({
    "success": true,
    "message": "Terminal Access Granted",
    "token":   token,
  })))
}

// ─── Account creation ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
  pub email:    String,
  pub password: String,
  pub name:     String,
  #[serde(default = "default_role")]
  pub role:     Role,
  /// Accounts created by an administrator are active unless stated.
  #[serde(default)]
  pub status:   Option<AccountStatus>,
  #[serde(flatten)]
  pub profile:  AccountProfile,
}

fn default_role() -> Role { Role::Creator }

/// `POST /api/accounts`
pub async fn create_account<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  req: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AccountStore,
{
  let req = body(req)?;
  if req.role == Role::Developer {
    return Err(ApiError::BadRequest(
      "developer accounts are configured, not stored".into(),
    ));
  }
  actor.require(req.role.management_action())?;
  require_fields(&[&req.email, &req.password, &req.name])?;

  let account = state
    .store
    .create_account(NewAccount {
      email:         req.email,
      password_hash: hash_password(&req.password)?,
      name:          req.name.trim().to_owned(),
      role:          req.role,
      status:        req.status.unwrap_or(AccountStatus::Active),
      profile:       req.profile,
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    account_id = %account.account_id,
    role = account.role.as_str(),
    by = %actor.account_id,
    "created account"
  );
  Ok((
    StatusCode::CREATED,
    Json(json!({ "success": true, "message": "Account created", "account": account })),
  ))
}
