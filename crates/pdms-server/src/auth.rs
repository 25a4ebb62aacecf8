//! Password hashing, bearer tokens, and the middleware that turns a token
//! into an [`Actor`].

use std::sync::Arc;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::{Request, State},
  http::header,
  middleware::Next,
  response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
  errors::ErrorKind,
};
use pdms_api::{Actor, ApiError};
use pdms_core::account::Role;
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| Error::Hash(e.to_string()))
}

/// Check `password` against a PHC string. A malformed hash never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(hash) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  /// Account id, or the developer email.
  pub sub:  String,
  pub role: Role,
  pub iat:  i64,
  pub exp:  i64,
}

/// Issues and validates HS256 session tokens. Validation is stateless.
pub struct JwtManager {
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  validation: Validation,
}

impl JwtManager {
  pub fn new(secret: &str) -> Self {
    Self {
      encoding:   EncodingKey::from_secret(secret.as_bytes()),
      decoding:   DecodingKey::from_secret(secret.as_bytes()),
      validation: Validation::new(Algorithm::HS256),
    }
  }

  pub fn issue(&self, sub: &str, role: Role, ttl: Duration) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
      sub: sub.to_owned(),
      role,
      iat: now.timestamp(),
      exp: (now + ttl).timestamp(),
    };
    encode(&Header::default(), &claims, &self.encoding).map_err(Error::Encode)
  }

  pub fn verify(&self, token: &str) -> Result<Claims> {
    decode::<Claims>(token, &self.decoding, &self.validation)
      .map(|data| data.claims)
      .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => Error::TokenExpired,
        _ => Error::InvalidToken,
      })
  }
}

// ─── Middleware ──────────────────────────────────────────────────────────────

/// Reject requests without a valid `Authorization: Bearer` token; otherwise
/// attach the caller as an [`Actor`] extension.
pub async fn require_bearer(
  State(tokens): State<Arc<JwtManager>>,
  mut req: Request,
  next: Next,
) -> Result<Response, ApiError> {
  let token = req
    .headers()
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .ok_or(Error::InvalidToken)?;
  let claims = tokens.verify(token.trim())?;

  req
    .extensions_mut()
    .insert(Actor { account_id: claims.sub, role: claims.role });
  Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn password_hash_roundtrip() {
    let hash = hash_password("hunter2").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("hunter2", &hash));
    assert!(!verify_password("hunter3", &hash));
  }

  #[test]
  fn malformed_hash_never_matches() {
    assert!(!verify_password("anything", "not-a-phc-string"));
  }

  #[test]
  fn token_roundtrip_keeps_subject_and_role() {
    let jwt = JwtManager::new("test-secret");
    let token = jwt.issue("creator-1", Role::Creator, Duration::hours(1)).unwrap();
    let claims = jwt.verify(&token).unwrap();
    assert_eq!(claims.sub, "creator-1");
    assert_eq!(claims.role, Role::Creator);
    assert!(claims.exp > claims.iat);
  }

  #[test]
  fn expired_token_is_rejected() {
    let jwt = JwtManager::new("test-secret");
    let token = jwt.issue("creator-1", Role::Creator, Duration::hours(-2)).unwrap();
    assert!(matches!(jwt.verify(&token), Err(Error::TokenExpired)));
  }

  #[test]
  fn token_from_other_secret_is_rejected() {
    let issuer = JwtManager::new("secret-a");
    let verifier = JwtManager::new("secret-b");
    let token = issuer.issue("dev@example.edu", Role::Developer, Duration::hours(1)).unwrap();
    assert!(matches!(verifier.verify(&token), Err(Error::InvalidToken)));
    assert!(matches!(verifier.verify("garbage"), Err(Error::InvalidToken)));
  }
}
