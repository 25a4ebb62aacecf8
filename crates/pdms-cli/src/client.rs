//! Async HTTP client wrapping the program document JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use pdms_core::{
  account::Role,
  document::{DashboardStats, DocumentListing, ResolvedDocument, VersionSummary},
};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::session::Session;

/// Async HTTP client for the program document API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client:  Client,
  session: Session,
}

impl ApiClient {
  pub fn new(session: Session) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, session })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.session.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    match &self.session.token {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  /// Decode a `{ "success": .., ... }` envelope, turning failures into errors
  /// carrying the server's message.
  async fn envelope(resp: Response, what: &str) -> Result<Value> {
    let status = resp.status();
    let body: Value = resp
      .json()
      .await
      .with_context(|| format!("{what}: response is not JSON ({status})"))?;
    if !status.is_success() || body["success"] != json!(true) {
      let message = body["message"].as_str().unwrap_or("request failed");
      return Err(anyhow!("{what} → {status}: {message}"));
    }
    Ok(body)
  }

  fn field<T: DeserializeOwned>(body: &mut Value, key: &str) -> Result<T> {
    serde_json::from_value(body[key].take()).with_context(|| format!("deserialising {key}"))
  }

  async fn get(&self, path: &str) -> Result<Value> {
    tracing::debug!(path, "GET");
    let resp = self
      .auth(self.client.get(self.url(path)))
      .send()
      .await
      .with_context(|| format!("GET {path} failed"))?;
    Self::envelope(resp, &format!("GET {path}")).await
  }

  // ── Session ───────────────────────────────────────────────────────────────

  /// Log in and return the resulting session. The client's own token is not
  /// sent.
  pub async fn login(&self, role: Role, email: &str, password: &str) -> Result<Session> {
    let path = match role {
      Role::Creator => "/creator/login",
      Role::Admin => "/admin/login",
      Role::Developer => "/dev/login",
    };
    let resp = self
      .client
      .post(self.url(path))
      .json(&json!({ "email": email, "password": password }))
      .send()
      .await
      .with_context(|| format!("POST {path} failed"))?;
    let mut body = Self::envelope(resp, &format!("POST {path}")).await?;

    Ok(Session {
      base_url: self.session.base_url.clone(),
      token:    Some(Self::field(&mut body, "token")?),
      role:     Some(role),
    })
  }

  // ── Documents ─────────────────────────────────────────────────────────────

  /// `POST /api/pd/save` — returns the full response envelope.
  pub async fn save(&self, payload: &Value) -> Result<Value> {
    let resp = self
      .auth(self.client.post(self.url("/pd/save")))
      .json(payload)
      .send()
      .await
      .context("POST /pd/save failed")?;
    Self::envelope(resp, "POST /pd/save").await
  }

  /// `GET /api/pd/versions/{code}?limit=N`
  pub async fn versions(&self, code: &str, limit: usize) -> Result<Vec<VersionSummary>> {
    let mut body = self.get(&format!("/pd/versions/{code}?limit={limit}")).await?;
    Self::field(&mut body, "versions")
  }

  /// `GET /api/pd/latest/{code}`
  pub async fn latest(&self, code: &str) -> Result<ResolvedDocument> {
    let mut body = self.get(&format!("/pd/latest/{code}")).await?;
    Self::field(&mut body, "masterRecord")
  }

  /// `GET /api/pd/fetch/{id}`
  pub async fn fetch(&self, id: Uuid) -> Result<ResolvedDocument> {
    let mut body = self.get(&format!("/pd/fetch/{id}")).await?;
    Self::field(&mut body, "masterRecord")
  }

  /// `GET /api/pd/history`
  pub async fn history(&self) -> Result<Vec<DocumentListing>> {
    let mut body = self.get("/pd/history").await?;
    Self::field(&mut body, "pds")
  }

  /// `GET /api/dashboard-stats`
  pub async fn stats(&self) -> Result<DashboardStats> {
    let mut body = self.get("/dashboard-stats").await?;
    Ok(DashboardStats {
      stats:       Self::field(&mut body, "stats")?,
      recent_docs: Self::field(&mut body, "recentDocs")?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn url_joins_base_and_api_prefix() {
    let client = ApiClient::new(Session::anonymous("http://pd.example.edu/")).unwrap();
    assert_eq!(client.url("/pd/history"), "http://pd.example.edu/api/pd/history");
  }

  #[test]
  fn field_extracts_typed_values() {
    let mut body = json!({ "success": true, "token": "t0k", "versions": [] });
    let token: String = ApiClient::field(&mut body, "token").unwrap();
    assert_eq!(token, "t0k");
    let versions: Vec<VersionSummary> = ApiClient::field(&mut body, "versions").unwrap();
    assert!(versions.is_empty());
    assert!(ApiClient::field::<String>(&mut body, "missing").is_err());
  }
}
