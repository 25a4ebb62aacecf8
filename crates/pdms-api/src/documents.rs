//! Handlers for program document endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/pd/save` | Body: [`SaveRequest`]; creators only |
//! | `GET`  | `/pd/versions/{code}` | `?limit` (default 5); summaries only |
//! | `GET`  | `/pd/latest/{code}` | Newest master, sections resolved |
//! | `GET`  | `/pd/fetch/{id}` | One master by id, sections resolved |
//! | `GET`  | `/pd/sections/{kind}/{code}` | Every stored version of one section |
//! | `GET`  | `/pd/history` | The caller's own masters; creators only |
//! | `GET`  | `/dashboard-stats` | The caller's counts by status; creators only |

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use pdms_core::{
  account::Action,
  document::{DocumentMetadata, NewDocument, SectionPayloads, SectionSelection},
  section::{
    ElectivesContent, InfoContent, ObjectivesContent, Section, SectionKind,
    StructureContent,
  },
  store::DocumentStore,
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{actor::Actor, error::ApiError};

const DEFAULT_RECENT: usize = 5;

// ─── Save ─────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /pd/save`.
///
/// Section payloads are accepted under their names (`info`, ...) or the
/// positional keys editors send (`section1Data`, ...).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
  #[serde(alias = "programId")]
  pub program_code:       String,
  #[serde(alias = "metaData")]
  pub metadata:           DocumentMetadata,
  #[serde(default, alias = "section1Data")]
  pub info:               Option<InfoContent>,
  #[serde(default, alias = "section2Data")]
  pub objectives:         Option<ObjectivesContent>,
  #[serde(default, alias = "section3Data")]
  pub structure:          Option<StructureContent>,
  #[serde(default, alias = "section4Data")]
  pub electives:          Option<ElectivesContent>,
  #[serde(default)]
  pub is_new_program:     bool,
  /// Absent means every section is rewritten.
  #[serde(default)]
  pub sections_to_update: SectionSelection,
}

impl SaveRequest {
  fn into_new_document(self, created_by: String) -> NewDocument {
    NewDocument {
      program_code: self.program_code.trim().to_owned(),
      metadata: self.metadata,
      sections: SectionPayloads {
        info:       self.info,
        objectives: self.objectives,
        structure:  self.structure,
        electives:  self.electives,
      },
      created_by,
      is_new_program: self.is_new_program,
      selection: self.sections_to_update,
    }
  }
}

/// `POST /pd/save` — returns 201 with the new master record and version.
pub async fn save<S>(
  State(store): State<Arc<S>>,
  actor: Actor,
  body: Result<Json<SaveRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore,
{
  actor.require(Action::AuthorDocuments)?;
  let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

  let input = body.into_new_document(actor.account_id);
  let is_new = input.is_new_program;
  let program_code = input.program_code.clone();

  let saved = store.save_document(input).await.map_err(ApiError::store)?;

  tracing::info!(
    program_code = %program_code,
    is_new_program = is_new,
    version = %saved.version,
    written = ?saved.written,
    "saved program document"
  );

  let message = if is_new {
    "Program Created Successfully".to_owned()
  } else {
    format!("Program Updated to v{}", saved.version)
  };

  Ok((
    StatusCode::CREATED,
    Json(json!({
      "success":         true,
      "message":         message,
      "masterRecord":    saved.master,
      "version":         saved.version,
      "sectionsWritten": saved.written,
    })),
  ))
}

// ─── Reads ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VersionsParams {
  pub limit: Option<usize>,
}

/// `GET /pd/versions/{code}[?limit=N]`
pub async fn versions<S>(
  State(store): State<Arc<S>>,
  actor: Actor,
  path: Result<Path<String>, PathRejection>,
  query: Result<Query<VersionsParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: DocumentStore,
{
  actor.require(Action::ReadDocuments)?;
  let Path(code) = path?;
  let Query(params) = query?;
  let limit = params.limit.unwrap_or(DEFAULT_RECENT);
  let versions = store
    .recent_versions(&code, limit)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "success": true, "versions": versions })))
}

/// `GET /pd/latest/{code}`
pub async fn latest<S>(
  State(store): State<Arc<S>>,
  actor: Actor,
  path: Result<Path<String>, PathRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: DocumentStore,
{
  actor.require(Action::ReadDocuments)?;
  let Path(code) = path?;
  let doc = store
    .latest_document(&code)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("No history found".into()))?;
  Ok(Json(json!({ "success": true, "masterRecord": doc })))
}

/// `GET /pd/fetch/{id}`
pub async fn fetch<S>(
  State(store): State<Arc<S>>,
  actor: Actor,
  path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: DocumentStore,
{
  actor.require(Action::ReadDocuments)?;
  let Path(id) = path?;
  let doc = store
    .get_document(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("Document not found".into()))?;
  Ok(Json(json!({ "success": true, "masterRecord": doc })))
}

/// `GET /pd/sections/{kind}/{code}`
pub async fn sections<S>(
  State(store): State<Arc<S>>,
  actor: Actor,
  path: Result<Path<(String, String)>, PathRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: DocumentStore,
{
  actor.require(Action::ReadDocuments)?;
  let Path((kind, code)) = path?;
  let kind = SectionKind::parse(&kind).map_err(|e| ApiError::BadRequest(e.to_string()))?;
  let history = match kind {
    SectionKind::Info => section_history::<S, InfoContent>(&store, &code).await?,
    SectionKind::Objectives => {
      section_history::<S, ObjectivesContent>(&store, &code).await?
    }
    SectionKind::Structure => {
      section_history::<S, StructureContent>(&store, &code).await?
    }
    SectionKind::Electives => {
      section_history::<S, ElectivesContent>(&store, &code).await?
    }
  };
  Ok(Json(json!({
    "success":  true,
    "section":  kind,
    "count":    history.len(),
    "versions": history,
  })))
}

async fn section_history<S, C>(store: &S, code: &str) -> Result<Vec<Value>, ApiError>
where
  S: DocumentStore,
  C: Section,
{
  let records = store
    .section_history::<C>(code)
    .await
    .map_err(ApiError::store)?;
  records
    .into_iter()
    .map(|r| serde_json::to_value(r).map_err(|e| ApiError::Store(Box::new(e))))
    .collect()
}

// ─── Per-author ───────────────────────────────────────────────────────────────

/// `GET /pd/history`
pub async fn history<S>(
  State(store): State<Arc<S>>,
  actor: Actor,
) -> Result<Json<Value>, ApiError>
where
  S: DocumentStore,
{
  actor.require(Action::AuthorDocuments)?;
  let pds = store
    .creator_history(&actor.account_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "success": true, "count": pds.len(), "pds": pds })))
}

/// `GET /dashboard-stats`
pub async fn dashboard_stats<S>(
  State(store): State<Arc<S>>,
  actor: Actor,
) -> Result<Json<Value>, ApiError>
where
  S: DocumentStore,
{
  actor.require(Action::AuthorDocuments)?;
  let dash = store
    .creator_stats(&actor.account_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({
    "success":    true,
    "stats":      dash.stats,
    "recentDocs": dash.recent_docs,
  })))
}
