//! Master records: the versioned container that links one stored version of
//! each of the four sections.
//!
//! A program's history is the set of master records sharing a
//! `program_code`. The current version is the one created most recently.
//! Master records are written once per save and never modified.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  section::{
    ElectivesContent, InfoContent, ObjectivesContent, SectionKind, SectionRecord,
    StructureContent,
  },
};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Review status carried by a master record. Any value may be set by the
/// author; no transition rules are enforced.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize,
)]
pub enum DocumentStatus {
  #[default]
  Draft,
  UnderReview,
  Approved,
  Archived,
}

impl DocumentStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Draft => "Draft",
      Self::UnderReview => "UnderReview",
      Self::Approved => "Approved",
      Self::Archived => "Archived",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "Draft" => Some(Self::Draft),
      "UnderReview" => Some(Self::UnderReview),
      "Approved" => Some(Self::Approved),
      "Archived" => Some(Self::Archived),
      _ => None,
    }
  }
}

// ─── Save input ──────────────────────────────────────────────────────────────

/// Document-level metadata supplied with a save.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
  pub scheme_year:  String,
  /// Accepted for compatibility with editors that echo the loaded version;
  /// never used to pick the stored version.
  #[serde(default)]
  pub version_no:   Option<String>,
  #[serde(default)]
  pub effective_ay: Option<String>,
  #[serde(default)]
  pub status:       Option<DocumentStatus>,
}

/// Which sections a save rewrites. Sections not selected reuse the rows
/// linked from the previous master record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SectionSelection {
  #[default]
  All,
  Only(Vec<SectionKind>),
}

impl SectionSelection {
  pub fn includes(&self, kind: SectionKind) -> bool {
    match self {
      Self::All => true,
      Self::Only(kinds) => kinds.contains(&kind),
    }
  }

  /// Build a selection from editor tokens (`"all"`, `"section2"`, `"info"`).
  /// An empty list or any `"all"` token selects every section.
  pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
    if tokens.is_empty()
      || tokens.iter().any(|t| t.as_ref().trim().eq_ignore_ascii_case("all"))
    {
      return Ok(Self::All);
    }
    let mut kinds = Vec::with_capacity(tokens.len());
    for token in tokens {
      let kind = SectionKind::parse(token.as_ref())?;
      if !kinds.contains(&kind) {
        kinds.push(kind);
      }
    }
    Ok(Self::Only(kinds))
  }
}

impl<'de> Deserialize<'de> for SectionSelection {
  fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    let tokens = Vec::<String>::deserialize(d)?;
    Self::from_tokens(&tokens).map_err(serde::de::Error::custom)
  }
}

/// Section payloads supplied with a save. A payload is only required for
/// sections the save actually writes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionPayloads {
  pub info:       Option<InfoContent>,
  pub objectives: Option<ObjectivesContent>,
  pub structure:  Option<StructureContent>,
  pub electives:  Option<ElectivesContent>,
}

impl SectionPayloads {
  /// Convenience constructor for a save that supplies all four sections.
  pub fn complete(
    info: InfoContent,
    objectives: ObjectivesContent,
    structure: StructureContent,
    electives: ElectivesContent,
  ) -> Self {
    Self {
      info:       Some(info),
      objectives: Some(objectives),
      structure:  Some(structure),
      electives:  Some(electives),
    }
  }
}

/// Input to [`crate::store::DocumentStore::save_document`].
#[derive(Debug, Clone)]
pub struct NewDocument {
  pub program_code:   String,
  pub metadata:       DocumentMetadata,
  pub sections:       SectionPayloads,
  /// Identifier of the acting account; stamped on every row written.
  pub created_by:     String,
  pub is_new_program: bool,
  pub selection:      SectionSelection,
}

impl NewDocument {
  /// Check the document-level fields. Section payloads are checked when the
  /// snapshot is planned, since which ones are needed depends on history.
  pub fn validate(&self) -> Result<()> {
    if self.program_code.trim().is_empty() {
      return Err(Error::Validation("programCode is required".into()));
    }
    if self.metadata.scheme_year.trim().is_empty() {
      return Err(Error::Validation("schemeYear is required".into()));
    }
    if self.created_by.trim().is_empty() {
      return Err(Error::Validation("acting user is required".into()));
    }
    Ok(())
  }
}

// ─── Stored master record ────────────────────────────────────────────────────

/// Identifiers of the four section rows linked from one master record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRefs {
  pub info:       Uuid,
  pub objectives: Uuid,
  pub structure:  Uuid,
  pub electives:  Uuid,
}

impl SectionRefs {
  pub fn get(&self, kind: SectionKind) -> Uuid {
    match kind {
      SectionKind::Info => self.info,
      SectionKind::Objectives => self.objectives,
      SectionKind::Structure => self.structure,
      SectionKind::Electives => self.electives,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterRecord {
  pub document_id:             Uuid,
  pub program_code:            String,
  pub scheme_year:             String,
  pub pd_version:              String,
  pub effective_academic_year: Option<String>,
  pub sections:                SectionRefs,
  pub status:                  DocumentStatus,
  pub created_by:              String,
  pub approved_by:             Option<String>,
  pub approval_date:           Option<DateTime<Utc>>,
  /// Server-assigned; defines which record is "latest".
  pub created_at:              DateTime<Utc>,
}

/// Result of a successful save.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedDocument {
  pub master:  MasterRecord,
  pub version: String,
  /// Sections that received new rows; the rest were reused.
  pub written: Vec<SectionKind>,
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// Summary projection returned by the recent-versions listing. Carries no
/// section content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
  pub document_id:             Uuid,
  pub pd_version:              String,
  pub created_at:              DateTime<Utc>,
  pub status:                  DocumentStatus,
  pub scheme_year:             String,
  pub effective_academic_year: Option<String>,
}

impl From<&MasterRecord> for VersionSummary {
  fn from(m: &MasterRecord) -> Self {
    Self {
      document_id:             m.document_id,
      pd_version:              m.pd_version.clone(),
      created_at:              m.created_at,
      status:                  m.status,
      scheme_year:             m.scheme_year.clone(),
      effective_academic_year: m.effective_academic_year.clone(),
    }
  }
}

/// A master record with all four section references joined to their rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDocument {
  #[serde(flatten)]
  pub master:     MasterRecord,
  pub info:       SectionRecord<InfoContent>,
  pub objectives: SectionRecord<ObjectivesContent>,
  pub structure:  SectionRecord<StructureContent>,
  pub electives:  SectionRecord<ElectivesContent>,
}

/// A master record annotated with the program's display name, for per-author
/// listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentListing {
  #[serde(flatten)]
  pub master:       MasterRecord,
  pub program_name: String,
  pub department:   String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
  pub total:        u64,
  pub drafts:       u64,
  pub under_review: u64,
  pub approved:     u64,
}

/// Per-author dashboard: counts by status plus the most recent documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
  pub stats:       StatusCounts,
  pub recent_docs: Vec<DocumentListing>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn selection_from_tokens() {
    assert_eq!(
      SectionSelection::from_tokens::<&str>(&[]).unwrap(),
      SectionSelection::All
    );
    assert_eq!(
      SectionSelection::from_tokens(&["section2", "all"]).unwrap(),
      SectionSelection::All
    );
    assert_eq!(
      SectionSelection::from_tokens(&["section2", "structure", "section2"]).unwrap(),
      SectionSelection::Only(vec![SectionKind::Objectives, SectionKind::Structure])
    );
    assert!(SectionSelection::from_tokens(&["section9"]).is_err());
  }

  #[test]
  fn status_defaults_to_draft_and_roundtrips() {
    assert_eq!(DocumentStatus::default(), DocumentStatus::Draft);
    for s in [
      DocumentStatus::Draft,
      DocumentStatus::UnderReview,
      DocumentStatus::Approved,
      DocumentStatus::Archived,
    ] {
      assert_eq!(DocumentStatus::parse(s.as_str()), Some(s));
    }
    assert_eq!(DocumentStatus::parse("Rejected"), None);
  }

  #[test]
  fn validate_requires_program_code_and_scheme_year() {
    let mut doc = NewDocument {
      program_code:   "BTECH-CSE".into(),
      metadata:       DocumentMetadata {
        scheme_year: "2024".into(),
        ..Default::default()
      },
      sections:       SectionPayloads::default(),
      created_by:     "creator-1".into(),
      is_new_program: true,
      selection:      SectionSelection::All,
    };
    assert!(doc.validate().is_ok());

    doc.metadata.scheme_year = " ".into();
    assert!(matches!(doc.validate(), Err(Error::Validation(_))));

    doc.metadata.scheme_year = "2024".into();
    doc.program_code = String::new();
    assert!(matches!(doc.validate(), Err(Error::Validation(_))));
  }
}
