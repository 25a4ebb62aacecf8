//! Snapshot planning — the backend-independent half of a save.
//!
//! A save produces one new master record plus a new row for every section it
//! writes. Before touching storage a backend asks [`plan_snapshot`] which
//! version to stamp and, per section, whether to insert the supplied payload
//! or link the previous master's row. The backend must read `previous` and
//! execute the plan inside a single write transaction.

use uuid::Uuid;

use crate::{
  Error, Result,
  document::{NewDocument, SectionRefs, SectionSelection},
  section::{Section, SectionKind},
  version::{INITIAL_VERSION, next_version},
};

/// The parts of the previous master record a plan depends on.
#[derive(Debug, Clone)]
pub struct SnapshotHead {
  pub pd_version: String,
  pub sections:   SectionRefs,
}

/// What to do for one section.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionWrite {
  /// Insert a new row holding this JSON-encoded payload.
  Create(String),
  /// Link the existing row with this identifier.
  Reuse(Uuid),
}

#[derive(Debug, Clone)]
pub struct SnapshotPlan {
  pub pd_version: String,
  pub info:       SectionWrite,
  pub objectives: SectionWrite,
  pub structure:  SectionWrite,
  pub electives:  SectionWrite,
}

impl SnapshotPlan {
  pub fn get(&self, kind: SectionKind) -> &SectionWrite {
    match kind {
      SectionKind::Info => &self.info,
      SectionKind::Objectives => &self.objectives,
      SectionKind::Structure => &self.structure,
      SectionKind::Electives => &self.electives,
    }
  }

  /// Sections that receive a new row, in document order.
  pub fn written(&self) -> Vec<SectionKind> {
    SectionKind::ALL
      .into_iter()
      .filter(|k| matches!(self.get(*k), SectionWrite::Create(_)))
      .collect()
  }
}

/// Decide the version and per-section writes for `input`.
///
/// `previous` is the most recently created master record for the program
/// code, or `None` if the program has no history. It is ignored for a new
/// program.
///
/// - New program, or no history: version [`INITIAL_VERSION`]; every section
///   is written regardless of the selection.
/// - Otherwise: the previous version is incremented and only selected
///   sections are written; the rest reuse the previous rows.
///
/// Every section that is written must have a valid payload.
pub fn plan_snapshot(
  input: &NewDocument,
  previous: Option<&SnapshotHead>,
) -> Result<SnapshotPlan> {
  input.validate()?;

  let head = previous.filter(|_| !input.is_new_program);
  let (pd_version, selection) = match head {
    None => (INITIAL_VERSION.to_owned(), SectionSelection::All),
    Some(h) => (next_version(Some(&h.pd_version)), input.selection.clone()),
  };

  let sections = &input.sections;
  Ok(SnapshotPlan {
    info: plan_section(&selection, head, sections.info.as_ref())?,
    objectives: plan_section(&selection, head, sections.objectives.as_ref())?,
    structure: plan_section(&selection, head, sections.structure.as_ref())?,
    electives: plan_section(&selection, head, sections.electives.as_ref())?,
    pd_version,
  })
}

fn plan_section<C: Section>(
  selection: &SectionSelection,
  head: Option<&SnapshotHead>,
  payload: Option<&C>,
) -> Result<SectionWrite> {
  match head {
    Some(h) if !selection.includes(C::KIND) => {
      Ok(SectionWrite::Reuse(h.sections.get(C::KIND)))
    }
    _ => {
      let payload = payload.ok_or_else(|| {
        Error::Validation(format!("{} section payload is required", C::KIND))
      })?;
      payload.validate()?;
      Ok(SectionWrite::Create(serde_json::to_string(payload)?))
    }
  }
}
