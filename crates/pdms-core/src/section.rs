//! Section types: the four fragments a program document is assembled from.
//!
//! Every save writes section rows that are never updated or deleted. A
//! section row is identified by its UUID and, within a program, by its
//! version string.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Kind ────────────────────────────────────────────────────────────────────

/// Which of the four section variants a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
  Info,
  Objectives,
  Structure,
  Electives,
}

impl SectionKind {
  /// All variants in document order.
  pub const ALL: [SectionKind; 4] = [
    SectionKind::Info,
    SectionKind::Objectives,
    SectionKind::Structure,
    SectionKind::Electives,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Info => "info",
      Self::Objectives => "objectives",
      Self::Structure => "structure",
      Self::Electives => "electives",
    }
  }

  /// Parse either the variant name or the positional alias used by editors
  /// (`section1` .. `section4`).
  pub fn parse(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "info" | "section1" => Ok(Self::Info),
      "objectives" | "section2" => Ok(Self::Objectives),
      "structure" | "section3" => Ok(Self::Structure),
      "electives" | "section4" => Ok(Self::Electives),
      _ => Err(Error::UnknownSection(s.to_owned())),
    }
  }
}

impl fmt::Display for SectionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Section trait ───────────────────────────────────────────────────────────

/// Implemented by each section payload type.
pub trait Section:
  Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
  const KIND: SectionKind;

  /// Reject payloads with empty required fields.
  fn validate(&self) -> Result<()>;
}

fn require(kind: SectionKind, field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::Validation(format!("{kind} section: {field} is required")));
  }
  Ok(())
}

// ─── Info ────────────────────────────────────────────────────────────────────

/// Organisational and award details of the program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InfoContent {
  pub faculty:                   String,
  pub school:                    String,
  pub department:                String,
  pub program_name:              String,
  pub director_of_school:        Option<String>,
  pub head_of_department:        Option<String>,
  pub award_title:               String,
  pub mode_of_study:             String,
  pub awarding_institution:      String,
  pub joint_award:               String,
  pub teaching_institution:      String,
  pub date_of_program_specs:     Option<String>,
  pub date_of_course_approval:   String,
  pub next_review_date:          String,
  pub approving_regulating_body: String,
  pub accredited_body:           String,
  pub grade_awarded:             String,
  pub accreditation_validity:    String,
  pub program_benchmark:         String,
}

impl Default for InfoContent {
  fn default() -> Self {
    let dashes = || "---".to_owned();
    Self {
      faculty:                   "Engineering and Technology (FET)".into(),
      school:                    "School of Computer Science and Technology (SCST)"
        .into(),
      department:                String::new(),
      program_name:              String::new(),
      director_of_school:        None,
      head_of_department:        None,
      award_title:               String::new(),
      mode_of_study:             "Full Time".into(),
      awarding_institution:      "GM University".into(),
      joint_award:               "Not Applicable".into(),
      teaching_institution:      "Faculty of Engineering and Technology, GM University"
        .into(),
      date_of_program_specs:     None,
      date_of_course_approval:   dashes(),
      next_review_date:          dashes(),
      approving_regulating_body: dashes(),
      accredited_body:           dashes(),
      grade_awarded:             dashes(),
      accreditation_validity:    dashes(),
      program_benchmark:         "N/A".into(),
    }
  }
}

impl Section for InfoContent {
  const KIND: SectionKind = SectionKind::Info;

  fn validate(&self) -> Result<()> {
    require(Self::KIND, "department", &self.department)?;
    require(Self::KIND, "programName", &self.program_name)?;
    require(Self::KIND, "awardTitle", &self.award_title)
  }
}

// ─── Objectives ──────────────────────────────────────────────────────────────

/// Program overview, educational objectives and outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectivesContent {
  pub program_overview: String,
  /// Program educational objectives.
  pub peos:             Vec<String>,
  /// Program outcomes (graduate attributes).
  pub pos:              Vec<String>,
  /// Program-specific outcomes.
  pub psos:             Vec<String>,
}

impl Section for ObjectivesContent {
  const KIND: SectionKind = SectionKind::Objectives;

  fn validate(&self) -> Result<()> {
    require(Self::KIND, "programOverview", &self.program_overview)
  }
}

// ─── Structure ───────────────────────────────────────────────────────────────

/// Credits awarded per contact hour of each delivery mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditDefinition {
  pub lecture:   f64,
  pub tutorial:  f64,
  pub practical: f64,
}

impl Default for CreditDefinition {
  fn default() -> Self { Self { lecture: 1.0, tutorial: 1.0, practical: 1.0 } }
}

/// One row of the summary table, e.g. "Program-Core courses".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureRow {
  pub category: String,
  pub code:     String,
  pub credits:  f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourseType {
  #[default]
  Theory,
  Lab,
  #[serde(rename = "Theory + Lab")]
  TheoryLab,
  Project,
  Seminar,
  Practical,
  Internship,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
  pub code:     String,
  pub title:    String,
  pub credits:  f64,
  #[serde(default, rename = "type")]
  pub kind:     CourseType,
  #[serde(default = "default_course_category")]
  pub category: String,
}

fn default_course_category() -> String { "Core".to_owned() }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Semester {
  pub sem_number:    u32,
  #[serde(default)]
  pub courses:       Vec<Course>,
  #[serde(default)]
  pub total_credits: f64,
}

/// Credit structure and the semester-wise curriculum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StructureContent {
  pub credit_definition:     CreditDefinition,
  pub structure_table:       Vec<StructureRow>,
  /// Required; `None` fails validation.
  pub total_program_credits: Option<f64>,
  pub semesters:             Vec<Semester>,
}

impl Section for StructureContent {
  const KIND: SectionKind = SectionKind::Structure;

  fn validate(&self) -> Result<()> {
    if self.total_program_credits.is_none() {
      return Err(Error::Validation(
        "structure section: totalProgramCredits is required".into(),
      ));
    }
    for semester in &self.semesters {
      for course in &semester.courses {
        require(Self::KIND, "course code", &course.code)?;
        require(Self::KIND, "course title", &course.title)?;
      }
    }
    Ok(())
  }
}

// ─── Electives ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectiveCourse {
  pub code:    String,
  pub title:   String,
  pub credits: f64,
}

/// A basket of electives offered in one semester, e.g.
/// "Professional Elective - 1".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectiveGroup {
  pub semester: u32,
  #[serde(default)]
  pub title:    Option<String>,
  #[serde(default)]
  pub courses:  Vec<ElectiveCourse>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElectivesContent {
  pub professional_electives: Vec<ElectiveGroup>,
  pub open_electives:         Vec<ElectiveGroup>,
}

impl Section for ElectivesContent {
  const KIND: SectionKind = SectionKind::Electives;

  fn validate(&self) -> Result<()> {
    self
      .professional_electives
      .iter()
      .chain(&self.open_electives)
      .flat_map(|g| &g.courses)
      .try_for_each(|c| {
        require(Self::KIND, "course code", &c.code)?;
        require(Self::KIND, "course title", &c.title)
      })
  }
}

// ─── Stored record ───────────────────────────────────────────────────────────

/// One immutable stored version of a section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRecord<C> {
  pub section_id:  Uuid,
  /// Groups every version of this section for one program.
  pub program_id:  String,
  pub version:     String,
  #[serde(flatten)]
  pub content:     C,
  pub created_by:  String,
  pub approved_by: Option<String>,
  pub is_approved: bool,
  /// Server-assigned; never changes after creation.
  pub created_at:  DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_accepts_names_and_positional_aliases() {
    assert_eq!(SectionKind::parse("section1").unwrap(), SectionKind::Info);
    assert_eq!(SectionKind::parse("Objectives").unwrap(), SectionKind::Objectives);
    assert_eq!(SectionKind::parse(" section3 ").unwrap(), SectionKind::Structure);
    assert_eq!(SectionKind::parse("electives").unwrap(), SectionKind::Electives);
    assert!(matches!(
      SectionKind::parse("section5"),
      Err(Error::UnknownSection(_))
    ));
  }

  #[test]
  fn info_defaults_fill_missing_fields() {
    let info: InfoContent = serde_json::from_value(serde_json::json!({
      "department": "CSE",
      "programName": "B.Tech Computer Science",
      "awardTitle": "Bachelor of Technology",
    }))
    .unwrap();

    assert_eq!(info.mode_of_study, "Full Time");
    assert_eq!(info.awarding_institution, "GM University");
    assert_eq!(info.next_review_date, "---");
    assert_eq!(info.program_benchmark, "N/A");
    assert!(info.validate().is_ok());
  }

  #[test]
  fn info_missing_required_field_is_rejected() {
    let info = InfoContent {
      department: "CSE".into(),
      award_title: "B.Tech".into(),
      ..Default::default()
    };
    let err = info.validate().unwrap_err();
    assert!(err.to_string().contains("programName"), "{err}");
  }

  #[test]
  fn structure_requires_total_credits() {
    assert!(StructureContent::default().validate().is_err());
    let ok = StructureContent {
      total_program_credits: Some(160.0),
      ..Default::default()
    };
    assert!(ok.validate().is_ok());
  }

  #[test]
  fn course_type_uses_display_names() {
    let course: Course = serde_json::from_value(serde_json::json!({
      "code": "CS101", "title": "Programming", "credits": 4, "type": "Theory + Lab",
    }))
    .unwrap();
    assert_eq!(course.kind, CourseType::TheoryLab);
    assert_eq!(course.category, "Core");
  }

  #[test]
  fn electives_reject_blank_course_codes() {
    let electives = ElectivesContent {
      open_electives: vec![ElectiveGroup {
        semester: 5,
        title:    Some("Open Elective - 1".into()),
        courses:  vec![ElectiveCourse {
          code:    " ".into(),
          title:   "Economics".into(),
          credits: 3.0,
        }],
      }],
      ..Default::default()
    };
    assert!(electives.validate().is_err());
  }
}
