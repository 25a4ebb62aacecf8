//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed microsecond width
//! so that lexical order equals chronological order. Section payloads and
//! account profiles are stored as compact JSON. UUIDs are stored as
//! hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use pdms_core::{
  account::{Account, AccountCredentials, AccountProfile, AccountStatus, Role},
  document::{DocumentListing, DocumentStatus, MasterRecord, SectionRefs},
  section::{Section, SectionKind, SectionRecord},
  snapshot::SnapshotHead,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("bad timestamp {s:?}: {e}")))
}

// ─── Enums ────────────────────────────────────────────────────────────────────

/// Table holding the rows of one section variant.
pub fn section_table(kind: SectionKind) -> &'static str {
  match kind {
    SectionKind::Info => "section_info",
    SectionKind::Objectives => "section_objectives",
    SectionKind::Structure => "section_structure",
    SectionKind::Electives => "section_electives",
  }
}

pub fn decode_status(s: &str) -> Result<DocumentStatus> {
  DocumentStatus::parse(s)
    .ok_or_else(|| Error::Decode(format!("unknown document status: {s:?}")))
}

pub fn decode_role(s: &str) -> Result<Role> {
  Role::parse(s).ok_or_else(|| Error::Decode(format!("unknown role: {s:?}")))
}

pub fn decode_account_status(s: &str) -> Result<AccountStatus> {
  AccountStatus::parse(s)
    .ok_or_else(|| Error::Decode(format!("unknown account status: {s:?}")))
}

// ─── Column lists ────────────────────────────────────────────────────────────

/// Master columns, in the order read by [`RawMaster::from_row`]. Queries
/// must alias `program_documents` as `m`.
pub const MASTER_COLUMNS: &str = "m.document_id, m.program_code, m.scheme_year, \
   m.pd_version, m.effective_academic_year, m.info_id, m.objectives_id, \
   m.structure_id, m.electives_id, m.status, m.created_by, m.approved_by, \
   m.approval_date, m.created_at";

/// Section columns, in the order read by [`RawSection::from_row`].
pub const SECTION_COLUMNS: &str = "section_id, program_id, version, \
   content_json, created_by, approved_by, is_approved, created_at";

/// Account columns, in the order read by [`RawAccount::from_row`].
pub const ACCOUNT_COLUMNS: &str = "account_id, email, password_hash, name, \
   role, status, blocked, blocked_reason, blocked_at, blocked_by, \
   profile_json, created_at, last_updated";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `program_documents` row.
pub struct RawMaster {
  pub document_id:             String,
  pub program_code:            String,
  pub scheme_year:             String,
  pub pd_version:              String,
  pub effective_academic_year: Option<String>,
  pub info_id:                 String,
  pub objectives_id:           String,
  pub structure_id:            String,
  pub electives_id:            String,
  pub status:                  String,
  pub created_by:              String,
  pub approved_by:             Option<String>,
  pub approval_date:           Option<String>,
  pub created_at:              String,
}

impl RawMaster {
  /// Read the fourteen [`MASTER_COLUMNS`] starting at column 0.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      document_id:             row.get(0)?,
      program_code:            row.get(1)?,
      scheme_year:             row.get(2)?,
      pd_version:              row.get(3)?,
      effective_academic_year: row.get(4)?,
      info_id:                 row.get(5)?,
      objectives_id:           row.get(6)?,
      structure_id:            row.get(7)?,
      electives_id:            row.get(8)?,
      status:                  row.get(9)?,
      created_by:              row.get(10)?,
      approved_by:             row.get(11)?,
      approval_date:           row.get(12)?,
      created_at:              row.get(13)?,
    })
  }

  fn refs(&self) -> Result<SectionRefs> {
    Ok(SectionRefs {
      info:       decode_uuid(&self.info_id)?,
      objectives: decode_uuid(&self.objectives_id)?,
      structure:  decode_uuid(&self.structure_id)?,
      electives:  decode_uuid(&self.electives_id)?,
    })
  }

  pub fn into_head(self) -> Result<SnapshotHead> {
    Ok(SnapshotHead { sections: self.refs()?, pd_version: self.pd_version })
  }

  pub fn into_master(self) -> Result<MasterRecord> {
    Ok(MasterRecord {
      document_id:             decode_uuid(&self.document_id)?,
      sections:                self.refs()?,
      status:                  decode_status(&self.status)?,
      approval_date:           self.approval_date.as_deref().map(decode_dt).transpose()?,
      created_at:              decode_dt(&self.created_at)?,
      program_code:            self.program_code,
      scheme_year:             self.scheme_year,
      pd_version:              self.pd_version,
      effective_academic_year: self.effective_academic_year,
      created_by:              self.created_by,
      approved_by:             self.approved_by,
    })
  }
}

/// A master row joined with its Info section's display fields.
pub struct RawListing {
  pub master:       RawMaster,
  pub program_name: Option<String>,
  pub department:   Option<String>,
}

impl RawListing {
  pub fn into_listing(self) -> Result<DocumentListing> {
    Ok(DocumentListing {
      master:       self.master.into_master()?,
      program_name: self.program_name.unwrap_or_default(),
      department:   self.department.unwrap_or_default(),
    })
  }
}

/// Raw strings read directly from any `section_*` row.
pub struct RawSection {
  pub section_id:   String,
  pub program_id:   String,
  pub version:      String,
  pub content_json: String,
  pub created_by:   String,
  pub approved_by:  Option<String>,
  pub is_approved:  bool,
  pub created_at:   String,
}

impl RawSection {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      section_id:   row.get(0)?,
      program_id:   row.get(1)?,
      version:      row.get(2)?,
      content_json: row.get(3)?,
      created_by:   row.get(4)?,
      approved_by:  row.get(5)?,
      is_approved:  row.get(6)?,
      created_at:   row.get(7)?,
    })
  }

  pub fn into_record<C: Section>(self) -> Result<SectionRecord<C>> {
    Ok(SectionRecord {
      section_id:  decode_uuid(&self.section_id)?,
      content:     serde_json::from_str(&self.content_json)?,
      created_at:  decode_dt(&self.created_at)?,
      program_id:  self.program_id,
      version:     self.version,
      created_by:  self.created_by,
      approved_by: self.approved_by,
      is_approved: self.is_approved,
    })
  }
}

/// Raw strings read directly from an `accounts` row.
pub struct RawAccount {
  pub account_id:     String,
  pub email:          String,
  pub password_hash:  String,
  pub name:           String,
  pub role:           String,
  pub status:         String,
  pub blocked:        bool,
  pub blocked_reason: Option<String>,
  pub blocked_at:     Option<String>,
  pub blocked_by:     Option<String>,
  pub profile_json:   String,
  pub created_at:     String,
  pub last_updated:   String,
}

impl RawAccount {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      account_id:     row.get(0)?,
      email:          row.get(1)?,
      password_hash:  row.get(2)?,
      name:           row.get(3)?,
      role:           row.get(4)?,
      status:         row.get(5)?,
      blocked:        row.get(6)?,
      blocked_reason: row.get(7)?,
      blocked_at:     row.get(8)?,
      blocked_by:     row.get(9)?,
      profile_json:   row.get(10)?,
      created_at:     row.get(11)?,
      last_updated:   row.get(12)?,
    })
  }

  pub fn into_credentials(self) -> Result<AccountCredentials> {
    let profile: AccountProfile = serde_json::from_str(&self.profile_json)?;
    let account = Account {
      account_id: decode_uuid(&self.account_id)?,
      email: self.email,
      name: self.name,
      role: decode_role(&self.role)?,
      status: decode_account_status(&self.status)?,
      blocked: self.blocked,
      blocked_reason: self.blocked_reason,
      blocked_at: self.blocked_at.as_deref().map(decode_dt).transpose()?,
      blocked_by: self.blocked_by,
      profile,
      created_at: decode_dt(&self.created_at)?,
      last_updated: decode_dt(&self.last_updated)?,
    };
    Ok(AccountCredentials { account, password_hash: self.password_hash })
  }

  pub fn into_account(self) -> Result<Account> {
    Ok(self.into_credentials()?.account)
  }
}
