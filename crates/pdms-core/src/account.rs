//! Accounts and roles.
//!
//! Developers are configured out-of-band and never stored. Admins and
//! creators are stored accounts. Unlike documents, accounts are mutable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Roles ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  /// Super-admin; manages admin and creator accounts.
  Developer,
  Admin,
  /// Faculty member who authors program documents.
  Creator,
}

/// Something an authenticated caller may attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  AuthorDocuments,
  ReadDocuments,
  ManageCreators,
  ManageAdmins,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Developer => "developer",
      Self::Admin => "admin",
      Self::Creator => "creator",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "developer" => Some(Self::Developer),
      "admin" => Some(Self::Admin),
      "creator" => Some(Self::Creator),
      _ => None,
    }
  }

  pub fn permits(self, action: Action) -> bool {
    match (self, action) {
      (Self::Developer, Action::AuthorDocuments) => false,
      (Self::Developer, Action::ReadDocuments) => true,
      (Self::Developer, Action::ManageCreators) => true,
      (Self::Developer, Action::ManageAdmins) => true,

      (Self::Admin, Action::AuthorDocuments) => false,
      (Self::Admin, Action::ReadDocuments) => true,
      (Self::Admin, Action::ManageCreators) => true,
      (Self::Admin, Action::ManageAdmins) => false,

      (Self::Creator, Action::AuthorDocuments) => true,
      (Self::Creator, Action::ReadDocuments) => true,
      (Self::Creator, Action::ManageCreators) => false,
      (Self::Creator, Action::ManageAdmins) => false,
    }
  }

  /// The action needed to manage an account holding this role.
  pub fn management_action(self) -> Action {
    match self {
      Self::Creator => Action::ManageCreators,
      Self::Admin | Self::Developer => Action::ManageAdmins,
    }
  }
}

// ─── Accounts ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
  Active,
  /// Newly registered accounts wait here until approved.
  #[default]
  Inactive,
}

impl AccountStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Active => "active",
      Self::Inactive => "inactive",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "active" => Some(Self::Active),
      "inactive" => Some(Self::Inactive),
      _ => None,
    }
  }
}

/// Free-form profile details; none are used for authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccountProfile {
  pub mobile_no:   Option<String>,
  pub college:     Option<String>,
  pub faculty:     Option<String>,
  pub school:      Option<String>,
  pub programme:   Option<String>,
  pub course:      Option<String>,
  pub discipline:  Option<String>,
  pub category:    Option<String>,
  pub designation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
  pub account_id:     Uuid,
  pub email:          String,
  pub name:           String,
  pub role:           Role,
  pub status:         AccountStatus,
  pub blocked:        bool,
  pub blocked_reason: Option<String>,
  pub blocked_at:     Option<DateTime<Utc>>,
  pub blocked_by:     Option<String>,
  pub profile:        AccountProfile,
  pub created_at:     DateTime<Utc>,
  pub last_updated:   DateTime<Utc>,
}

/// An account together with its stored password hash. Never serialised.
#[derive(Debug, Clone)]
pub struct AccountCredentials {
  pub account:       Account,
  /// PHC string produced by argon2.
  pub password_hash: String,
}

/// Input to [`crate::store::AccountStore::create_account`].
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub email:         String,
  pub password_hash: String,
  pub name:          String,
  pub role:          Role,
  pub status:        AccountStatus,
  pub profile:       AccountProfile,
}

/// Normalise an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

/// A partial update applied by an administrator. `None` leaves the field
/// unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccountUpdate {
  pub status:         Option<AccountStatus>,
  pub blocked:        Option<bool>,
  pub blocked_reason: Option<String>,
  /// Set by the server from the acting account; ignored on input.
  #[serde(skip)]
  pub blocked_by:     Option<String>,
}

impl Account {
  /// Apply an administrator's update in place. Blocking stamps the time and
  /// actor; unblocking clears all block details.
  pub fn apply(&mut self, update: AccountUpdate, now: DateTime<Utc>) {
    if let Some(status) = update.status {
      self.status = status;
    }
    match update.blocked {
      Some(true) => {
        if !self.blocked {
          self.blocked_at = Some(now);
        }
        self.blocked = true;
        self.blocked_by = update.blocked_by;
        if update.blocked_reason.is_some() {
          self.blocked_reason = update.blocked_reason;
        }
      }
      Some(false) => {
        self.blocked = false;
        self.blocked_reason = None;
        self.blocked_at = None;
        self.blocked_by = None;
      }
      None => {
        if self.blocked && update.blocked_reason.is_some() {
          self.blocked_reason = update.blocked_reason;
        }
      }
    }
    self.last_updated = now;
  }
}
