//! The `DocumentStore` and `AccountStore` traits.
//!
//! The traits are implemented by storage backends (e.g. `pdms-store-sqlite`).
//! Higher layers (`pdms-api`, `pdms-server`) depend on these abstractions,
//! not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  Classify,
  account::{Account, AccountCredentials, AccountUpdate, NewAccount, Role},
  document::{
    DashboardStats, DocumentListing, NewDocument, ResolvedDocument, SavedDocument,
    VersionSummary,
  },
  section::{Section, SectionRecord},
};

/// Number of listings included in [`DashboardStats::recent_docs`].
pub const DASHBOARD_RECENT: usize = 5;

// ─── Documents ───────────────────────────────────────────────────────────────

/// Abstraction over a program document store backend.
///
/// Sections and master records are append-only: every save writes new rows
/// and no row is ever updated or deleted.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Persist a new immutable version of a program document.
  ///
  /// The previous master record (latest by creation time for the program
  /// code) is read, the version is allocated via
  /// [`crate::snapshot::plan_snapshot`], and the section rows plus the new
  /// master record are inserted, all atomically. A uniqueness violation is
  /// returned as a `Conflict`-class error and nothing is written.
  fn save_document(
    &self,
    input: NewDocument,
  ) -> impl Future<Output = Result<SavedDocument, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Summaries of the `limit` most recent master records for a program,
  /// newest first. Section content is not resolved.
  fn recent_versions<'a>(
    &'a self,
    program_code: &'a str,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<VersionSummary>, Self::Error>> + Send + 'a;

  /// The most recently created master record for a program, fully resolved.
  /// Returns `None` if the program has no history.
  fn latest_document<'a>(
    &'a self,
    program_code: &'a str,
  ) -> impl Future<Output = Result<Option<ResolvedDocument>, Self::Error>> + Send + 'a;

  /// A master record by identifier, fully resolved. Returns `None` if not
  /// found.
  fn get_document(
    &self,
    document_id: Uuid,
  ) -> impl Future<Output = Result<Option<ResolvedDocument>, Self::Error>> + Send + '_;

  /// Every stored version of one section variant for a program, newest first.
  fn section_history<'a, C: Section>(
    &'a self,
    program_id: &'a str,
  ) -> impl Future<Output = Result<Vec<SectionRecord<C>>, Self::Error>> + Send + 'a;

  /// Every master record created by `created_by`, newest first.
  fn creator_history<'a>(
    &'a self,
    created_by: &'a str,
  ) -> impl Future<Output = Result<Vec<DocumentListing>, Self::Error>> + Send + 'a;

  /// Status counts and the [`DASHBOARD_RECENT`] most recent listings for
  /// `created_by`.
  fn creator_stats<'a>(
    &'a self,
    created_by: &'a str,
  ) -> impl Future<Output = Result<DashboardStats, Self::Error>> + Send + 'a;
}

// ─── Accounts ────────────────────────────────────────────────────────────────

/// Abstraction over account storage. Accounts, unlike documents, are mutable.
pub trait AccountStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  /// Create an account. The email is normalised first; a duplicate email is
  /// a `Conflict`-class error.
  fn create_account(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  /// Look up an account and its password hash by (normalised) email.
  fn find_credentials<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<AccountCredentials>, Self::Error>> + Send + 'a;

  fn get_account(
    &self,
    account_id: Uuid,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  /// All accounts, newest first, optionally filtered by role.
  fn list_accounts(
    &self,
    role: Option<Role>,
  ) -> impl Future<Output = Result<Vec<Account>, Self::Error>> + Send + '_;

  /// Apply `update` and return the updated account, or `None` if not found.
  fn update_account(
    &self,
    account_id: Uuid,
    update: AccountUpdate,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  /// Delete an account. Returns `false` if it did not exist.
  fn delete_account(
    &self,
    account_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
