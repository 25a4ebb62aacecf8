//! [`SqliteStore`] — the SQLite implementation of [`DocumentStore`] and
//! [`AccountStore`].

use std::{path::Path, time::Duration};

use chrono::{DateTime, SubsecRound as _, TimeDelta, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use pdms_core::{
  account::{
    Account, AccountCredentials, AccountUpdate, NewAccount, Role, normalize_email,
  },
  document::{
    DashboardStats, DocumentListing, MasterRecord, NewDocument, ResolvedDocument,
    SavedDocument, SectionRefs, StatusCounts, VersionSummary,
  },
  section::{Section, SectionKind, SectionRecord},
  snapshot::{SectionWrite, plan_snapshot},
  store::{AccountStore, DASHBOARD_RECENT, DocumentStore},
};

use crate::{
  Error, Result,
  encode::{
    ACCOUNT_COLUMNS, MASTER_COLUMNS, RawAccount, RawListing, RawMaster, RawSection,
    SECTION_COLUMNS, decode_dt, encode_dt, encode_uuid, section_table,
  },
  error::{abort, on_unique},
  schema::SCHEMA,
};

type CallResult<T> = std::result::Result<T, tokio_rusqlite::Error>;

/// How long a writer waits for another connection's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A program document store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run an arbitrary statement; lets tests poke at the immutability triggers.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<usize> {
    Ok(self.conn.call(move |conn| Ok(conn.execute(sql, [])?)).await?)
  }

  /// Master listings for one author, newest first. `limit` of `None` means
  /// unbounded.
  async fn listings(
    &self,
    created_by: &str,
    limit: Option<usize>,
  ) -> Result<Vec<DocumentListing>> {
    let created_by = created_by.to_owned();
    let limit = limit.map_or(-1, to_sql_limit);

    let raws: Vec<RawListing> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {MASTER_COLUMNS},
                  json_extract(i.content_json, '$.programName'),
                  json_extract(i.content_json, '$.department')
           FROM program_documents m
           JOIN section_info i ON i.section_id = m.info_id
           WHERE m.created_by = ?1
           ORDER BY m.created_at DESC, m.rowid DESC
           LIMIT ?2"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![created_by, limit], |row| {
            Ok(RawListing {
              master:       RawMaster::from_row(row)?,
              program_name: row.get(14)?,
              department:   row.get(15)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawListing::into_listing).collect()
  }
}

// ─── Query helpers (run inside `Connection::call`) ───────────────────────────

fn to_sql_limit(limit: usize) -> i64 { i64::try_from(limit).unwrap_or(i64::MAX) }

fn latest_master(
  conn: &rusqlite::Connection,
  program_code: &str,
) -> CallResult<Option<RawMaster>> {
  let sql = format!(
    "SELECT {MASTER_COLUMNS} FROM program_documents m
     WHERE m.program_code = ?1
     ORDER BY m.created_at DESC, m.rowid DESC
     LIMIT 1"
  );
  Ok(
    conn
      .query_row(&sql, rusqlite::params![program_code], RawMaster::from_row)
      .optional()?,
  )
}

/// Creation time for a new master, taken under the write lock. Never earlier
/// than the current head, so creation order always matches version order even
/// if the wall clock steps backwards.
fn stamp_after(head: Option<&RawMaster>) -> Result<DateTime<Utc>> {
  let now = Utc::now().trunc_subsecs(6);
  let Some(head) = head else {
    return Ok(now);
  };
  let floor = decode_dt(&head.created_at)? + TimeDelta::microseconds(1);
  Ok(now.max(floor))
}

fn master_by_id(
  conn: &rusqlite::Connection,
  document_id: &str,
) -> CallResult<Option<RawMaster>> {
  let sql =
    format!("SELECT {MASTER_COLUMNS} FROM program_documents m WHERE m.document_id = ?1");
  Ok(
    conn
      .query_row(&sql, rusqlite::params![document_id], RawMaster::from_row)
      .optional()?,
  )
}

fn section_by_id(
  conn: &rusqlite::Connection,
  kind: SectionKind,
  section_id: &str,
) -> CallResult<RawSection> {
  let sql = format!(
    "SELECT {SECTION_COLUMNS} FROM {} WHERE section_id = ?1",
    section_table(kind)
  );
  Ok(conn.query_row(&sql, rusqlite::params![section_id], RawSection::from_row)?)
}

/// The four section rows a master links to, in document order.
type RawSections = [RawSection; 4];

fn resolve_sections(
  conn: &rusqlite::Connection,
  master: &RawMaster,
) -> CallResult<RawSections> {
  Ok([
    section_by_id(conn, SectionKind::Info, &master.info_id)?,
    section_by_id(conn, SectionKind::Objectives, &master.objectives_id)?,
    section_by_id(conn, SectionKind::Structure, &master.structure_id)?,
    section_by_id(conn, SectionKind::Electives, &master.electives_id)?,
  ])
}

fn into_resolved(master: RawMaster, sections: RawSections) -> Result<ResolvedDocument> {
  let [info, objectives, structure, electives] = sections;
  Ok(ResolvedDocument {
    master:     master.into_master()?,
    info:       info.into_record()?,
    objectives: objectives.into_record()?,
    structure:  structure.into_record()?,
    electives:  electives.into_record()?,
  })
}

fn account_by(
  conn: &rusqlite::Connection,
  column: &'static str,
  value: &str,
) -> CallResult<Option<RawAccount>> {
  let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {column} = ?1");
  Ok(
    conn
      .query_row(&sql, rusqlite::params![value], RawAccount::from_row)
      .optional()?,
  )
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = Error;

  async fn save_document(&self, input: NewDocument) -> Result<SavedDocument> {
    input.validate()?;

    let document_id = Uuid::new_v4();
    let doc_id_str = encode_uuid(document_id);
    let status = input.metadata.status.unwrap_or_default();
    let status_str = status.as_str();

    let (pd_version, sections, written, created_at, input) = self
      .conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock up front, so the previous version
        // cannot change between the read below and the inserts.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let head = latest_master(&tx, &input.program_code)?;
        let created_at = stamp_after(head.as_ref()).map_err(abort)?;
        let at_str = encode_dt(created_at);

        let previous = if input.is_new_program {
          None
        } else {
          head.map(RawMaster::into_head).transpose().map_err(abort)?
        };
        let plan = plan_snapshot(&input, previous.as_ref()).map_err(abort)?;
        let version = plan.pd_version.clone();

        let mut ids = Vec::with_capacity(SectionKind::ALL.len());
        for kind in SectionKind::ALL {
          let id = match plan.get(kind) {
            SectionWrite::Reuse(id) => *id,
            SectionWrite::Create(content_json) => {
              let id = Uuid::new_v4();
              tx.execute(
                &format!(
                  "INSERT INTO {} (
                     section_id, program_id, version, content_json,
                     created_by, created_at
                   ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                  section_table(kind)
                ),
                rusqlite::params![
                  encode_uuid(id),
                  input.program_code,
                  version,
                  content_json,
                  input.created_by,
                  at_str,
                ],
              )
              .map_err(|e| {
                on_unique(e, || pdms_core::Error::DuplicateSection {
                  kind,
                  program_id: input.program_code.clone(),
                  version: version.clone(),
                })
              })?;
              id
            }
          };
          ids.push(id);
        }
        let sections = SectionRefs {
          info:       ids[0],
          objectives: ids[1],
          structure:  ids[2],
          electives:  ids[3],
        };

        tx.execute(
          "INSERT INTO program_documents (
             document_id, program_code, scheme_year, pd_version,
             effective_academic_year, info_id, objectives_id, structure_id,
             electives_id, status, created_by, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            doc_id_str,
            input.program_code,
            input.metadata.scheme_year,
            version,
            input.metadata.effective_ay,
            encode_uuid(sections.info),
            encode_uuid(sections.objectives),
            encode_uuid(sections.structure),
            encode_uuid(sections.electives),
            status_str,
            input.created_by,
            at_str,
          ],
        )
        .map_err(|e| {
          on_unique(e, || pdms_core::Error::DuplicateVersion {
            program_code: input.program_code.clone(),
            scheme_year:  input.metadata.scheme_year.clone(),
            pd_version:   version.clone(),
          })
        })?;

        tx.commit()?;
        Ok((version, sections, plan.written(), created_at, input))
      })
      .await?;

    let master = MasterRecord {
      document_id,
      program_code: input.program_code,
      scheme_year: input.metadata.scheme_year,
      pd_version: pd_version.clone(),
      effective_academic_year: input.metadata.effective_ay,
      sections,
      status,
      created_by: input.created_by,
      approved_by: None,
      approval_date: None,
      created_at,
    };

    Ok(SavedDocument { master, version: pd_version, written })
  }

  async fn recent_versions(
    &self,
    program_code: &str,
    limit: usize,
  ) -> Result<Vec<VersionSummary>> {
    let program_code = program_code.to_owned();
    let limit = to_sql_limit(limit);

    let raws: Vec<RawMaster> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {MASTER_COLUMNS} FROM program_documents m
           WHERE m.program_code = ?1
           ORDER BY m.created_at DESC, m.rowid DESC
           LIMIT ?2"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![program_code, limit], RawMaster::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|raw| Ok(VersionSummary::from(&raw.into_master()?)))
      .collect()
  }

  async fn latest_document(&self, program_code: &str) -> Result<Option<ResolvedDocument>> {
    let program_code = program_code.to_owned();

    let raw = self
      .conn
      .call(move |conn| {
        let Some(master) = latest_master(conn, &program_code)? else {
          return Ok(None);
        };
        let sections = resolve_sections(conn, &master)?;
        Ok(Some((master, sections)))
      })
      .await?;

    raw.map(|(m, s)| into_resolved(m, s)).transpose()
  }

  async fn get_document(&self, document_id: Uuid) -> Result<Option<ResolvedDocument>> {
    let id_str = encode_uuid(document_id);

    let raw = self
      .conn
      .call(move |conn| {
        let Some(master) = master_by_id(conn, &id_str)? else {
          return Ok(None);
        };
        let sections = resolve_sections(conn, &master)?;
        Ok(Some((master, sections)))
      })
      .await?;

    raw.map(|(m, s)| into_resolved(m, s)).transpose()
  }

  async fn section_history<C: Section>(
    &self,
    program_id: &str,
  ) -> Result<Vec<SectionRecord<C>>> {
    let program_id = program_id.to_owned();
    let table = section_table(C::KIND);

    let raws: Vec<RawSection> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {SECTION_COLUMNS} FROM {table}
           WHERE program_id = ?1
           ORDER BY created_at DESC, rowid DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![program_id], RawSection::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSection::into_record).collect()
  }

  async fn creator_history(&self, created_by: &str) -> Result<Vec<DocumentListing>> {
    self.listings(created_by, None).await
  }

  async fn creator_stats(&self, created_by: &str) -> Result<DashboardStats> {
    let author = created_by.to_owned();

    let (total, drafts, under_review, approved): (i64, i64, i64, i64) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*),
                  COALESCE(SUM(status = 'Draft'), 0),
                  COALESCE(SUM(status = 'UnderReview'), 0),
                  COALESCE(SUM(status = 'Approved'), 0)
           FROM program_documents
           WHERE created_by = ?1",
          rusqlite::params![author],
          |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )?)
      })
      .await?;

    let count = |n: i64| u64::try_from(n).unwrap_or_default();
    let stats = StatusCounts {
      total:        count(total),
      drafts:       count(drafts),
      under_review: count(under_review),
      approved:     count(approved),
    };
    let recent_docs = self.listings(created_by, Some(DASHBOARD_RECENT)).await?;

    Ok(DashboardStats { stats, recent_docs })
  }
}

// ─── AccountStore impl ───────────────────────────────────────────────────────

impl AccountStore for SqliteStore {
  type Error = Error;

  async fn create_account(&self, input: NewAccount) -> Result<Account> {
    let now = Utc::now();
    let account = Account {
      account_id:     Uuid::new_v4(),
      email:          normalize_email(&input.email),
      name:           input.name,
      role:           input.role,
      status:         input.status,
      blocked:        false,
      blocked_reason: None,
      blocked_at:     None,
      blocked_by:     None,
      profile:        input.profile,
      created_at:     now,
      last_updated:   now,
    };

    let id_str       = encode_uuid(account.account_id);
    let email        = account.email.clone();
    let name         = account.name.clone();
    let role_str     = account.role.as_str();
    let status_str   = account.status.as_str();
    let profile_json = serde_json::to_string(&account.profile)?;
    let at_str       = encode_dt(now);
    let hash         = input.password_hash;

    self
      .conn
      .call(move |conn| {
        conn
          .execute(
            "INSERT INTO accounts (
               account_id, email, password_hash, name, role, status,
               profile_json, created_at, last_updated
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            rusqlite::params![
              id_str, email, hash, name, role_str, status_str, profile_json, at_str,
            ],
          )
          .map_err(|e| on_unique(e, || pdms_core::Error::DuplicateEmail(email.clone())))?;
        Ok(())
      })
      .await?;

    Ok(account)
  }

  async fn find_credentials(&self, email: &str) -> Result<Option<AccountCredentials>> {
    let email = normalize_email(email);
    let raw = self
      .conn
      .call(move |conn| account_by(conn, "email", &email))
      .await?;
    raw.map(RawAccount::into_credentials).transpose()
  }

  async fn get_account(&self, account_id: Uuid) -> Result<Option<Account>> {
    let id_str = encode_uuid(account_id);
    let raw = self
      .conn
      .call(move |conn| account_by(conn, "account_id", &id_str))
      .await?;
    raw.map(RawAccount::into_account).transpose()
  }

  async fn list_accounts(&self, role: Option<Role>) -> Result<Vec<Account>> {
    let role_str = role.map(Role::as_str);

    let raws: Vec<RawAccount> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {ACCOUNT_COLUMNS} FROM accounts
           WHERE ?1 IS NULL OR role = ?1
           ORDER BY created_at DESC, rowid DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![role_str], RawAccount::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAccount::into_account).collect()
  }

  async fn update_account(
    &self,
    account_id: Uuid,
    update: AccountUpdate,
  ) -> Result<Option<Account>> {
    let id_str = encode_uuid(account_id);
    let now = Utc::now();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(raw) = account_by(&tx, "account_id", &id_str)? else {
          return Ok(None);
        };
        let mut account = raw.into_account().map_err(abort)?;
        account.apply(update, now);

        tx.execute(
          "UPDATE accounts
           SET status = ?2, blocked = ?3, blocked_reason = ?4,
               blocked_at = ?5, blocked_by = ?6, last_updated = ?7
           WHERE account_id = ?1",
          rusqlite::params![
            id_str,
            account.status.as_str(),
            account.blocked,
            account.blocked_reason,
            account.blocked_at.map(encode_dt),
            account.blocked_by,
            encode_dt(account.last_updated),
          ],
        )?;
        tx.commit()?;
        Ok(Some(account))
      })
      .await
      .map_err(Error::from)
  }

  async fn delete_account(&self, account_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(account_id);
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM accounts WHERE account_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(deleted > 0)
  }
}
