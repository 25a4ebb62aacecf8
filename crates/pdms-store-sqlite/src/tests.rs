//! Integration tests for `SqliteStore` against an in-memory database.

use pdms_core::{
  Classify, ErrorClass,
  account::{AccountProfile, AccountStatus, AccountUpdate, NewAccount, Role},
  document::{
    DocumentMetadata, DocumentStatus, NewDocument, SectionPayloads, SectionSelection,
  },
  section::{
    Course, CourseType, ElectiveCourse, ElectiveGroup, ElectivesContent, InfoContent,
    ObjectivesContent, SectionKind, Semester, StructureContent,
  },
  store::{AccountStore, DocumentStore},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn info(program_name: &str) -> InfoContent {
  InfoContent {
    department: "Computer Science and Engineering".into(),
    program_name: program_name.into(),
    award_title: "Bachelor of Technology".into(),
    ..Default::default()
  }
}

fn objectives(overview: &str) -> ObjectivesContent {
  ObjectivesContent {
    program_overview: overview.into(),
    peos: vec!["Graduates practise computing professionally".into()],
    ..Default::default()
  }
}

fn structure() -> StructureContent {
  StructureContent {
    total_program_credits: Some(160.0),
    semesters: vec![Semester {
      sem_number:    1,
      courses:       vec![Course {
        code:     "CS101".into(),
        title:    "Programming Fundamentals".into(),
        credits:  4.0,
        kind:     CourseType::TheoryLab,
        category: "Core".into(),
      }],
      total_credits: 4.0,
    }],
    ..Default::default()
  }
}

fn electives() -> ElectivesContent {
  ElectivesContent {
    professional_electives: vec![ElectiveGroup {
      semester: 5,
      title:    Some("Professional Elective - 1".into()),
      courses:  vec![ElectiveCourse {
        code:    "CS501".into(),
        title:   "Machine Learning".into(),
        credits: 3.0,
      }],
    }],
    ..Default::default()
  }
}

fn doc(code: &str, is_new_program: bool) -> NewDocument {
  NewDocument {
    program_code: code.into(),
    metadata: DocumentMetadata {
      scheme_year: "2024".into(),
      effective_ay: Some("2024-25".into()),
      ..Default::default()
    },
    sections: SectionPayloads::complete(
      info("B.Tech CSE"),
      objectives("Four-year undergraduate program"),
      structure(),
      electives(),
    ),
    created_by: "creator-1".into(),
    is_new_program,
    selection: SectionSelection::All,
  }
}

async fn section_counts(s: &SqliteStore, code: &str) -> [usize; 4] {
  [
    s.section_history::<InfoContent>(code).await.unwrap().len(),
    s.section_history::<ObjectivesContent>(code).await.unwrap().len(),
    s.section_history::<StructureContent>(code).await.unwrap().len(),
    s.section_history::<ElectivesContent>(code).await.unwrap().len(),
  ]
}

// ─── Saving ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn new_program_then_update_creates_two_versions() {
  let s = store().await;

  let first = s.save_document(doc("BTECH-CSE", true)).await.unwrap();
  assert_eq!(first.version, "1.0.0");
  assert_eq!(first.written, SectionKind::ALL.to_vec());

  let mut update = doc("BTECH-CSE", false);
  update.sections.objectives = Some(objectives("Revised overview"));
  let second = s.save_document(update).await.unwrap();
  assert_eq!(second.version, "1.0.1");
  assert_ne!(first.master.document_id, second.master.document_id);

  let recent = s.recent_versions("BTECH-CSE", 5).await.unwrap();
  assert_eq!(recent.len(), 2);
  assert_eq!(recent[0].pd_version, "1.0.1");
  assert_eq!(recent[1].pd_version, "1.0.0");

  assert_eq!(section_counts(&s, "BTECH-CSE").await, [2, 2, 2, 2]);

  let latest = s.latest_document("BTECH-CSE").await.unwrap().unwrap();
  assert_eq!(latest.master.pd_version, "1.0.1");
  assert_eq!(latest.objectives.content.program_overview, "Revised overview");
  assert_eq!(latest.objectives.version, "1.0.1");
}

#[tokio::test]
async fn update_increments_patch_of_latest() {
  let s = store().await;
  s.save_document(doc("MBA", true)).await.unwrap();
  s.save_document(doc("MBA", false)).await.unwrap();
  let third = s.save_document(doc("MBA", false)).await.unwrap();
  assert_eq!(third.version, "1.0.2");
}

#[tokio::test]
async fn update_without_history_falls_back_to_initial_version() {
  let s = store().await;
  let saved = s.save_document(doc("BSC-PHY", false)).await.unwrap();
  assert_eq!(saved.version, "1.0.0");
}

#[tokio::test]
async fn programs_are_versioned_independently() {
  let s = store().await;
  s.save_document(doc("BTECH-CSE", true)).await.unwrap();
  s.save_document(doc("BTECH-CSE", false)).await.unwrap();
  let other = s.save_document(doc("BTECH-ECE", false)).await.unwrap();
  assert_eq!(other.version, "1.0.0");
}

#[tokio::test]
async fn saved_master_defaults_to_draft_and_keeps_metadata() {
  let s = store().await;
  let saved = s.save_document(doc("BTECH-CSE", true)).await.unwrap();
  let m = &saved.master;
  assert_eq!(m.status, DocumentStatus::Draft);
  assert_eq!(m.scheme_year, "2024");
  assert_eq!(m.effective_academic_year.as_deref(), Some("2024-25"));
  assert_eq!(m.created_by, "creator-1");
  assert!(m.approved_by.is_none() && m.approval_date.is_none());
}

#[tokio::test]
async fn caller_supplied_version_is_ignored() {
  let s = store().await;
  let mut input = doc("BTECH-CSE", true);
  input.metadata.version_no = Some("7.7.7".into());
  let saved = s.save_document(input).await.unwrap();
  assert_eq!(saved.version, "1.0.0");
}

#[tokio::test]
async fn partial_update_reuses_unselected_sections() {
  let s = store().await;
  let first = s.save_document(doc("BTECH-CSE", true)).await.unwrap();

  let mut update = doc("BTECH-CSE", false);
  update.selection = SectionSelection::Only(vec![SectionKind::Structure]);
  update.sections.info = None;
  let second = s.save_document(update).await.unwrap();

  assert_eq!(second.version, "1.0.1");
  assert_eq!(second.written, vec![SectionKind::Structure]);
  assert_eq!(second.master.sections.info, first.master.sections.info);
  assert_eq!(second.master.sections.electives, first.master.sections.electives);
  assert_ne!(second.master.sections.structure, first.master.sections.structure);
  assert_eq!(section_counts(&s, "BTECH-CSE").await, [1, 1, 2, 1]);

  let resolved = s.get_document(second.master.document_id).await.unwrap().unwrap();
  assert_eq!(resolved.info.version, "1.0.0");
  assert_eq!(resolved.structure.version, "1.0.1");
}

#[tokio::test]
async fn invalid_payload_writes_nothing() {
  let s = store().await;
  let mut input = doc("BTECH-CSE", true);
  input.sections.structure = Some(StructureContent::default());

  let err = s.save_document(input).await.unwrap_err();
  assert_eq!(err.class(), ErrorClass::Invalid);
  assert!(s.recent_versions("BTECH-CSE", 5).await.unwrap().is_empty());
  assert_eq!(section_counts(&s, "BTECH-CSE").await, [0, 0, 0, 0]);
}

#[tokio::test]
async fn missing_scheme_year_is_rejected() {
  let s = store().await;
  let mut input = doc("BTECH-CSE", true);
  input.metadata.scheme_year = String::new();
  let err = s.save_document(input).await.unwrap_err();
  assert!(matches!(err, Error::Core(pdms_core::Error::Validation(_))));
}

// ─── Conflicts ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_new_program_conflicts_and_rolls_back() {
  let s = store().await;
  s.save_document(doc("BTECH-CSE", true)).await.unwrap();

  let err = s.save_document(doc("BTECH-CSE", true)).await.unwrap_err();
  assert_eq!(err.class(), ErrorClass::Conflict);
  assert!(matches!(
    err,
    Error::Core(
      pdms_core::Error::DuplicateSection { .. } | pdms_core::Error::DuplicateVersion { .. }
    )
  ));

  assert_eq!(s.recent_versions("BTECH-CSE", 5).await.unwrap().len(), 1);
  assert_eq!(section_counts(&s, "BTECH-CSE").await, [1, 1, 1, 1]);
}

#[tokio::test]
async fn concurrent_saves_yield_one_success_and_one_conflict() {
  let s = store().await;

  // Both callers publish the same program as brand-new at once.
  let (c, d) = tokio::join!(
    s.save_document(doc("MBA", true)),
    s.save_document(doc("MBA", true)),
  );
  let outcomes = [c, d];
  assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
  let conflict = outcomes.into_iter().find_map(Result::err).unwrap();
  assert_eq!(conflict.class(), ErrorClass::Conflict);
  assert_eq!(s.recent_versions("MBA", 5).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_updates_keep_creation_order_in_version_order() {
  let s = store().await;
  s.save_document(doc("BTECH-CSE", true)).await.unwrap();

  let handles: Vec<_> = (0..32)
    .map(|_| {
      let s = s.clone();
      tokio::spawn(async move { s.save_document(doc("BTECH-CSE", false)).await })
    })
    .collect();
  for handle in handles {
    handle.await.unwrap().unwrap();
  }

  // Every update was serialised behind the write lock, so the newest master
  // must also carry the highest version.
  let latest = s.latest_document("BTECH-CSE").await.unwrap().unwrap();
  assert_eq!(latest.master.pd_version, "1.0.32");
  let recent = s.recent_versions("BTECH-CSE", 5).await.unwrap();
  let versions: Vec<_> = recent.iter().map(|v| v.pd_version.as_str()).collect();
  assert_eq!(versions, ["1.0.32", "1.0.31", "1.0.30", "1.0.29", "1.0.28"]);

  let next = s.save_document(doc("BTECH-CSE", false)).await.unwrap();
  assert_eq!(next.version, "1.0.33");
}

#[tokio::test]
async fn update_after_future_dated_head_still_becomes_latest() {
  let s = store().await;
  s.save_document(doc("BTECH-CSE", true)).await.unwrap();

  // A head stamped ahead of the wall clock, as after the clock steps back.
  s.execute_raw(
    "INSERT INTO program_documents (
       document_id, program_code, scheme_year, pd_version,
       effective_academic_year, info_id, objectives_id, structure_id,
       electives_id, status, created_by, created_at
     )
     SELECT '6f1c2d3e-4b5a-4c6d-8e7f-101112131415', program_code, scheme_year,
            '1.0.5', effective_academic_year, info_id, objectives_id,
            structure_id, electives_id, status, created_by,
            '2999-01-01T00:00:00.000000Z'
     FROM program_documents WHERE pd_version = '1.0.0'",
  )
  .await
  .unwrap();

  let saved = s.save_document(doc("BTECH-CSE", false)).await.unwrap();
  assert_eq!(saved.version, "1.0.6");
  assert!(saved.master.created_at.to_rfc3339().starts_with("2999-01-01"));

  let latest = s.latest_document("BTECH-CSE").await.unwrap().unwrap();
  assert_eq!(latest.master.pd_version, "1.0.6");
  assert_eq!(latest.master.created_at, saved.master.created_at);
  assert_eq!(
    s.save_document(doc("BTECH-CSE", false)).await.unwrap().version,
    "1.0.7"
  );
}

#[tokio::test]
async fn stored_rows_cannot_be_modified_or_deleted() {
  let s = store().await;
  s.save_document(doc("BTECH-CSE", true)).await.unwrap();

  assert!(s.execute_raw("UPDATE program_documents SET status = 'Approved'").await.is_err());
  assert!(s.execute_raw("DELETE FROM program_documents").await.is_err());
  assert!(s.execute_raw("UPDATE section_info SET version = '9.9.9'").await.is_err());
  assert!(s.execute_raw("DELETE FROM section_electives").await.is_err());

  let latest = s.latest_document("BTECH-CSE").await.unwrap().unwrap();
  assert_eq!(latest.master.status, DocumentStatus::Draft);
}

// ─── Reading ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn recent_versions_is_limited_and_newest_first() {
  let s = store().await;
  s.save_document(doc("BTECH-CSE", true)).await.unwrap();
  for _ in 0..6 {
    s.save_document(doc("BTECH-CSE", false)).await.unwrap();
  }

  let recent = s.recent_versions("BTECH-CSE", 5).await.unwrap();
  let versions: Vec<_> = recent.iter().map(|v| v.pd_version.as_str()).collect();
  assert_eq!(versions, ["1.0.6", "1.0.5", "1.0.4", "1.0.3", "1.0.2"]);
  assert!(recent.windows(2).all(|w| w[0].created_at >= w[1].created_at));
}

#[tokio::test]
async fn recent_versions_for_unknown_program_is_empty() {
  let s = store().await;
  assert!(s.recent_versions("NOPE", 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn latest_document_missing_returns_none() {
  let s = store().await;
  assert!(s.latest_document("NOPE").await.unwrap().is_none());
}

#[tokio::test]
async fn get_document_resolves_all_sections() {
  let s = store().await;
  let saved = s.save_document(doc("BTECH-CSE", true)).await.unwrap();

  let d = s.get_document(saved.master.document_id).await.unwrap().unwrap();
  assert_eq!(d.master.pd_version, "1.0.0");
  assert_eq!(d.info.content.program_name, "B.Tech CSE");
  assert_eq!(d.info.content.mode_of_study, "Full Time");
  assert_eq!(d.structure.content.semesters[0].courses[0].kind, CourseType::TheoryLab);
  assert_eq!(d.electives.content.professional_electives[0].courses[0].code, "CS501");
  assert_eq!(d.objectives.section_id, saved.master.sections.objectives);
  assert!(!d.info.is_approved);
}

#[tokio::test]
async fn get_document_missing_returns_none() {
  let s = store().await;
  assert!(s.get_document(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn section_history_is_newest_first() {
  let s = store().await;
  s.save_document(doc("BTECH-CSE", true)).await.unwrap();
  let mut update = doc("BTECH-CSE", false);
  update.sections.info = Some(info("B.Tech Computer Science"));
  s.save_document(update).await.unwrap();

  let history = s.section_history::<InfoContent>("BTECH-CSE").await.unwrap();
  assert_eq!(history.len(), 2);
  assert_eq!(history[0].version, "1.0.1");
  assert_eq!(history[0].content.program_name, "B.Tech Computer Science");
  assert_eq!(history[1].version, "1.0.0");
}

// ─── Per-author views ────────────────────────────────────────────────────────

#[tokio::test]
async fn creator_history_lists_only_own_documents() {
  let s = store().await;
  s.save_document(doc("BTECH-CSE", true)).await.unwrap();
  s.save_document(doc("BTECH-CSE", false)).await.unwrap();
  let mut other = doc("MBA", true);
  other.created_by = "creator-2".into();
  s.save_document(other).await.unwrap();

  let history = s.creator_history("creator-1").await.unwrap();
  assert_eq!(history.len(), 2);
  assert_eq!(history[0].master.pd_version, "1.0.1");
  assert_eq!(history[0].program_name, "B.Tech CSE");
  assert_eq!(history[0].department, "Computer Science and Engineering");
}

#[tokio::test]
async fn creator_stats_counts_by_status() {
  let s = store().await;
  s.save_document(doc("BTECH-CSE", true)).await.unwrap();
  let mut review = doc("BTECH-CSE", false);
  review.metadata.status = Some(DocumentStatus::UnderReview);
  s.save_document(review).await.unwrap();
  let mut approved = doc("MBA", true);
  approved.metadata.status = Some(DocumentStatus::Approved);
  s.save_document(approved).await.unwrap();
  for _ in 0..4 {
    s.save_document(doc("MBA", false)).await.unwrap();
  }

  let dash = s.creator_stats("creator-1").await.unwrap();
  assert_eq!(dash.stats.total, 7);
  assert_eq!(dash.stats.drafts, 5);
  assert_eq!(dash.stats.under_review, 1);
  assert_eq!(dash.stats.approved, 1);
  assert_eq!(dash.recent_docs.len(), 5);
  assert_eq!(dash.recent_docs[0].master.program_code, "MBA");
}

#[tokio::test]
async fn creator_stats_for_unknown_author_is_zero() {
  let s = store().await;
  let dash = s.creator_stats("nobody").await.unwrap();
  assert_eq!(dash.stats.total, 0);
  assert!(dash.recent_docs.is_empty());
}

// ─── Accounts ────────────────────────────────────────────────────────────────

fn new_account(email: &str, role: Role) -> NewAccount {
  NewAccount {
    email: email.into(),
    password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
    name: "Dr. Faculty".into(),
    role,
    status: AccountStatus::Inactive,
    profile: AccountProfile {
      designation: Some("Assistant Professor".into()),
      ..Default::default()
    },
  }
}

#[tokio::test]
async fn create_and_find_account_by_email() {
  let s = store().await;
  let created = s
    .create_account(new_account(" Faculty@Example.EDU ", Role::Creator))
    .await
    .unwrap();
  assert_eq!(created.email, "faculty@example.edu");

  let creds = s.find_credentials("FACULTY@example.edu").await.unwrap().unwrap();
  assert_eq!(creds.account.account_id, created.account_id);
  assert!(creds.password_hash.starts_with("$argon2id$"));
  assert_eq!(
    creds.account.profile.designation.as_deref(),
    Some("Assistant Professor")
  );

  assert!(s.find_credentials("missing@example.edu").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_conflicts() {
  let s = store().await;
  s.create_account(new_account("a@example.edu", Role::Creator)).await.unwrap();
  let err = s
    .create_account(new_account("A@example.edu", Role::Admin))
    .await
    .unwrap_err();
  assert_eq!(err.class(), ErrorClass::Conflict);
}

#[tokio::test]
async fn list_accounts_filters_by_role() {
  let s = store().await;
  s.create_account(new_account("a@example.edu", Role::Creator)).await.unwrap();
  s.create_account(new_account("b@example.edu", Role::Admin)).await.unwrap();
  s.create_account(new_account("c@example.edu", Role::Creator)).await.unwrap();

  assert_eq!(s.list_accounts(None).await.unwrap().len(), 3);
  let creators = s.list_accounts(Some(Role::Creator)).await.unwrap();
  assert_eq!(creators.len(), 2);
  assert!(creators.iter().all(|a| a.role == Role::Creator));
}

#[tokio::test]
async fn update_account_blocks_and_activates() {
  let s = store().await;
  let a = s.create_account(new_account("a@example.edu", Role::Creator)).await.unwrap();

  let updated = s
    .update_account(a.account_id, AccountUpdate {
      status: Some(AccountStatus::Active),
      blocked: Some(true),
      blocked_reason: Some("pending verification".into()),
      blocked_by: Some("developer".into()),
    })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.status, AccountStatus::Active);
  assert!(updated.blocked);
  assert!(updated.blocked_at.is_some());

  let fetched = s.get_account(a.account_id).await.unwrap().unwrap();
  assert!(fetched.blocked);
  assert_eq!(fetched.blocked_reason.as_deref(), Some("pending verification"));
  assert_eq!(fetched.blocked_by.as_deref(), Some("developer"));

  let unblocked = s
    .update_account(a.account_id, AccountUpdate {
      blocked: Some(false),
      ..Default::default()
    })
    .await
    .unwrap()
    .unwrap();
  assert!(!unblocked.blocked && unblocked.blocked_at.is_none());
}

#[tokio::test]
async fn update_missing_account_returns_none() {
  let s = store().await;
  let result = s
    .update_account(Uuid::new_v4(), AccountUpdate::default())
    .await
    .unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn delete_account_reports_existence() {
  let s = store().await;
  let a = s.create_account(new_account("a@example.edu", Role::Creator)).await.unwrap();
  assert!(s.delete_account(a.account_id).await.unwrap());
  assert!(!s.delete_account(a.account_id).await.unwrap());
  assert!(s.get_account(a.account_id).await.unwrap().is_none());
}
