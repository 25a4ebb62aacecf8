//! SQL schema for the SQLite document store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Section tables are strictly append-only; the triggers below reject any
-- UPDATE or DELETE. One table per section variant.
CREATE TABLE IF NOT EXISTS section_info (
    section_id   TEXT PRIMARY KEY,
    program_id   TEXT NOT NULL,
    version      TEXT NOT NULL,
    content_json TEXT NOT NULL,
    created_by   TEXT NOT NULL,
    approved_by  TEXT,
    is_approved  INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL,      -- RFC 3339 UTC, fixed microsecond width
    UNIQUE (program_id, version)
);

CREATE TABLE IF NOT EXISTS section_objectives (
    section_id   TEXT PRIMARY KEY,
    program_id   TEXT NOT NULL,
    version      TEXT NOT NULL,
    content_json TEXT NOT NULL,
    created_by   TEXT NOT NULL,
    approved_by  TEXT,
    is_approved  INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL,
    UNIQUE (program_id, version)
);

CREATE TABLE IF NOT EXISTS section_structure (
    section_id   TEXT PRIMARY KEY,
    program_id   TEXT NOT NULL,
    version      TEXT NOT NULL,
    content_json TEXT NOT NULL,
    created_by   TEXT NOT NULL,
    approved_by  TEXT,
    is_approved  INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL,
    UNIQUE (program_id, version)
);

CREATE TABLE IF NOT EXISTS section_electives (
    section_id   TEXT PRIMARY KEY,
    program_id   TEXT NOT NULL,
    version      TEXT NOT NULL,
    content_json TEXT NOT NULL,
    created_by   TEXT NOT NULL,
    approved_by  TEXT,
    is_approved  INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL,
    UNIQUE (program_id, version)
);

-- Master records: one row per save, never modified.
CREATE TABLE IF NOT EXISTS program_documents (
    document_id             TEXT PRIMARY KEY,
    program_code            TEXT NOT NULL,
    scheme_year             TEXT NOT NULL,
    pd_version              TEXT NOT NULL,
    effective_academic_year TEXT,
    info_id                 TEXT NOT NULL REFERENCES section_info(section_id),
    objectives_id           TEXT NOT NULL REFERENCES section_objectives(section_id),
    structure_id            TEXT NOT NULL REFERENCES section_structure(section_id),
    electives_id            TEXT NOT NULL REFERENCES section_electives(section_id),
    status                  TEXT NOT NULL DEFAULT 'Draft',
    created_by              TEXT NOT NULL,
    approved_by             TEXT,
    approval_date           TEXT,
    created_at              TEXT NOT NULL,
    UNIQUE (program_code, scheme_year, pd_version)
);

CREATE INDEX IF NOT EXISTS program_documents_code_idx
    ON program_documents(program_code, created_at);
CREATE INDEX IF NOT EXISTS program_documents_creator_idx
    ON program_documents(created_by, created_at);

CREATE TRIGGER IF NOT EXISTS section_info_no_update
    BEFORE UPDATE ON section_info
    BEGIN SELECT RAISE(ABORT, 'section versions are immutable'); END;
CREATE TRIGGER IF NOT EXISTS section_info_no_delete
    BEFORE DELETE ON section_info
    BEGIN SELECT RAISE(ABORT, 'section versions are immutable'); END;
CREATE TRIGGER IF NOT EXISTS section_objectives_no_update
    BEFORE UPDATE ON section_objectives
    BEGIN SELECT RAISE(ABORT, 'section versions are immutable'); END;
CREATE TRIGGER IF NOT EXISTS section_objectives_no_delete
    BEFORE DELETE ON section_objectives
    BEGIN SELECT RAISE(ABORT, 'section versions are immutable'); END;
CREATE TRIGGER IF NOT EXISTS section_structure_no_update
    BEFORE UPDATE ON section_structure
    BEGIN SELECT RAISE(ABORT, 'section versions are immutable'); END;
CREATE TRIGGER IF NOT EXISTS section_structure_no_delete
    BEFORE DELETE ON section_structure
    BEGIN SELECT RAISE(ABORT, 'section versions are immutable'); END;
CREATE TRIGGER IF NOT EXISTS section_electives_no_update
    BEFORE UPDATE ON section_electives
    BEGIN SELECT RAISE(ABORT, 'section versions are immutable'); END;
CREATE TRIGGER IF NOT EXISTS section_electives_no_delete
    BEFORE DELETE ON section_electives
    BEGIN SELECT RAISE(ABORT, 'section versions are immutable'); END;
CREATE TRIGGER IF NOT EXISTS program_documents_no_update
    BEFORE UPDATE ON program_documents
    BEGIN SELECT RAISE(ABORT, 'program documents are immutable'); END;
CREATE TRIGGER IF NOT EXISTS program_documents_no_delete
    BEFORE DELETE ON program_documents
    BEGIN SELECT RAISE(ABORT, 'program documents are immutable'); END;

-- Admin and creator accounts. Mutable.
CREATE TABLE IF NOT EXISTS accounts (
    account_id     TEXT PRIMARY KEY,
    email          TEXT NOT NULL UNIQUE,  -- trimmed, lowercased
    password_hash  TEXT NOT NULL,         -- argon2 PHC string
    name           TEXT NOT NULL,
    role           TEXT NOT NULL,         -- 'admin' | 'creator'
    status         TEXT NOT NULL DEFAULT 'inactive',
    blocked        INTEGER NOT NULL DEFAULT 0,
    blocked_reason TEXT,
    blocked_at     TEXT,
    blocked_by     TEXT,
    profile_json   TEXT NOT NULL DEFAULT '{}',
    created_at     TEXT NOT NULL,
    last_updated   TEXT NOT NULL
);

PRAGMA user_version = 1;
";
