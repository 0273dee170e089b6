//! SQL schema for the dossier SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS subjects (
    subject_id      TEXT PRIMARY KEY,
    created_at      TEXT NOT NULL,
    full_names      TEXT NOT NULL,
    family_name     TEXT NOT NULL,
    email           TEXT NOT NULL UNIQUE,
    password_hash   TEXT NOT NULL,   -- argon2 PHC string
    gfg_number_hash TEXT NOT NULL,   -- argon2 PHC string; never read back
    profile_image   TEXT             -- stored path or NULL
);

-- Exactly one row per subject, created with the subject.
CREATE TABLE IF NOT EXISTS document_requirements (
    subject_id            TEXT PRIMARY KEY REFERENCES subjects(subject_id),
    political_declaration TEXT,
    id_document           TEXT,     -- 'DriverLicense' | 'Passport' | 'NationalID'
    id_document_file      TEXT,
    folder_name           TEXT,     -- NULL when no folder upload is recorded
    folder_uploaded_at    TEXT,
    folder_is_empty       INTEGER NOT NULL DEFAULT 0
);

-- Ordered sequences; `position` is the append order.
CREATE TABLE IF NOT EXISTS witness_testimonies (
    subject_id TEXT    NOT NULL REFERENCES subjects(subject_id),
    position   INTEGER NOT NULL,
    path       TEXT    NOT NULL,
    PRIMARY KEY (subject_id, position)
);

CREATE TABLE IF NOT EXISTS folder_files (
    subject_id TEXT    NOT NULL REFERENCES subjects(subject_id),
    position   INTEGER NOT NULL,
    path       TEXT    NOT NULL,
    PRIMARY KEY (subject_id, position)
);

CREATE INDEX IF NOT EXISTS subjects_created_idx ON subjects(created_at);

PRAGMA user_version = 1;
";
