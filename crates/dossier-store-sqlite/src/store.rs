//! [`SqliteStore`], the SQLite implementation of [`LedgerStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use dossier_core::{
  document::{DocumentRequirements, FolderUpload, IdDocumentKind, Slot},
  path::StoredPath,
  store::LedgerStore,
  subject::{Credentials, NewSubject, Subject, SubjectUpdate},
};

use crate::{
  encode::{decode_stored_path, decode_uuid, encode_dt, encode_id_kind, encode_uuid, RawSubject},
  schema::SCHEMA,
  Error, Result,
};

// ─── Row loading (runs on the connection thread) ─────────────────────────────

const SELECT_SUBJECT: &str = "
  SELECT s.subject_id, s.created_at, s.full_names, s.family_name, s.email,
         s.profile_image,
         d.political_declaration, d.id_document, d.id_document_file,
         d.folder_name, d.folder_uploaded_at, d.folder_is_empty
  FROM subjects s
  JOIN document_requirements d ON d.subject_id = s.subject_id
  WHERE s.subject_id = ?1";

const SELECT_WITNESS_PATHS: &str =
  "SELECT path FROM witness_testimonies WHERE subject_id = ?1 ORDER BY position";

const SELECT_FOLDER_PATHS: &str =
  "SELECT path FROM folder_files WHERE subject_id = ?1 ORDER BY position";

fn load_paths(
  conn:  &rusqlite::Connection,
  sql:   &str,
  id:    &str,
) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare_cached(sql)?;
  stmt
    .query_map(rusqlite::params![id], |row| row.get(0))?
    .collect()
}

fn load_subject(
  conn: &rusqlite::Connection,
  id:   &str,
) -> rusqlite::Result<Option<RawSubject>> {
  let raw = conn
    .query_row(SELECT_SUBJECT, rusqlite::params![id], |row| {
      Ok(RawSubject {
        subject_id:            row.get(0)?,
        created_at:            row.get(1)?,
        full_names:            row.get(2)?,
        family_name:           row.get(3)?,
        email:                 row.get(4)?,
        profile_image:         row.get(5)?,
        political_declaration: row.get(6)?,
        id_document:           row.get(7)?,
        id_document_file:      row.get(8)?,
        folder_name:           row.get(9)?,
        folder_uploaded_at:    row.get(10)?,
        folder_is_empty:       row.get(11)?,
        witness_testimonies:   Vec::new(),
        folder_files:          Vec::new(),
      })
    })
    .optional()?;

  let Some(mut raw) = raw else { return Ok(None) };
  raw.witness_testimonies = load_paths(conn, SELECT_WITNESS_PATHS, id)?;
  raw.folder_files        = load_paths(conn, SELECT_FOLDER_PATHS, id)?;
  Ok(Some(raw))
}

fn ledger_exists(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM document_requirements WHERE subject_id = ?1",
        rusqlite::params![id],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

fn insert_paths(
  conn:  &rusqlite::Connection,
  table: PathTable,
  id:    &str,
  start: i64,
  paths: &[String],
) -> rusqlite::Result<()> {
  let sql = match table {
    PathTable::Witness => {
      "INSERT INTO witness_testimonies (subject_id, position, path) VALUES (?1, ?2, ?3)"
    }
    PathTable::Folder => {
      "INSERT INTO folder_files (subject_id, position, path) VALUES (?1, ?2, ?3)"
    }
  };
  let mut stmt = conn.prepare_cached(sql)?;
  for (offset, path) in (0_i64..).zip(paths) {
    stmt.execute(rusqlite::params![id, start + offset, path])?;
  }
  Ok(())
}

/// Why a subject update wrote nothing.
enum UpdateRefused {
  EmailTaken,
  NotFound,
}

#[derive(Clone, Copy)]
enum PathTable {
  Witness,
  Folder,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A dossier ledger backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
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

  /// Open an in-memory store for tests.
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
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a single-statement update against the subject's document row.
  async fn update_documents(
    &self,
    id:     Uuid,
    sql:    &'static str,
    values: Vec<Option<String>>,
  ) -> Result<()> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        let mut params: Vec<&dyn rusqlite::ToSql> = vec![&id_str];
        params.extend(values.iter().map(|v| v as &dyn rusqlite::ToSql));
        Ok(conn.execute(sql, params.as_slice())?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::SubjectNotFound(id));
    }
    Ok(())
  }
}

// ─── LedgerStore impl ────────────────────────────────────────────────────────

impl LedgerStore for SqliteStore {
  type Error = Error;

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn add_subject(&self, input: NewSubject) -> Result<Subject> {
    let subject = Subject {
      subject_id:    Uuid::new_v4(),
      created_at:    Utc::now(),
      full_names:    input.full_names,
      family_name:   input.family_name,
      email:         input.email,
      profile_image: None,
      documents:     DocumentRequirements::default(),
    };

    let id_str      = encode_uuid(subject.subject_id);
    let at_str      = encode_dt(subject.created_at);
    let full_names  = subject.full_names.clone();
    let family_name = subject.family_name.clone();
    let email       = subject.email.clone();
    let pw_hash     = input.password_hash;
    let gfg_hash    = input.gfg_number_hash;

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let taken = tx
          .query_row(
            "SELECT 1 FROM subjects WHERE email = ?1",
            rusqlite::params![email],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if taken {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO subjects (
             subject_id, created_at, full_names, family_name, email,
             password_hash, gfg_number_hash
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, at_str, full_names, family_name, email, pw_hash, gfg_hash],
        )?;
        tx.execute(
          "INSERT INTO document_requirements (subject_id) VALUES (?1)",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::EmailTaken(subject.email));
    }
    Ok(subject)
  }

  async fn get_subject(&self, id: Uuid) -> Result<Option<Subject>> {
    let id_str = encode_uuid(id);

    let raw = self
      .conn
      .call(move |conn| Ok(load_subject(conn, &id_str)?))
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  async fn list_subjects(&self) -> Result<Vec<Subject>> {
    let raws: Vec<RawSubject> = self
      .conn
      .call(|conn| {
        let ids: Vec<String> = {
          let mut stmt =
            conn.prepare("SELECT subject_id FROM subjects ORDER BY created_at, rowid")?;
          stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?
        };
        let mut raws = Vec::with_capacity(ids.len());
        for id in &ids {
          if let Some(raw) = load_subject(conn, id)? {
            raws.push(raw);
          }
        }
        Ok(raws)
      })
      .await?;

    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>> {
    let email = email.to_owned();

    let row: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT subject_id, password_hash FROM subjects WHERE email = ?1",
              rusqlite::params![email],
              |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;

    row
      .map(|(id, password_hash)| {
        Ok(Credentials { subject_id: decode_uuid(&id)?, password_hash })
      })
      .transpose()
  }

  async fn update_subject(&self, id: Uuid, update: SubjectUpdate) -> Result<Subject> {
    let id_str = encode_uuid(id);
    let email  = update.email.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(email) = &update.email {
          let taken = tx
            .query_row(
              "SELECT 1 FROM subjects WHERE email = ?1 AND subject_id <> ?2",
              rusqlite::params![email, id_str],
              |_| Ok(()),
            )
            .optional()?
            .is_some();
          if taken {
            return Ok(Err(UpdateRefused::EmailTaken));
          }
        }
        let changed = tx.execute(
          "UPDATE subjects SET
             full_names  = COALESCE(?2, full_names),
             family_name = COALESCE(?3, family_name),
             email       = COALESCE(?4, email)
           WHERE subject_id = ?1",
          rusqlite::params![id_str, update.full_names, update.family_name, update.email],
        )?;
        if changed == 0 {
          return Ok(Err(UpdateRefused::NotFound));
        }
        let raw = load_subject(&tx, &id_str)?;
        tx.commit()?;
        Ok(raw.ok_or(UpdateRefused::NotFound))
      })
      .await?;

    match outcome {
      Ok(raw) => raw.into_subject(),
      Err(UpdateRefused::EmailTaken) => Err(Error::EmailTaken(email.unwrap_or_default())),
      Err(UpdateRefused::NotFound) => Err(Error::SubjectNotFound(id)),
    }
  }

  async fn set_password_hash(&self, id: Uuid, password_hash: String) -> Result<()> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE subjects SET password_hash = ?2 WHERE subject_id = ?1",
          rusqlite::params![id_str, password_hash],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::SubjectNotFound(id));
    }
    Ok(())
  }

  async fn set_profile_image(&self, id: Uuid, path: StoredPath) -> Result<Option<StoredPath>> {
    let id_str   = encode_uuid(id);
    let path_str = path.as_str().to_owned();

    let previous: Option<Option<String>> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let previous: Option<Option<String>> = tx
          .query_row(
            "SELECT profile_image FROM subjects WHERE subject_id = ?1",
            rusqlite::params![id_str],
            |row| row.get(0),
          )
          .optional()?;
        if previous.is_some() {
          tx.execute(
            "UPDATE subjects SET profile_image = ?2 WHERE subject_id = ?1",
            rusqlite::params![id_str, path_str],
          )?;
        }
        tx.commit()?;
        Ok(previous)
      })
      .await?;

    match previous {
      None => Err(Error::SubjectNotFound(id)),
      Some(prev) => prev.as_deref().map(decode_stored_path).transpose(),
    }
  }

  // ── Document slots ────────────────────────────────────────────────────────

  async fn record_political_declaration(&self, id: Uuid, path: StoredPath) -> Result<()> {
    self
      .update_documents(
        id,
        "UPDATE document_requirements SET political_declaration = ?2 WHERE subject_id = ?1",
        vec![Some(path.as_str().to_owned())],
      )
      .await
  }

  async fn append_witness_testimonies(&self, id: Uuid, paths: Vec<StoredPath>) -> Result<()> {
    let id_str = encode_uuid(id);
    let paths: Vec<String> = paths.iter().map(|p| p.as_str().to_owned()).collect();

    let found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !ledger_exists(&tx, &id_str)? {
          return Ok(false);
        }
        let next: i64 = tx.query_row(
          "SELECT COALESCE(MAX(position) + 1, 0) FROM witness_testimonies WHERE subject_id = ?1",
          rusqlite::params![id_str],
          |row| row.get(0),
        )?;
        insert_paths(&tx, PathTable::Witness, &id_str, next, &paths)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !found {
      return Err(Error::SubjectNotFound(id));
    }
    Ok(())
  }

  async fn record_id_document(
    &self,
    id:   Uuid,
    kind: Option<IdDocumentKind>,
    path: StoredPath,
  ) -> Result<()> {
    self
      .update_documents(
        id,
        "UPDATE document_requirements SET id_document = ?2, id_document_file = ?3
         WHERE subject_id = ?1",
        vec![kind.map(encode_id_kind), Some(path.as_str().to_owned())],
      )
      .await
  }

  async fn record_folder_upload(&self, id: Uuid, upload: FolderUpload) -> Result<()> {
    let id_str    = encode_uuid(id);
    let name      = upload.folder_name.as_str().to_owned();
    let at_str    = encode_dt(upload.uploaded_at);
    let is_empty  = upload.is_empty_folder;
    let paths: Vec<String> = upload.files.iter().map(|p| p.as_str().to_owned()).collect();

    let found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE document_requirements
           SET folder_name = ?2, folder_uploaded_at = ?3, folder_is_empty = ?4
           WHERE subject_id = ?1",
          rusqlite::params![id_str, name, at_str, is_empty],
        )?;
        if changed == 0 {
          return Ok(false);
        }
        tx.execute(
          "DELETE FROM folder_files WHERE subject_id = ?1",
          rusqlite::params![id_str],
        )?;
        insert_paths(&tx, PathTable::Folder, &id_str, 0, &paths)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !found {
      return Err(Error::SubjectNotFound(id));
    }
    Ok(())
  }

  async fn clear_slot(&self, id: Uuid, slot: Slot) -> Result<()> {
    let id_str = encode_uuid(id);

    let found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !ledger_exists(&tx, &id_str)? {
          return Ok(false);
        }
        match slot {
          Slot::PoliticalDeclaration => {
            tx.execute(
              "UPDATE document_requirements SET political_declaration = NULL
               WHERE subject_id = ?1",
              rusqlite::params![id_str],
            )?;
          }
          Slot::WitnessTestimonies => {
            tx.execute(
              "DELETE FROM witness_testimonies WHERE subject_id = ?1",
              rusqlite::params![id_str],
            )?;
          }
          Slot::IdDocument => {
            tx.execute(
              "UPDATE document_requirements SET id_document = NULL, id_document_file = NULL
               WHERE subject_id = ?1",
              rusqlite::params![id_str],
            )?;
          }
          Slot::FolderUpload => {
            tx.execute(
              "UPDATE document_requirements
               SET folder_name = NULL, folder_uploaded_at = NULL, folder_is_empty = 0
               WHERE subject_id = ?1",
              rusqlite::params![id_str],
            )?;
            tx.execute(
              "DELETE FROM folder_files WHERE subject_id = ?1",
              rusqlite::params![id_str],
            )?;
          }
        }
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !found {
      return Err(Error::SubjectNotFound(id));
    }
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn documents(&self, id: Uuid) -> Result<Option<DocumentRequirements>> {
    Ok(self.get_subject(id).await?.map(|s| s.documents))
  }

  async fn is_complete(&self, id: Uuid) -> Result<bool> {
    self
      .documents(id)
      .await?
      .map(|docs| docs.is_complete())
      .ok_or(Error::SubjectNotFound(id))
  }
}
