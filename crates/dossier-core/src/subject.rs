//! Subject: a registered person who submits documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{document::DocumentRequirements, path::StoredPath};

/// A registered subject and their document ledger.
///
/// Credential hashes are deliberately absent; they are only reachable through
/// [`LedgerStore::find_credentials`](crate::store::LedgerStore::find_credentials).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
  pub subject_id:    Uuid,
  pub created_at:    DateTime<Utc>,
  pub full_names:    String,
  pub family_name:   String,
  pub email:         String,
  pub profile_image: Option<StoredPath>,
  pub documents:     DocumentRequirements,
}

/// Input for [`LedgerStore::add_subject`](crate::store::LedgerStore::add_subject).
///
/// Both secrets arrive already hashed (argon2 PHC strings).
#[derive(Debug, Clone)]
pub struct NewSubject {
  pub full_names:      String,
  pub family_name:     String,
  pub email:           String,
  pub password_hash:   String,
  pub gfg_number_hash: String,
}

/// Input for [`LedgerStore::update_subject`](crate::store::LedgerStore::update_subject).
///
/// `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct SubjectUpdate {
  pub full_names:  Option<String>,
  pub family_name: Option<String>,
  pub email:       Option<String>,
}

/// What the authentication layer needs to verify a login.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub subject_id:    Uuid,
  pub password_hash: String,
}
