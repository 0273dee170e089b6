//! HTTP Basic-auth extractor resolving the calling subject.
//!
//! Credentials are `email:password`; the password is checked against the
//! argon2 PHC string the ledger store holds for that email.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use dossier_core::store::LedgerStore;
use rand_core::OsRng;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// The authenticated caller. Its id is the only identity used for storage
/// scoping.
#[derive(Debug, Clone, Copy)]
pub struct AuthSubject {
  pub subject_id: Uuid,
}

/// Canonical form under which emails are stored and looked up.
pub fn normalize_email(raw: &str) -> String { raw.trim().to_lowercase() }

/// Hash a secret into an argon2 PHC string.
pub fn hash_secret(secret: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(secret.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::Store(format!("argon2: {e}").into()))
}

/// Check `secret` against a PHC string.
pub fn verify_secret(secret: &str, phc: &str) -> Result<(), ApiError> {
  let parsed = PasswordHash::new(phc).map_err(|_| ApiError::Unauthorized)?;
  Argon2::default()
    .verify_password(secret.as_bytes(), &parsed)
    .map_err(|_| ApiError::Unauthorized)
}

/// Pull `(email, password)` out of an `Authorization: Basic` header.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let encoded = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Basic "))
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded.trim()).map_err(|_| ApiError::Unauthorized)?;
  let creds   = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;

  let (email, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok((email.to_owned(), password.to_owned()))
}

impl<S> FromRequestParts<AppState<S>> for AuthSubject
where
  S: LedgerStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let (email, password) = basic_credentials(&parts.headers)?;
    let email = normalize_email(&email);

    let creds = state
      .store
      .find_credentials(&email)
      .await
      .map_err(ApiError::store)?
      .ok_or(ApiError::Unauthorized)?;

    verify_secret(&password, &creds.password_hash)?;
    Ok(AuthSubject { subject_id: creds.subject_id })
  }
}
