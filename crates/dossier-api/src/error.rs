//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure is rendered as
//! `{"success": false, "error": <discriminator>, "message": <text>}`.

use axum::{
  Json,
  extract::{multipart::MultipartRejection, rejection::JsonRejection},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use dossier_core::{ValidationError, store::StoreError};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error("{0}")]
  BadRequest(String),

  #[error("unauthorized")]
  Unauthorized,

  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  #[error("storage write failed: {0}")]
  StorageWrite(#[source] dossier_storage::Error),

  #[error("storage delete failed: {0}")]
  StorageDelete(#[source] dossier_storage::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a backend error from the generic ledger store. A taken email is a
  /// conflict; anything else is boxed.
  pub fn store<E: StoreError>(e: E) -> Self {
    if e.is_email_taken() {
      return ApiError::Conflict(e.to_string());
    }
    ApiError::Store(Box::new(e))
  }

  /// The stable discriminator carried in the `error` field.
  pub fn discriminator(&self) -> &'static str {
    match self {
      ApiError::Validation(_) | ApiError::BadRequest(_) => "validation",
      ApiError::Unauthorized => "unauthorized",
      ApiError::Forbidden(_) => "forbidden",
      ApiError::NotFound(_) => "not_found",
      ApiError::Conflict(_) => "conflict",
      ApiError::StorageWrite(_) => "storage_write",
      ApiError::StorageDelete(_) => "storage_delete",
      ApiError::Store(_) => "store",
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::StorageWrite(_) | ApiError::StorageDelete(_) | ApiError::Store(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

/// Storage failures outside an explicit deletion are placement failures.
impl From<dossier_storage::Error> for ApiError {
  fn from(e: dossier_storage::Error) -> Self {
    match e {
      dossier_storage::Error::InvalidPath(v) => ApiError::Validation(v),
      e @ dossier_storage::Error::Delete { .. } => ApiError::StorageDelete(e),
      e => ApiError::StorageWrite(e),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl From<MultipartRejection> for ApiError {
  fn from(rejection: MultipartRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, kind = self.discriminator(), "request failed");
    }

    let body = Json(json!({
      "success": false,
      "error":   self.discriminator(),
      "message": self.to_string(),
    }));
    let mut res = (status, body).into_response();

    if matches!(self, ApiError::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"dossier\""),
      );
    }
    res
  }
}
