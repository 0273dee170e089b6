//! Runtime configuration, deserialised from `config.toml` and `DOSSIER_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use dossier_api::ApiConfig;
use dossier_core::intake::{PROFILE_IMAGE_MAX_BYTES, SUBMISSION_MAX_BYTES, UploadLimits};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                    String,
  pub port:                    u16,
  /// Public origin used to build file URLs.
  pub base_url:                String,
  /// SQLite ledger file.
  pub store_path:              PathBuf,
  /// Directory holding `profile-images/` and one directory per subject.
  pub storage_root:            PathBuf,
  pub max_profile_image_bytes: u64,
  pub max_submission_bytes:    u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                    "127.0.0.1".to_string(),
      port:                    5000,
      base_url:                "http://localhost:5000".to_string(),
      store_path:              PathBuf::from("dossier.sqlite3"),
      storage_root:            PathBuf::from("uploads"),
      max_profile_image_bytes: PROFILE_IMAGE_MAX_BYTES,
      max_submission_bytes:    SUBMISSION_MAX_BYTES,
    }
  }
}

impl ServerConfig {
  /// Layer the environment over the (optional) file at `path`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("DOSSIER"))
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn limits(&self) -> UploadLimits {
    UploadLimits {
      profile_image_bytes: self.max_profile_image_bytes,
      submission_bytes:    self.max_submission_bytes,
    }
  }

  pub fn api_config(&self) -> ApiConfig {
    ApiConfig {
      base_url: self.base_url.trim_end_matches('/').to_owned(),
      limits:   self.limits(),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
