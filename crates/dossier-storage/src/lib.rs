//! On-disk storage layout for submitted documents.
//!
//! ```text
//! <root>/
//!   profile-images/
//!     <uuid>.<ext>            # shared, generated names
//!   <subject-id>/
//!     <relative path>         # as submitted, folder structure mirrored
//!     <folder>/.emptyfolder   # intentionally empty folder submission
//! ```
//!
//! All I/O goes through tokio's filesystem API. Paths handed to this crate
//! are [`StoredPath`](dossier_core::path::StoredPath)s, which cannot escape
//! the root.

mod layout;

pub mod error;

pub use error::{Error, Result};
pub use layout::{Placement, StorageLayout, StorageRoot};
