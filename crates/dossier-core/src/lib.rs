//! Core types and trait definitions for the dossier document service.
//!
//! This crate is deliberately free of HTTP, filesystem and database
//! dependencies. Storage, persistence and transport crates depend on it.

// `LedgerStore` spells out `Send` on its futures; implementors use `async fn`.
#![allow(async_fn_in_trait)]

pub mod document;
pub mod error;
pub mod intake;
pub mod path;
pub mod store;
pub mod subject;

pub use error::{Result, ValidationError};
