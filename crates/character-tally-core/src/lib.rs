//! # Character Tally Core
//!
//! Runtime-agnostic logic for Character Tally: data models, the error
//! taxonomy, the per-source count cache, random id selection, the
//! [`store::TallyStore`] abstraction and an in-memory implementation.
//!
//! This crate contains no tokio, sqlx, or HTTP client dependencies. Those
//! live in the `character-tally` crate, which wires the core into adapters,
//! SQLite storage, an HTTP server and a CLI.

pub mod cache;
pub mod error;
pub mod models;
pub mod random;
pub mod store;

pub use error::TallyError;
pub use models::{Character, Source, Vote};
