//! # pawtag-store
//!
//! Persistent storage for Pawtag, backed by SQLite.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for pets, user
//! profiles, auth sessions and finder location reports. Rows are decoded
//! into the tagged structs of `pawtag-shared` and validated on the way out;
//! malformed rows surface as errors instead of half-filled records.

pub mod database;
pub mod locations;
pub mod migrations;
pub mod pets;
pub mod profiles;
pub mod sessions;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use sessions::Session;
