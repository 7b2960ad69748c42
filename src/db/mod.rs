//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and conversions
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: credential store backed by a sqlx pool

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{DbOAuthCredential, DbOAuthRequest};
pub use schema::SQLITE_INIT;
pub use sqlite::{CredentialsStorage, SqlitePool, connect};
