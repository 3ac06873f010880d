//! Shared database configuration and migration infrastructure.
//! Used by the backend and the migration CLI.

pub mod config;
pub mod error;
pub mod infra;

pub use config::db::{make_conn_spec, DbKind};
pub use error::DbInfraError;
pub use infra::db::{bootstrap_db, connect_db, orchestrate_migration, sanitize_db_url};
