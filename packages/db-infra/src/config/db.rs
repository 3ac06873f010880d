use std::env;
use std::str::FromStr;

use crate::error::DbInfraError;

/// Storage engine backing the duel store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    Postgres,
    SqliteFile,
    /// Single pinned connection; contents vanish with the process.
    SqliteMemory,
}

impl FromStr for DbKind {
    type Err = DbInfraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "sqlite-file" | "sqlite_file" | "sqlite" => Ok(Self::SqliteFile),
            "sqlite-memory" | "sqlite_memory" | "memory" => Ok(Self::SqliteMemory),
            other => Err(DbInfraError::config(format!("unknown database kind '{other}'"))),
        }
    }
}

/// Build the connection string for the given database kind from the environment.
///
/// Postgres reads `POSTGRES_HOST` (default `localhost`), `POSTGRES_PORT` (default `5432`),
/// `DUEL_DB`, `DUEL_DB_USER` and `DUEL_DB_PASSWORD`. SQLite files live at
/// `DUEL_SQLITE_PATH` (default `./duels.sqlite`).
pub fn make_conn_spec(db_kind: DbKind) -> Result<String, DbInfraError> {
    match db_kind {
        DbKind::Postgres => {
            let host = env::var("POSTGRES_HOST").unwrap_or_else(|_| "localhost".to_string());
            let port = env::var("POSTGRES_PORT").unwrap_or_else(|_| "5432".to_string());
            let db_name = must_var("DUEL_DB")?;
            let username = must_var("DUEL_DB_USER")?;
            let password = must_var("DUEL_DB_PASSWORD")?;
            Ok(format!(
                "postgresql://{username}:{password}@{host}:{port}/{db_name}"
            ))
        }
        DbKind::SqliteFile => {
            let path =
                env::var("DUEL_SQLITE_PATH").unwrap_or_else(|_| "./duels.sqlite".to_string());
            Ok(format!("sqlite://{path}?mode=rwc"))
        }
        DbKind::SqliteMemory => Ok("sqlite::memory:".to_string()),
    }
}

fn must_var(name: &str) -> Result<String, DbInfraError> {
    env::var(name).map_err(|_| {
        DbInfraError::config(format!("Required environment variable '{name}' is not set"))
    })
}
