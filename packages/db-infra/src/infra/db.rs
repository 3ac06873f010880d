use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use migration::{migrate, MigrationCommand, Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlxSqliteConnector};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{info, trace, warn};

use crate::config::db::{make_conn_spec, DbKind};
use crate::error::DbInfraError;

fn get_db_engine(db_kind: DbKind) -> &'static str {
    match db_kind {
        DbKind::Postgres => "postgresql",
        DbKind::SqliteFile | DbKind::SqliteMemory => "sqlite",
    }
}

async fn retry_connection<T, F, Fut>(
    mut connect_fn: F,
    max_attempts: u32,
    interval_ms: u64,
) -> Result<T, DbInfraError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbInfraError>>,
{
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match connect_fn().await {
            Ok(result) => {
                if attempt > 1 {
                    info!(attempts = attempt, interval_ms, "connection_retry=success");
                }
                return Ok(result);
            }
            Err(e) => {
                last_error = Some(e);
                if attempt < max_attempts {
                    warn!(attempt, max_attempts, interval_ms, "connection_retry=failed");
                    tokio::time::sleep(Duration::from_millis(interval_ms)).await;
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| DbInfraError::Connect {
        message: "no error recorded after max attempts".to_string(),
    }))
}

/// Mask the password in a connection string for logging.
pub fn sanitize_db_url(url: &str) -> String {
    let Some((auth_part, host_part)) = url.split_once('@') else {
        return url.to_string();
    };
    match auth_part.rfind(':') {
        Some(colon_pos) if colon_pos > auth_part.find("://").map_or(0, |p| p + 2) => {
            format!("{}:***@{}", &auth_part[..colon_pos], host_part)
        }
        _ => url.to_string(),
    }
}

async fn connect_sqlite(url: &str, max_connections: u32) -> Result<DatabaseConnection, DbInfraError> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(|e| DbInfraError::config(format!("invalid sqlite url: {e}")))?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    // An in-memory database lives exactly as long as its connection, so the pool
    // must never recycle it.
    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(max_connections)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(|e| DbInfraError::Connect {
            message: format!("failed to open sqlite database: {e}"),
        })?;

    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}

/// Open a connection pool for the given database kind.
pub async fn connect_db(db_kind: DbKind) -> Result<DatabaseConnection, DbInfraError> {
    let url = make_conn_spec(db_kind)?;
    info!(
        engine = get_db_engine(db_kind),
        url = %sanitize_db_url(&url),
        "connecting to database"
    );

    match db_kind {
        DbKind::Postgres => {
            let mut opt = ConnectOptions::new(url);
            opt.min_connections(1)
                .max_connections(16)
                .acquire_timeout(Duration::from_secs(5))
                .sqlx_logging(false);

            retry_connection(
                || {
                    let opt = opt.clone();
                    async move {
                        Database::connect(opt)
                            .await
                            .map_err(|e| DbInfraError::Connect {
                                message: format!("failed to connect to Postgres: {e}"),
                            })
                    }
                },
                5,
                500,
            )
            .await
        }
        DbKind::SqliteFile => connect_sqlite(&url, 4).await,
        DbKind::SqliteMemory => connect_sqlite(&url, 1).await,
    }
}

async fn schema_is_current(conn: &DatabaseConnection) -> Result<bool, DbInfraError> {
    let expected = Migrator::migrations().len();
    match Migrator::get_applied_migrations(conn).await {
        Ok(applied) => {
            trace!(applied = applied.len(), expected, "schema check");
            Ok(applied.len() == expected)
        }
        Err(DbErr::Exec(_)) => Ok(false),
        Err(e) => Err(DbInfraError::Migration {
            message: format!("failed to read applied migrations: {e}"),
        }),
    }
}

/// Connect and bring the schema up to date. Single entry point for the server and tests.
pub async fn bootstrap_db(db_kind: DbKind) -> Result<DatabaseConnection, DbInfraError> {
    let conn = connect_db(db_kind).await?;

    if schema_is_current(&conn).await? {
        info!("migrate=skipped up_to_date=true");
        return Ok(conn);
    }

    migrate(&conn, MigrationCommand::Up)
        .await
        .map_err(|e| DbInfraError::Migration {
            message: format!("migration execution failed: {e}"),
        })?;

    Ok(conn)
}

/// Run an explicit migration command (CLI entry point).
pub async fn orchestrate_migration(
    db_kind: DbKind,
    command: MigrationCommand,
) -> Result<(), DbInfraError> {
    if db_kind == DbKind::SqliteMemory {
        return Err(DbInfraError::config(
            "in-memory databases are discarded when the command exits; use postgres or sqlite-file",
        ));
    }

    let conn = connect_db(db_kind).await?;
    info!(engine = get_db_engine(db_kind), command = ?command, "migrate=start");

    migrate(&conn, command)
        .await
        .map_err(|e| DbInfraError::Migration {
            message: format!("migration execution failed: {e}"),
        })?;

    info!("migrate=done");
    Ok(())
}
