use std::future::Future;
use std::pin::Pin;

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::debug;

use crate::errors::domain::DomainError;
use crate::infra::db_errors::map_db_err;

/// Boxed future borrowing the transaction for its whole lifetime.
pub type TxnFuture<'c, R> = Pin<Box<dyn Future<Output = Result<R, DomainError>> + Send + 'c>>;

/// Execute `f` inside a transaction: commit on `Ok`, roll back on `Err`.
pub async fn with_txn<R, F>(db: &DatabaseConnection, f: F) -> Result<R, DomainError>
where
    R: Send,
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> TxnFuture<'c, R> + Send,
{
    let txn = db.begin().await.map_err(map_db_err)?;

    match f(&txn).await {
        Ok(val) => {
            txn.commit().await.map_err(map_db_err)?;
            Ok(val)
        }
        Err(err) => {
            // Best-effort rollback; the original error wins.
            if let Err(rollback_err) = txn.rollback().await {
                debug!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}

/// Re-run `attempt` while it fails with an optimistic-lock conflict.
///
/// Each attempt must open its own transaction so it re-reads fresh state.
pub async fn retry_on_lock<R, F, Fut>(max_retries: u32, mut attempt: F) -> Result<R, DomainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<R, DomainError>>,
{
    let mut retries = 0;
    loop {
        match attempt().await {
            Err(err) if err.is_optimistic_lock() && retries < max_retries => {
                retries += 1;
                debug!(retries, "optimistic lock conflict, retrying");
            }
            other => return other,
        }
    }
}
