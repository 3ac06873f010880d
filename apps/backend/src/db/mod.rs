pub mod txn;

pub use txn::{retry_on_lock, with_txn, TxnFuture};
