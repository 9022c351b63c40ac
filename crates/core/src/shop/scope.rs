//! Explicit transaction scope.
//!
//! A scope owns one storage transaction for the length of one coordinator
//! operation:
//!
//! ```text
//! let mut scope = TransactionScope::begin(&store, "purchase").await?;
//! let result = do_work(scope.tx()).await;
//! scope.finish(result).await
//! ```
//!
//! `finish` commits on `Ok` and rolls back on `Err`. A scope dropped before
//! `finish` (a cancelled request, a panic) drops its transaction, and every
//! [`ShopTransaction`] discards uncommitted writes on drop.

use tracing::{debug, error};

use super::error::ShopError;
use super::ports::{ShopStore, ShopTransaction};

/// One storage transaction bound to a named operation.
#[derive(Debug)]
pub struct TransactionScope<T> {
    tx: T,
    operation: &'static str,
}

impl<T: ShopTransaction> TransactionScope<T> {
    /// Opens a transaction on `store`.
    pub async fn begin<S>(store: &S, operation: &'static str) -> Result<Self, ShopError>
    where
        S: ShopStore<Tx = T>,
    {
        let tx = store.begin().await?;
        debug!(operation, "transaction started");
        Ok(Self { tx, operation })
    }

    /// The underlying transaction.
    pub const fn tx(&mut self) -> &mut T {
        &mut self.tx
    }

    /// Ends the scope: commits if `result` is `Ok`, rolls back otherwise.
    ///
    /// A failed commit turns the result into that error. A failed rollback is
    /// logged and the original error is returned.
    pub async fn finish<R>(self, result: Result<R, ShopError>) -> Result<R, ShopError> {
        let operation = self.operation;
        match result {
            Ok(value) => {
                self.tx.commit().await?;
                debug!(operation, "transaction committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.tx.rollback().await {
                    error!(operation, error = %rollback_err, "rollback failed");
                } else {
                    debug!(operation, error = %err, "transaction rolled back");
                }
                Err(err)
            }
        }
    }
}
