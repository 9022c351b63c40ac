//! Balance repository: read-only access to account balances.
//!
//! Balances only change inside a shop transaction (see [`crate::store`]).

use mapmem_shared::types::AccountId;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, QuerySelect};

use crate::entities::accounts;

/// Error types for balance lookups.
#[derive(Debug, thiserror::Error)]
pub enum BalanceError {
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Balance repository.
#[derive(Debug, Clone)]
pub struct BalanceRepository {
    db: DatabaseConnection,
}

impl BalanceRepository {
    /// Creates a new balance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the committed balance of an account.
    pub async fn get_balance(&self, account_id: AccountId) -> Result<i64, BalanceError> {
        accounts::Entity::find_by_id(account_id.into_inner())
            .select_only()
            .column(accounts::Column::Balance)
            .into_tuple::<i64>()
            .one(&self.db)
            .await?
            .ok_or(BalanceError::AccountNotFound(account_id))
    }
}
