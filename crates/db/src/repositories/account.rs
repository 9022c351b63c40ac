//! Account repository.
//!
//! Account rows belong to the registration service. This repository only
//! creates them for seeding and tests. Balances are read through
//! `BalanceRepository` and changed only by the shop store.

use mapmem_shared::types::AccountId;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};

use crate::entities::accounts;

/// Error types for account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Account repository.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an account with a zero balance.
    ///
    /// Opening funds go through an admin credit so that the ledger stays the
    /// source of truth for the balance.
    pub async fn create_account(&self, display_name: &str) -> Result<accounts::Model, AccountError> {
        let now = chrono::Utc::now().into();
        let account = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            display_name: Set(display_name.to_string()),
            balance: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(account.insert(&self.db).await?)
    }
}
