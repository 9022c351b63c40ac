//! PostgreSQL implementation of the shop storage ports.
//!
//! Every [`PgShopTransaction`] wraps one `DatabaseTransaction`. Rows are read
//! with `SELECT ... FOR NO KEY UPDATE`, so concurrent purchases of the same
//! item queue on the item row and debits of the same account queue on the
//! account row. Ledger inserts take `FOR KEY SHARE` on the account named as
//! `actor_id`, which must not conflict with these locks.
//! A transaction dropped without commit is rolled back by SeaORM.
//!
//! ```ignore
//! let store = PgShopStore::new(db.clone());
//! let coordinator = ShopCoordinator::new(store);
//! let receipt = coordinator.purchase(request).await?;
//! ```

use async_trait::async_trait;
use mapmem_core::shop::{
    LedgerEntry, NewLedgerEntry, ShopError, ShopItem, ShopStore, ShopTransaction,
};
use mapmem_shared::types::{AccountId, ItemId, LedgerEntryId, OwnershipId, PageRequest};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QuerySelect, Set, TransactionTrait,
};

use crate::entities::{accounts, catalog_items, ledger_entries, ownership};
use crate::repositories::ledger::to_domain;
use crate::repositories::{BalanceError, BalanceRepository, LedgerRepository};

fn storage(err: DbErr) -> ShopError {
    ShopError::Storage(err.to_string())
}

/// Shop store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgShopStore {
    db: DatabaseConnection,
    balances: BalanceRepository,
    ledger: LedgerRepository,
}

impl PgShopStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            balances: BalanceRepository::new(db.clone()),
            ledger: LedgerRepository::new(db.clone()),
            db,
        }
    }
}

#[async_trait]
impl ShopStore for PgShopStore {
    type Tx = PgShopTransaction;

    async fn begin(&self) -> Result<Self::Tx, ShopError> {
        let txn = self.db.begin().await.map_err(storage)?;
        Ok(PgShopTransaction { txn })
    }

    async fn balance(&self, account_id: AccountId) -> Result<i64, ShopError> {
        self.balances
            .get_balance(account_id)
            .await
            .map_err(|err| match err {
                BalanceError::AccountNotFound(id) => ShopError::AccountNotFound(id),
                BalanceError::Database(db_err) => storage(db_err),
            })
    }

    async fn list_ledger(
        &self,
        account_id: AccountId,
        page: PageRequest,
    ) -> Result<(Vec<LedgerEntry>, u64), ShopError> {
        let (rows, total) = self
            .ledger
            .list_by_account(account_id, page)
            .await
            .map_err(storage)?;
        Ok((rows.into_iter().map(to_domain).collect(), total))
    }

    async fn sum_ledger(&self, account_id: AccountId) -> Result<i64, ShopError> {
        self.ledger.sum_by_account(account_id).await.map_err(storage)
    }
}

/// One open PostgreSQL transaction for a shop operation.
pub struct PgShopTransaction {
    txn: DatabaseTransaction,
}

impl std::fmt::Debug for PgShopTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgShopTransaction").finish_non_exhaustive()
    }
}

impl PgShopTransaction {
    async fn locked_account(&self, account_id: AccountId) -> Result<accounts::Model, ShopError> {
        accounts::Entity::find_by_id(account_id.into_inner())
            .lock(LockType::NoKeyUpdate)
            .one(&self.txn)
            .await
            .map_err(storage)?
            .ok_or(ShopError::AccountNotFound(account_id))
    }

    async fn locked_item(&self, item_id: ItemId) -> Result<catalog_items::Model, ShopError> {
        catalog_items::Entity::find_by_id(item_id.into_inner())
            .filter(catalog_items::Column::DeletedAt.is_null())
            .lock(LockType::NoKeyUpdate)
            .one(&self.txn)
            .await
            .map_err(storage)?
            .ok_or(ShopError::ItemNotFound(item_id))
    }
}

#[async_trait]
impl ShopTransaction for PgShopTransaction {
    async fn lock_item(&mut self, item_id: ItemId) -> Result<ShopItem, ShopError> {
        let row = self.locked_item(item_id).await?;
        Ok(ShopItem {
            id: item_id,
            name: row.name,
            price: row.price,
            stock: row.stock,
            is_active: row.is_active,
        })
    }

    async fn lock_account(&mut self, account_id: AccountId) -> Result<i64, ShopError> {
        Ok(self.locked_account(account_id).await?.balance)
    }

    async fn apply_delta(&mut self, account_id: AccountId, delta: i64) -> Result<i64, ShopError> {
        let account = self.locked_account(account_id).await?;
        let balance = account.balance;
        let updated = balance.checked_add(delta).ok_or(ShopError::AmountOverflow)?;
        if updated < 0 {
            return Err(ShopError::InsufficientBalance {
                account_id,
                balance,
                required: delta.saturating_neg(),
            });
        }

        let mut active: accounts::ActiveModel = account.into();
        active.balance = Set(updated);
        active.updated_at = Set(chrono::Utc::now().into());
        active.update(&self.txn).await.map_err(storage)?;
        Ok(updated)
    }

    async fn decrement_stock(&mut self, item_id: ItemId, quantity: i32) -> Result<i32, ShopError> {
        let item = self.locked_item(item_id).await?;
        if item.stock < quantity {
            return Err(ShopError::InsufficientStock {
                item_id,
                available: item.stock,
                requested: quantity,
            });
        }
        let remaining = item.stock - quantity;

        let mut active: catalog_items::ActiveModel = item.into();
        active.stock = Set(remaining);
        active.updated_at = Set(chrono::Utc::now().into());
        active.update(&self.txn).await.map_err(storage)?;
        Ok(remaining)
    }

    async fn upsert_ownership(
        &mut self,
        account_id: AccountId,
        item_id: ItemId,
        quantity: i32,
    ) -> Result<i32, ShopError> {
        let now = chrono::Utc::now().into();
        let existing = ownership::Entity::find()
            .filter(ownership::Column::AccountId.eq(account_id.into_inner()))
            .filter(ownership::Column::ItemId.eq(item_id.into_inner()))
            .lock(LockType::NoKeyUpdate)
            .one(&self.txn)
            .await
            .map_err(storage)?;

        if let Some(row) = existing {
            let updated = row
                .quantity
                .checked_add(quantity)
                .ok_or(ShopError::AmountOverflow)?;
            let mut active: ownership::ActiveModel = row.into();
            active.quantity = Set(updated);
            active.updated_at = Set(now);
            active.update(&self.txn).await.map_err(storage)?;
            return Ok(updated);
        }

        ownership::ActiveModel {
            id: Set(OwnershipId::new().into_inner()),
            account_id: Set(account_id.into_inner()),
            item_id: Set(item_id.into_inner()),
            quantity: Set(quantity),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.txn)
        .await
        .map_err(storage)?;
        Ok(quantity)
    }

    async fn append_ledger(&mut self, entry: NewLedgerEntry) -> Result<LedgerEntry, ShopError> {
        let row = ledger_entries::ActiveModel {
            id: Set(LedgerEntryId::new().into_inner()),
            sequence: NotSet,
            account_id: Set(entry.account_id.into_inner()),
            actor_id: Set(entry.actor_id.map(AccountId::into_inner)),
            kind: Set(entry.kind.into()),
            amount: Set(entry.amount),
            description: Set(entry.description),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(&self.txn)
        .await
        .map_err(storage)?;

        Ok(to_domain(row))
    }

    async fn commit(self) -> Result<(), ShopError> {
        self.txn.commit().await.map_err(storage)
    }

    async fn rollback(self) -> Result<(), ShopError> {
        self.txn.rollback().await.map_err(storage)
    }
}
