//! Storage ports for the shop.
//!
//! The coordinator only talks to storage through these traits. `mapmem-db`
//! implements them over PostgreSQL; [`crate::shop::memory`] implements them
//! in memory.

use async_trait::async_trait;
use mapmem_shared::types::{AccountId, ItemId, PageRequest};

use super::error::ShopError;
use super::types::{LedgerEntry, NewLedgerEntry, ShopItem};

/// Entry point to shop storage: opens transactions and serves read-only queries.
#[async_trait]
pub trait ShopStore: Send + Sync {
    /// Transaction type handed out by [`ShopStore::begin`].
    type Tx: ShopTransaction + 'static;

    /// Opens a new storage transaction.
    async fn begin(&self) -> Result<Self::Tx, ShopError>;

    /// Current balance of an account, outside any transaction.
    ///
    /// Fails with `AccountNotFound` if the account does not exist.
    async fn balance(&self, account_id: AccountId) -> Result<i64, ShopError>;

    /// One page of an account's ledger, newest first, with the total entry count.
    ///
    /// Order is `created_at DESC, sequence DESC`.
    async fn list_ledger(
        &self,
        account_id: AccountId,
        page: PageRequest,
    ) -> Result<(Vec<LedgerEntry>, u64), ShopError>;

    /// Sum of all ledger amounts for an account.
    async fn sum_ledger(&self, account_id: AccountId) -> Result<i64, ShopError>;
}

/// An open storage transaction.
///
/// Nothing written through it is visible to others until [`commit`](Self::commit).
/// Dropping it without committing discards every write.
#[async_trait]
pub trait ShopTransaction: Send + Sized {
    /// Loads an item and locks it until the transaction ends.
    ///
    /// Fails with `ItemNotFound` if the item is absent or soft-deleted.
    /// Inactive items are returned; callers decide what to do with them.
    async fn lock_item(&mut self, item_id: ItemId) -> Result<ShopItem, ShopError>;

    /// Loads an account's balance and locks the account until the transaction ends.
    async fn lock_account(&mut self, account_id: AccountId) -> Result<i64, ShopError>;

    /// Adds `delta` to the balance and returns the new balance.
    ///
    /// Fails with `InsufficientBalance` if the result would be negative and
    /// with `AmountOverflow` if it would not fit in `i64`.
    async fn apply_delta(&mut self, account_id: AccountId, delta: i64) -> Result<i64, ShopError>;

    /// Removes `quantity` units from an item's stock and returns what is left.
    async fn decrement_stock(&mut self, item_id: ItemId, quantity: i32) -> Result<i32, ShopError>;

    /// Adds `quantity` to an account's holding of an item, creating it if
    /// needed, and returns the new total.
    async fn upsert_ownership(
        &mut self,
        account_id: AccountId,
        item_id: ItemId,
        quantity: i32,
    ) -> Result<i32, ShopError>;

    /// Appends a ledger entry.
    async fn append_ledger(&mut self, entry: NewLedgerEntry) -> Result<LedgerEntry, ShopError>;

    /// Makes every write of the transaction durable and visible.
    async fn commit(self) -> Result<(), ShopError>;

    /// Discards every write of the transaction.
    async fn rollback(self) -> Result<(), ShopError>;
}
