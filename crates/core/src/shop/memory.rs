//! In-memory shop store.
//!
//! Whole transactions are serialized behind one async mutex. A transaction
//! records its writes in a write set that reads consult first; commit applies
//! the write set to the shared state, rollback and drop throw it away. The
//! cost of a transaction depends on what it touches, not on ledger history.
//! A one-shot [`FaultPoint`] can be armed to make the next transaction fail
//! at a chosen step.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use mapmem_shared::types::{AccountId, ItemId, LedgerEntryId, PageRequest};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::error::ShopError;
use super::ports::{ShopStore, ShopTransaction};
use super::types::{LedgerEntry, NewLedgerEntry, ShopItem};

/// Transaction step at which an armed fault fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPoint {
    /// Loading the item.
    LockItem,
    /// Loading the account.
    LockAccount,
    /// Changing the balance.
    ApplyDelta,
    /// Decrementing stock.
    DecrementStock,
    /// Adding to ownership.
    UpsertOwnership,
    /// Writing the ledger entry.
    AppendLedger,
    /// Committing.
    Commit,
}

#[derive(Debug, Clone)]
struct StoredItem {
    item: ShopItem,
    deleted: bool,
}

#[derive(Debug, Clone, Default)]
struct ShopState {
    balances: HashMap<AccountId, i64>,
    items: HashMap<ItemId, StoredItem>,
    ownership: HashMap<(AccountId, ItemId), i32>,
    ledger: Vec<LedgerEntry>,
    next_sequence: i64,
    armed_fault: Option<FaultPoint>,
}

/// Uncommitted writes of one transaction.
#[derive(Debug, Default)]
struct WriteSet {
    balances: HashMap<AccountId, i64>,
    stock: HashMap<ItemId, i32>,
    ownership: HashMap<(AccountId, ItemId), i32>,
    ledger: Vec<LedgerEntry>,
}

/// Shop store kept entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryShopStore {
    state: Arc<Mutex<ShopState>>,
}

impl InMemoryShopStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an account with an opening balance and no ledger history.
    pub async fn insert_account(&self, account_id: AccountId, balance: i64) {
        self.state.lock().await.balances.insert(account_id, balance);
    }

    /// Adds or replaces a catalog item.
    pub async fn insert_item(&self, item: ShopItem) {
        self.state.lock().await.items.insert(
            item.id,
            StoredItem {
                item,
                deleted: false,
            },
        );
    }

    /// Soft-deletes an item. Returns false if the item is unknown.
    pub async fn soft_delete_item(&self, item_id: ItemId) -> bool {
        self.state
            .lock()
            .await
            .items
            .get_mut(&item_id)
            .map(|stored| stored.deleted = true)
            .is_some()
    }

    /// Makes the next transaction fail at `point`.
    pub async fn fail_at(&self, point: FaultPoint) {
        self.state.lock().await.armed_fault = Some(point);
    }

    /// Committed state of an item, including soft-deleted ones.
    pub async fn item(&self, item_id: ItemId) -> Option<ShopItem> {
        self.state
            .lock()
            .await
            .items
            .get(&item_id)
            .map(|stored| stored.item.clone())
    }

    /// Committed quantity of an item held by an account.
    pub async fn owned_quantity(&self, account_id: AccountId, item_id: ItemId) -> Option<i32> {
        self.state
            .lock()
            .await
            .ownership
            .get(&(account_id, item_id))
            .copied()
    }

    /// Number of committed ledger entries across all accounts.
    pub async fn ledger_len(&self) -> usize {
        self.state.lock().await.ledger.len()
    }
}

#[async_trait]
impl ShopStore for InMemoryShopStore {
    type Tx = InMemoryShopTransaction;

    async fn begin(&self) -> Result<Self::Tx, ShopError> {
        let mut guard = Arc::clone(&self.state).lock_owned().await;
        let fault = guard.armed_fault.take();
        Ok(InMemoryShopTransaction {
            guard,
            writes: WriteSet::default(),
            fault,
        })
    }

    async fn balance(&self, account_id: AccountId) -> Result<i64, ShopError> {
        self.state
            .lock()
            .await
            .balances
            .get(&account_id)
            .copied()
            .ok_or(ShopError::AccountNotFound(account_id))
    }

    async fn list_ledger(
        &self,
        account_id: AccountId,
        page: PageRequest,
    ) -> Result<(Vec<LedgerEntry>, u64), ShopError> {
        let state = self.state.lock().await;
        let mut entries: Vec<&LedgerEntry> = state
            .ledger
            .iter()
            .filter(|entry| entry.account_id == account_id)
            .collect();
        entries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.sequence.cmp(&a.sequence))
        });

        let total = u64::try_from(entries.len()).unwrap_or(u64::MAX);
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        let data = entries
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((data, total))
    }

    async fn sum_ledger(&self, account_id: AccountId) -> Result<i64, ShopError> {
        self.state
            .lock()
            .await
            .ledger
            .iter()
            .filter(|entry| entry.account_id == account_id)
            .try_fold(0_i64, |sum, entry| sum.checked_add(entry.amount))
            .ok_or(ShopError::AmountOverflow)
    }
}

/// Transaction over an [`InMemoryShopStore`].
///
/// Holds the store lock for its whole lifetime.
#[derive(Debug)]
pub struct InMemoryShopTransaction {
    guard: OwnedMutexGuard<ShopState>,
    writes: WriteSet,
    fault: Option<FaultPoint>,
}

impl InMemoryShopTransaction {
    fn check(&self, point: FaultPoint) -> Result<(), ShopError> {
        if self.fault == Some(point) {
            return Err(ShopError::Storage(format!("injected failure at {point:?}")));
        }
        Ok(())
    }

    fn live_item(&self, item_id: ItemId) -> Result<ShopItem, ShopError> {
        match self.guard.items.get(&item_id) {
            Some(stored) if !stored.deleted => {
                let mut item = stored.item.clone();
                if let Some(stock) = self.writes.stock.get(&item_id) {
                    item.stock = *stock;
                }
                Ok(item)
            }
            _ => Err(ShopError::ItemNotFound(item_id)),
        }
    }

    fn current_balance(&self, account_id: AccountId) -> Result<i64, ShopError> {
        self.writes
            .balances
            .get(&account_id)
            .or_else(|| self.guard.balances.get(&account_id))
            .copied()
            .ok_or(ShopError::AccountNotFound(account_id))
    }
}

#[async_trait]
impl ShopTransaction for InMemoryShopTransaction {
    async fn lock_item(&mut self, item_id: ItemId) -> Result<ShopItem, ShopError> {
        self.check(FaultPoint::LockItem)?;
        self.live_item(item_id)
    }

    async fn lock_account(&mut self, account_id: AccountId) -> Result<i64, ShopError> {
        self.check(FaultPoint::LockAccount)?;
        self.current_balance(account_id)
    }

    async fn apply_delta(&mut self, account_id: AccountId, delta: i64) -> Result<i64, ShopError> {
        self.check(FaultPoint::ApplyDelta)?;
        let balance = self.current_balance(account_id)?;
        let updated = balance
            .checked_add(delta)
            .ok_or(ShopError::AmountOverflow)?;
        if updated < 0 {
            return Err(ShopError::InsufficientBalance {
                account_id,
                balance,
                required: delta.saturating_neg(),
            });
        }
        self.writes.balances.insert(account_id, updated);
        Ok(updated)
    }

    async fn decrement_stock(&mut self, item_id: ItemId, quantity: i32) -> Result<i32, ShopError> {
        self.check(FaultPoint::DecrementStock)?;
        let item = self.live_item(item_id)?;
        if item.stock < quantity {
            return Err(ShopError::InsufficientStock {
                item_id,
                available: item.stock,
                requested: quantity,
            });
        }
        let remaining = item.stock - quantity;
        self.writes.stock.insert(item_id, remaining);
        Ok(remaining)
    }

    async fn upsert_ownership(
        &mut self,
        account_id: AccountId,
        item_id: ItemId,
        quantity: i32,
    ) -> Result<i32, ShopError> {
        self.check(FaultPoint::UpsertOwnership)?;
        let key = (account_id, item_id);
        let owned = self
            .writes
            .ownership
            .get(&key)
            .or_else(|| self.guard.ownership.get(&key))
            .copied()
            .unwrap_or(0);
        let updated = owned
            .checked_add(quantity)
            .ok_or(ShopError::AmountOverflow)?;
        self.writes.ownership.insert(key, updated);
        Ok(updated)
    }

    async fn append_ledger(&mut self, entry: NewLedgerEntry) -> Result<LedgerEntry, ShopError> {
        self.check(FaultPoint::AppendLedger)?;
        let pending = i64::try_from(self.writes.ledger.len()).unwrap_or(i64::MAX);
        let stored = LedgerEntry {
            id: LedgerEntryId::new(),
            sequence: self.guard.next_sequence.saturating_add(pending).saturating_add(1),
            account_id: entry.account_id,
            actor_id: entry.actor_id,
            kind: entry.kind,
            amount: entry.amount,
            description: entry.description,
            created_at: Utc::now(),
        };
        self.writes.ledger.push(stored.clone());
        Ok(stored)
    }

    async fn commit(self) -> Result<(), ShopError> {
        self.check(FaultPoint::Commit)?;
        let Self {
            mut guard, writes, ..
        } = self;

        guard.balances.extend(writes.balances);
        for (item_id, stock) in writes.stock {
            if let Some(stored) = guard.items.get_mut(&item_id) {
                stored.item.stock = stock;
            }
        }
        guard.ownership.extend(writes.ownership);
        if let Some(last) = writes.ledger.last() {
            guard.next_sequence = last.sequence;
        }
        guard.ledger.extend(writes.ledger);
        Ok(())
    }

    async fn rollback(self) -> Result<(), ShopError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shop::types::LedgerEntryKind;

    fn credit(account_id: AccountId, amount: i64) -> NewLedgerEntry {
        NewLedgerEntry {
            account_id,
            actor_id: Some(account_id),
            kind: LedgerEntryKind::AdminCredit,
            amount,
            description: "top up".to_string(),
        }
    }

    #[tokio::test]
    async fn test_transaction_reads_its_own_writes() {
        let store = InMemoryShopStore::new();
        let account = AccountId::new();
        let item = ItemId::new();
        store.insert_account(account, 100).await;
        store
            .insert_item(ShopItem {
                id: item,
                name: "Pier".to_string(),
                price: 5,
                stock: 3,
                is_active: true,
            })
            .await;

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.apply_delta(account, -40).await.unwrap(), 60);
        assert_eq!(tx.lock_account(account).await.unwrap(), 60);
        assert_eq!(tx.decrement_stock(item, 2).await.unwrap(), 1);
        assert_eq!(tx.lock_item(item).await.unwrap().stock, 1);
        assert_eq!(tx.upsert_ownership(account, item, 2).await.unwrap(), 2);
        assert_eq!(tx.upsert_ownership(account, item, 1).await.unwrap(), 3);
        assert!(matches!(
            tx.decrement_stock(item, 2).await,
            Err(ShopError::InsufficientStock { available: 1, .. })
        ));
        tx.commit().await.unwrap();

        assert_eq!(store.balance(account).await.unwrap(), 60);
        assert_eq!(store.item(item).await.unwrap().stock, 1);
        assert_eq!(store.owned_quantity(account, item).await, Some(3));
    }

    #[tokio::test]
    async fn test_uncommitted_writes_are_discarded() {
        let store = InMemoryShopStore::new();
        let account = AccountId::new();
        store.insert_account(account, 10).await;

        let mut tx = store.begin().await.unwrap();
        tx.apply_delta(account, 5).await.unwrap();
        tx.append_ledger(credit(account, 5)).await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(store.balance(account).await.unwrap(), 10);
        assert_eq!(store.ledger_len().await, 0);
    }

    #[tokio::test]
    async fn test_sequences_continue_across_transactions() {
        let store = InMemoryShopStore::new();
        let account = AccountId::new();
        store.insert_account(account, 0).await;

        let mut tx = store.begin().await.unwrap();
        let first = tx.append_ledger(credit(account, 1)).await.unwrap();
        let second = tx.append_ledger(credit(account, 2)).await.unwrap();
        tx.commit().await.unwrap();

        // A discarded transaction does not consume sequence numbers.
        let mut tx = store.begin().await.unwrap();
        tx.append_ledger(credit(account, 3)).await.unwrap();
        drop(tx);

        let mut tx = store.begin().await.unwrap();
        let third = tx.append_ledger(credit(account, 4)).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(
            (first.sequence, second.sequence, third.sequence),
            (1, 2, 3)
        );
        assert_eq!(store.sum_ledger(account).await.unwrap(), 5);
    }
}
