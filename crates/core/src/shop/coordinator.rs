//! Transaction coordinator for purchases and admin balance adjustments.
//!
//! Every mutating operation runs inside one [`TransactionScope`]: validate,
//! mutate, write exactly one ledger entry, commit. Any failure rolls back the
//! whole unit, so balances, stock, ownership and the ledger always move
//! together.
//!
//! Locks are taken item first, then account. Admin operations lock only the
//! account.

use async_trait::async_trait;
use mapmem_shared::types::{AccountId, PageRequest, PageResponse};
use tracing::{error, info, warn};

use super::error::ShopError;
use super::ports::{ShopStore, ShopTransaction};
use super::scope::TransactionScope;
use super::types::{
    AdjustmentReceipt, AdminAdjustment, LedgerEntry, LedgerEntryKind, NewLedgerEntry,
    PurchaseReceipt, PurchaseRequest, purchase_description,
};

/// Object-safe view of the shop operations, for callers that should not
/// know which store backs them (HTTP handlers, tests).
#[async_trait]
pub trait ShopService: Send + Sync {
    /// Buys `quantity` units of an item for an account.
    async fn purchase(&self, request: PurchaseRequest) -> Result<PurchaseReceipt, ShopError>;

    /// Adds currency to an account on behalf of an administrator.
    async fn admin_credit(&self, adjustment: AdminAdjustment)
    -> Result<AdjustmentReceipt, ShopError>;

    /// Removes currency from an account on behalf of an administrator.
    async fn admin_debit(&self, adjustment: AdminAdjustment) -> Result<AdjustmentReceipt, ShopError>;

    /// Current balance of an account.
    async fn balance(&self, account_id: AccountId) -> Result<i64, ShopError>;

    /// One page of an account's ledger, newest first.
    async fn list_ledger(
        &self,
        account_id: AccountId,
        page: u64,
        page_size: u64,
    ) -> Result<PageResponse<LedgerEntry>, ShopError>;
}

/// Coordinates shop operations over a [`ShopStore`].
#[derive(Debug, Clone)]
pub struct ShopCoordinator<S> {
    store: S,
}

impl<S: ShopStore> ShopCoordinator<S> {
    /// Creates a coordinator over `store`.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Buys `quantity` units of an item.
    ///
    /// Debits `price * quantity`, decrements stock, adds to the buyer's
    /// holding and appends one `purchase` entry. A free item still writes its
    /// entry, with amount 0.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity`, `ItemNotFound`, `ItemInactive`, `InsufficientStock`,
    /// `AmountOverflow`, `AccountNotFound`, `InsufficientBalance` or `Storage`.
    /// Nothing is written on any error.
    pub async fn purchase(&self, request: PurchaseRequest) -> Result<PurchaseReceipt, ShopError> {
        if request.quantity < 1 {
            return Err(ShopError::InvalidQuantity(request.quantity));
        }

        let mut scope = TransactionScope::begin(&self.store, "purchase").await?;
        let result = run_purchase(scope.tx(), &request).await;
        let result = scope.finish(result).await;

        match &result {
            Ok(receipt) => info!(
                account_id = %request.account_id,
                item_id = %receipt.item_id,
                quantity = receipt.quantity,
                total_cost = receipt.total_cost,
                new_balance = receipt.new_balance,
                "purchase committed"
            ),
            Err(err) => log_failure("purchase", request.account_id, err),
        }
        result
    }

    /// Credits an account.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` if `amount <= 0`, `AccountNotFound`, `AmountOverflow`
    /// or `Storage`.
    pub async fn admin_credit(
        &self,
        adjustment: AdminAdjustment,
    ) -> Result<AdjustmentReceipt, ShopError> {
        self.adjust(adjustment, LedgerEntryKind::AdminCredit).await
    }

    /// Debits an account.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` if `amount <= 0`, `AccountNotFound`,
    /// `InsufficientBalance` or `Storage`.
    pub async fn admin_debit(
        &self,
        adjustment: AdminAdjustment,
    ) -> Result<AdjustmentReceipt, ShopError> {
        self.adjust(adjustment, LedgerEntryKind::AdminDebit).await
    }

    /// Current balance of an account.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` or `Storage`.
    pub async fn balance(&self, account_id: AccountId) -> Result<i64, ShopError> {
        self.store.balance(account_id).await
    }

    /// Lists an account's ledger, newest first.
    ///
    /// An account without entries (or unknown to the store) yields an empty
    /// page with `total_pages == 0`.
    ///
    /// # Errors
    ///
    /// `InvalidPagination` if `page < 1` or `page_size` is outside `1..=100`.
    pub async fn list_ledger(
        &self,
        account_id: AccountId,
        page: u64,
        page_size: u64,
    ) -> Result<PageResponse<LedgerEntry>, ShopError> {
        let request = PageRequest::new(page, page_size)?;
        let (entries, total) = self.store.list_ledger(account_id, request).await?;
        Ok(PageResponse::new(entries, request, total))
    }

    /// Checks that an account's ledger sums to its balance.
    ///
    /// Returns `(balance, ledger_sum)`; they are equal for any account whose
    /// balance only ever moved through this coordinator.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` or `Storage`.
    pub async fn audit_account(&self, account_id: AccountId) -> Result<(i64, i64), ShopError> {
        let balance = self.store.balance(account_id).await?;
        let sum = self.store.sum_ledger(account_id).await?;
        if balance != sum {
            warn!(%account_id, balance, ledger_sum = sum, "ledger does not match balance");
        }
        Ok((balance, sum))
    }

    async fn adjust(
        &self,
        adjustment: AdminAdjustment,
        kind: LedgerEntryKind,
    ) -> Result<AdjustmentReceipt, ShopError> {
        if adjustment.amount <= 0 {
            return Err(ShopError::InvalidAmount(adjustment.amount));
        }

        let mut scope = TransactionScope::begin(&self.store, kind.as_str()).await?;
        let result = run_adjustment(scope.tx(), &adjustment, kind).await;
        let result = scope.finish(result).await;

        match &result {
            Ok(receipt) => info!(
                account_id = %receipt.account_id,
                actor_id = %adjustment.actor_id,
                kind = %kind,
                amount = receipt.amount,
                new_balance = receipt.new_balance,
                "balance adjustment committed"
            ),
            Err(err) => log_failure(kind.as_str(), adjustment.target_account_id, err),
        }
        result
    }
}

async fn run_purchase<T: ShopTransaction>(
    tx: &mut T,
    request: &PurchaseRequest,
) -> Result<PurchaseReceipt, ShopError> {
    let item = tx.lock_item(request.item_id).await?;
    if !item.is_active {
        return Err(ShopError::ItemInactive(item.id));
    }
    if item.stock < request.quantity {
        return Err(ShopError::InsufficientStock {
            item_id: item.id,
            available: item.stock,
            requested: request.quantity,
        });
    }

    let total_cost = item
        .price
        .checked_mul(i64::from(request.quantity))
        .ok_or(ShopError::AmountOverflow)?;

    let balance = tx.lock_account(request.account_id).await?;
    if balance < total_cost {
        return Err(ShopError::InsufficientBalance {
            account_id: request.account_id,
            balance,
            required: total_cost,
        });
    }

    let new_balance = tx.apply_delta(request.account_id, -total_cost).await?;
    let remaining_stock = tx.decrement_stock(item.id, request.quantity).await?;
    let owned_quantity = tx
        .upsert_ownership(request.account_id, item.id, request.quantity)
        .await?;
    let entry = tx
        .append_ledger(NewLedgerEntry {
            account_id: request.account_id,
            actor_id: None,
            kind: LedgerEntryKind::Purchase,
            amount: -total_cost,
            description: purchase_description(request.quantity, &item.name),
        })
        .await?;

    Ok(PurchaseReceipt {
        item_id: item.id,
        item_name: item.name,
        quantity: request.quantity,
        total_cost,
        new_balance,
        remaining_stock,
        owned_quantity,
        ledger_entry_id: entry.id,
    })
}

async fn run_adjustment<T: ShopTransaction>(
    tx: &mut T,
    adjustment: &AdminAdjustment,
    kind: LedgerEntryKind,
) -> Result<AdjustmentReceipt, ShopError> {
    let account_id = adjustment.target_account_id;
    let balance = tx.lock_account(account_id).await?;

    let delta = match kind {
        LedgerEntryKind::AdminDebit => {
            if balance < adjustment.amount {
                return Err(ShopError::InsufficientBalance {
                    account_id,
                    balance,
                    required: adjustment.amount,
                });
            }
            -adjustment.amount
        }
        LedgerEntryKind::AdminCredit => adjustment.amount,
        LedgerEntryKind::Purchase => {
            return Err(ShopError::Storage(
                "purchase is not a balance adjustment".to_string(),
            ));
        }
    };

    let new_balance = tx.apply_delta(account_id, delta).await?;
    let entry = tx
        .append_ledger(NewLedgerEntry {
            account_id,
            actor_id: Some(adjustment.actor_id),
            kind,
            amount: delta,
            description: adjustment.description.clone(),
        })
        .await?;

    Ok(AdjustmentReceipt {
        account_id,
        new_balance,
        amount: adjustment.amount,
        ledger_entry_id: entry.id,
    })
}

fn log_failure(operation: &str, account_id: AccountId, err: &ShopError) {
    if err.is_storage() {
        error!(operation, %account_id, error = %err, "shop operation failed");
    } else {
        warn!(operation, %account_id, code = err.error_code(), error = %err, "shop operation rejected");
    }
}

#[async_trait]
impl<S: ShopStore> ShopService for ShopCoordinator<S> {
    async fn purchase(&self, request: PurchaseRequest) -> Result<PurchaseReceipt, ShopError> {
        Self::purchase(self, request).await
    }

    async fn admin_credit(
        &self,
        adjustment: AdminAdjustment,
    ) -> Result<AdjustmentReceipt, ShopError> {
        Self::admin_credit(self, adjustment).await
    }

    async fn admin_debit(&self, adjustment: AdminAdjustment) -> Result<AdjustmentReceipt, ShopError> {
        Self::admin_debit(self, adjustment).await
    }

    async fn balance(&self, account_id: AccountId) -> Result<i64, ShopError> {
        Self::balance(self, account_id).await
    }

    async fn list_ledger(
        &self,
        account_id: AccountId,
        page: u64,
        page_size: u64,
    ) -> Result<PageResponse<LedgerEntry>, ShopError> {
        Self::list_ledger(self, account_id, page, page_size).await
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
