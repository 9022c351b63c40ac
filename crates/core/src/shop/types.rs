//! Domain types for shop purchases and currency adjustments.
//!
//! All amounts are `i64` minor units of the in-app currency. Quantities and
//! stock counters are `i32`, matching the persisted columns.

use chrono::{DateTime, Utc};
use mapmem_shared::types::{AccountId, ItemId, LedgerEntryId};
use serde::{Deserialize, Serialize};

/// Kind of balance-affecting event recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryKind {
    /// A user bought catalog items.
    Purchase,
    /// An administrator added currency to an account.
    AdminCredit,
    /// An administrator removed currency from an account.
    AdminDebit,
}

impl LedgerEntryKind {
    /// Returns the persisted name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::AdminCredit => "admin_credit",
            Self::AdminDebit => "admin_debit",
        }
    }
}

impl std::fmt::Display for LedgerEntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog item as seen by the coordinator, loaded under a row lock.
///
/// Soft-deleted items never reach this type; stores report them as not found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopItem {
    /// Item ID.
    pub id: ItemId,
    /// Display name, used in the purchase ledger description.
    pub name: String,
    /// Unit price.
    pub price: i64,
    /// Remaining stock.
    pub stock: i32,
    /// Whether the item can be purchased.
    pub is_active: bool,
}

/// Ledger entry to append. The store assigns ID, sequence and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    /// Account whose balance changed.
    pub account_id: AccountId,
    /// Administrator who made the change, if any.
    pub actor_id: Option<AccountId>,
    /// Event kind.
    pub kind: LedgerEntryKind,
    /// Signed balance change.
    pub amount: i64,
    /// Human-readable description.
    pub description: String,
}

/// A persisted, immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry ID.
    pub id: LedgerEntryId,
    /// Store-assigned, strictly increasing; breaks `created_at` ties.
    pub sequence: i64,
    /// Account whose balance changed.
    pub account_id: AccountId,
    /// Administrator who made the change, if any.
    pub actor_id: Option<AccountId>,
    /// Event kind.
    pub kind: LedgerEntryKind,
    /// Signed balance change.
    pub amount: i64,
    /// Human-readable description.
    pub description: String,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

/// Input for a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseRequest {
    /// Buyer.
    pub account_id: AccountId,
    /// Item to buy.
    pub item_id: ItemId,
    /// Units to buy, at least 1.
    pub quantity: i32,
}

/// Result of a committed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseReceipt {
    /// Purchased item.
    pub item_id: ItemId,
    /// Item name at purchase time.
    pub item_name: String,
    /// Units bought.
    pub quantity: i32,
    /// `price * quantity`.
    pub total_cost: i64,
    /// Buyer's balance after the purchase.
    pub new_balance: i64,
    /// Item stock after the purchase.
    pub remaining_stock: i32,
    /// Units of the item the buyer now owns in total.
    pub owned_quantity: i32,
    /// The purchase ledger entry.
    pub ledger_entry_id: LedgerEntryId,
}

/// Input for an admin credit or debit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminAdjustment {
    /// Administrator performing the change.
    pub actor_id: AccountId,
    /// Account to adjust.
    pub target_account_id: AccountId,
    /// Positive magnitude of the change.
    pub amount: i64,
    /// Free-text reason, stored on the ledger entry.
    pub description: String,
}

/// Result of a committed admin credit or debit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjustmentReceipt {
    /// Adjusted account.
    pub account_id: AccountId,
    /// Balance after the adjustment.
    pub new_balance: i64,
    /// Positive magnitude that was added or subtracted.
    pub amount: i64,
    /// The adjustment ledger entry.
    pub ledger_entry_id: LedgerEntryId,
}

/// Builds the description written on purchase entries.
#[must_use]
pub fn purchase_description(quantity: i32, item_name: &str) -> String {
    format!("Purchased {quantity}x {item_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(LedgerEntryKind::Purchase.as_str(), "purchase");
        assert_eq!(LedgerEntryKind::AdminCredit.to_string(), "admin_credit");
        assert_eq!(
            serde_json::to_string(&LedgerEntryKind::AdminDebit).unwrap(),
            "\"admin_debit\""
        );
    }

    #[test]
    fn test_purchase_description() {
        assert_eq!(purchase_description(2, "Blue Pin"), "Purchased 2x Blue Pin");
    }
}
