//! Wire-format response types and the functions that build them.
//!
//! Database models and domain types never go on the wire directly; each
//! response is mapped here field by field.

use chrono::{DateTime, FixedOffset};
use mapmem_core::shop::{AdjustmentReceipt, LedgerEntry, PurchaseReceipt};
use mapmem_db::entities::catalog_items;
use mapmem_db::repositories::OwnedItem;
use serde::Serialize;
use uuid::Uuid;

/// A catalog item.
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    /// Item ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Base64-encoded image.
    pub image_base64: String,
    /// Unit price.
    pub price: i64,
    /// Remaining stock.
    pub stock: i32,
    /// Item type tag.
    pub item_type: String,
    /// Whether the item can be purchased.
    pub is_active: bool,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Last update timestamp (RFC 3339).
    pub updated_at: String,
}

/// An item held by the caller.
#[derive(Debug, Serialize)]
pub struct OwnedItemResponse {
    /// Ownership record ID.
    pub id: Uuid,
    /// Units held.
    pub quantity: i32,
    /// The item.
    pub item: ItemResponse,
    /// When the item was first acquired (RFC 3339).
    pub acquired_at: String,
}

/// A ledger entry.
#[derive(Debug, Serialize)]
pub struct LedgerEntryResponse {
    /// Entry ID.
    pub id: Uuid,
    /// Account whose balance changed.
    pub account_id: Uuid,
    /// Admin who made the change, if any.
    pub actor_id: Option<Uuid>,
    /// `purchase`, `admin_credit` or `admin_debit`.
    pub kind: &'static str,
    /// Signed balance change.
    pub amount: i64,
    /// Description.
    pub description: String,
    /// Entry timestamp (RFC 3339).
    pub created_at: String,
}

/// Receipt for a purchase.
#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    /// Purchased item.
    pub item_id: Uuid,
    /// Item name.
    pub item_name: String,
    /// Units bought.
    pub quantity: i32,
    /// Amount charged.
    pub total_cost: i64,
    /// Balance after the purchase.
    pub new_balance: i64,
    /// Stock left.
    pub remaining_stock: i32,
    /// Units of the item now held.
    pub owned_quantity: i32,
    /// Ledger entry written for the purchase.
    pub ledger_entry_id: Uuid,
}

/// Balance of the caller.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Account ID.
    pub account_id: Uuid,
    /// Current balance.
    pub balance: i64,
}

fn rfc3339(ts: &DateTime<FixedOffset>) -> String {
    ts.to_rfc3339()
}

/// Maps a catalog row.
pub fn item_response(item: catalog_items::Model) -> ItemResponse {
    ItemResponse {
        id: item.id,
        name: item.name,
        description: item.description,
        image_base64: item.image_base64,
        price: item.price,
        stock: item.stock,
        item_type: item.item_type,
        is_active: item.is_active,
        created_at: rfc3339(&item.created_at),
        updated_at: rfc3339(&item.updated_at),
    }
}

/// Maps an ownership row with its item.
pub fn owned_item_response(owned: OwnedItem) -> OwnedItemResponse {
    OwnedItemResponse {
        id: owned.ownership.id,
        quantity: owned.ownership.quantity,
        acquired_at: rfc3339(&owned.ownership.created_at),
        item: item_response(owned.item),
    }
}

/// Maps a domain ledger entry.
pub fn ledger_entry_response(entry: LedgerEntry) -> LedgerEntryResponse {
    LedgerEntryResponse {
        id: entry.id.into_inner(),
        account_id: entry.account_id.into_inner(),
        actor_id: entry.actor_id.map(|id| id.into_inner()),
        kind: entry.kind.as_str(),
        amount: entry.amount,
        description: entry.description,
        created_at: entry.created_at.to_rfc3339(),
    }
}

/// Maps a purchase receipt.
pub fn purchase_response(receipt: PurchaseReceipt) -> PurchaseResponse {
    PurchaseResponse {
        item_id: receipt.item_id.into_inner(),
        item_name: receipt.item_name,
        quantity: receipt.quantity,
        total_cost: receipt.total_cost,
        new_balance: receipt.new_balance,
        remaining_stock: receipt.remaining_stock,
        owned_quantity: receipt.owned_quantity,
        ledger_entry_id: receipt.ledger_entry_id.into_inner(),
    }
}

/// Maps an admin credit receipt (`amount_added`).
pub fn credit_response(receipt: &AdjustmentReceipt) -> serde_json::Value {
    serde_json::json!({
        "account_id": receipt.account_id,
        "new_balance": receipt.new_balance,
        "amount_added": receipt.amount,
        "ledger_entry_id": receipt.ledger_entry_id,
    })
}

/// Maps an admin debit receipt (`amount_subtracted`).
pub fn debit_response(receipt: &AdjustmentReceipt) -> serde_json::Value {
    serde_json::json!({
        "account_id": receipt.account_id,
        "new_balance": receipt.new_balance,
        "amount_subtracted": receipt.amount,
        "ledger_entry_id": receipt.ledger_entry_id,
    })
}
