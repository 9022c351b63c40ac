//! Shop and currency transactions.
//!
//! - `types` - Items, ledger entries, requests and receipts
//! - `error` - `ShopError` and its classification
//! - `ports` - Storage traits the coordinator runs against
//! - `scope` - Commit-or-rollback transaction scope
//! - `coordinator` - Purchase, admin credit/debit and ledger listing
//! - `memory` - In-memory store with fault injection

pub mod coordinator;
pub mod error;
pub mod memory;
pub mod ports;
pub mod scope;
pub mod types;

#[cfg(test)]
mod coordinator_props;

pub use coordinator::{ShopCoordinator, ShopService};
pub use error::{ShopError, ShopErrorKind};
pub use memory::{FaultPoint, InMemoryShopStore, InMemoryShopTransaction};
pub use ports::{ShopStore, ShopTransaction};
pub use scope::TransactionScope;
pub use types::{
    AdjustmentReceipt, AdminAdjustment, LedgerEntry, LedgerEntryKind, NewLedgerEntry,
    PurchaseReceipt, PurchaseRequest, ShopItem,
};
