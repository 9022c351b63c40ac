//! Entity re-exports.

pub use super::accounts::Entity as Accounts;
pub use super::catalog_items::Entity as CatalogItems;
pub use super::ledger_entries::Entity as LedgerEntries;
pub use super::ownership::Entity as Ownership;
