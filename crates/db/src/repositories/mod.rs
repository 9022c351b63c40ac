//! Repository implementations for data access.

pub mod account;
pub mod balance;
pub mod catalog;
pub mod ledger;
pub mod ownership;

pub use account::{AccountError, AccountRepository};
pub use balance::{BalanceError, BalanceRepository};
pub use catalog::{CatalogError, CatalogRepository, CreateItemInput, ItemFilter, UpdateItemInput};
pub use ledger::LedgerRepository;
pub use ownership::{OwnedItem, OwnershipRepository};
