//! `SeaORM` entity definitions.

pub mod prelude;

pub mod accounts;
pub mod catalog_items;
pub mod ledger_entries;
pub mod ownership;
pub mod sea_orm_active_enums;
