//! `SeaORM` active enums.

use mapmem_core::shop::LedgerEntryKind as DomainKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Persisted kind of a ledger entry (`ledger_entry_kind` enum).
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "ledger_entry_kind")]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryKind {
    /// Catalog purchase.
    #[sea_orm(string_value = "purchase")]
    Purchase,
    /// Admin credit.
    #[sea_orm(string_value = "admin_credit")]
    AdminCredit,
    /// Admin debit.
    #[sea_orm(string_value = "admin_debit")]
    AdminDebit,
}

impl From<DomainKind> for LedgerEntryKind {
    fn from(kind: DomainKind) -> Self {
        match kind {
            DomainKind::Purchase => Self::Purchase,
            DomainKind::AdminCredit => Self::AdminCredit,
            DomainKind::AdminDebit => Self::AdminDebit,
        }
    }
}

impl From<LedgerEntryKind> for DomainKind {
    fn from(kind: LedgerEntryKind) -> Self {
        match kind {
            LedgerEntryKind::Purchase => Self::Purchase,
            LedgerEntryKind::AdminCredit => Self::AdminCredit,
            LedgerEntryKind::AdminDebit => Self::AdminDebit,
        }
    }
}
