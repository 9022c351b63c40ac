//! Ledger repository: read side of the append-only ledger.
//!
//! Entries are written by the shop store inside its transaction; nothing here
//! modifies them.

use mapmem_core::shop::LedgerEntry;
use mapmem_shared::types::{AccountId, PageRequest};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::entities::ledger_entries;

/// Ledger repository.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// One page of an account's entries, newest first, plus the total count.
    ///
    /// Ordered by `created_at DESC, sequence DESC`, so entries written in the
    /// same instant still page deterministically.
    pub async fn list_by_account(
        &self,
        account_id: AccountId,
        page: PageRequest,
    ) -> Result<(Vec<ledger_entries::Model>, u64), DbErr> {
        let base = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::AccountId.eq(account_id.into_inner()));

        let total = base.clone().count(&self.db).await?;

        let rows = base
            .order_by_desc(ledger_entries::Column::CreatedAt)
            .order_by_desc(ledger_entries::Column::Sequence)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }

    /// Sum of every entry amount for an account; 0 when it has none.
    pub async fn sum_by_account(&self, account_id: AccountId) -> Result<i64, DbErr> {
        let sum = ledger_entries::Entity::find()
            .select_only()
            .column_as(Expr::cust("COALESCE(SUM(amount), 0)::BIGINT"), "total")
            .filter(ledger_entries::Column::AccountId.eq(account_id.into_inner()))
            .into_tuple::<i64>()
            .one(&self.db)
            .await?;

        Ok(sum.unwrap_or(0))
    }
}

/// Converts a stored row into the domain entry.
#[must_use]
pub fn to_domain(row: ledger_entries::Model) -> LedgerEntry {
    LedgerEntry {
        id: row.id.into(),
        sequence: row.sequence,
        account_id: row.account_id.into(),
        actor_id: row.actor_id.map(Into::into),
        kind: row.kind.into(),
        amount: row.amount,
        description: row.description,
        created_at: row.created_at.with_timezone(&chrono::Utc),
    }
}
