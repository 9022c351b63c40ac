//! Ownership repository: which items an account holds.
//!
//! Quantities are only ever increased, by purchases inside a shop transaction.

use mapmem_shared::types::{AccountId, ItemId, PageRequest};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};

use crate::entities::{catalog_items, ownership};

/// An ownership row together with the item it refers to.
#[derive(Debug, Clone)]
pub struct OwnedItem {
    /// The ownership row.
    pub ownership: ownership::Model,
    /// The owned catalog item (may be soft-deleted or inactive).
    pub item: catalog_items::Model,
}

/// Ownership repository.
#[derive(Debug, Clone)]
pub struct OwnershipRepository {
    db: DatabaseConnection,
}

impl OwnershipRepository {
    /// Creates a new ownership repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Quantity of an item held by an account, if any.
    pub async fn get_owned(
        &self,
        account_id: AccountId,
        item_id: ItemId,
    ) -> Result<Option<i32>, DbErr> {
        let row = ownership::Entity::find()
            .filter(ownership::Column::AccountId.eq(account_id.into_inner()))
            .filter(ownership::Column::ItemId.eq(item_id.into_inner()))
            .one(&self.db)
            .await?;
        Ok(row.map(|r| r.quantity))
    }

    /// Lists an account's holdings, most recently acquired first.
    pub async fn list_for_account(
        &self,
        account_id: AccountId,
        item_type: Option<&str>,
        page: PageRequest,
    ) -> Result<(Vec<OwnedItem>, u64), DbErr> {
        let mut query = ownership::Entity::find()
            .filter(ownership::Column::AccountId.eq(account_id.into_inner()))
            .join(JoinType::InnerJoin, ownership::Relation::CatalogItems.def());

        if let Some(item_type) = item_type {
            query = query.filter(catalog_items::Column::ItemType.eq(item_type));
        }

        let total = query.clone().count(&self.db).await?;

        let rows = query
            .order_by_desc(ownership::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .select_also(catalog_items::Entity)
            .all(&self.db)
            .await?;

        let items = rows
            .into_iter()
            .filter_map(|(ownership, item)| item.map(|item| OwnedItem { ownership, item }))
            .collect();

        Ok((items, total))
    }
}
