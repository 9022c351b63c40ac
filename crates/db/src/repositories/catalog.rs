//! Catalog repository for shop item management.
//!
//! Soft-deleted items (`deleted_at IS NOT NULL`) are invisible to every query
//! here, the same way they are invisible to purchases.

use mapmem_shared::types::{ItemId, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entities::catalog_items;

/// Item type assigned when the caller does not give one.
pub const DEFAULT_ITEM_TYPE: &str = "marker";

/// Error types for catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Item not found or soft-deleted.
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a catalog item.
#[derive(Debug, Clone)]
pub struct CreateItemInput {
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Base64-encoded image.
    pub image_base64: String,
    /// Unit price.
    pub price: i64,
    /// Initial stock.
    pub stock: i32,
    /// Item type tag.
    pub item_type: Option<String>,
}

/// Partial update of a catalog item. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateItemInput {
    /// Display name.
    pub name: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Base64-encoded image.
    pub image_base64: Option<String>,
    /// Unit price.
    pub price: Option<i64>,
    /// Stock level.
    pub stock: Option<i32>,
    /// Item type tag.
    pub item_type: Option<String>,
    /// Purchasable flag.
    pub is_active: Option<bool>,
}

/// Filter options for listing items.
#[derive(Debug, Clone)]
pub struct ItemFilter {
    /// Only items with this type.
    pub item_type: Option<String>,
    /// Hide deactivated items.
    pub active_only: bool,
}

impl Default for ItemFilter {
    fn default() -> Self {
        Self {
            item_type: None,
            active_only: true,
        }
    }
}

/// Catalog repository.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    db: DatabaseConnection,
}

impl CatalogRepository {
    /// Creates a new catalog repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an active item.
    pub async fn create_item(
        &self,
        input: CreateItemInput,
    ) -> Result<catalog_items::Model, CatalogError> {
        let now = chrono::Utc::now().into();
        let item = catalog_items::ActiveModel {
            id: Set(ItemId::new().into_inner()),
            name: Set(input.name),
            description: Set(input.description),
            image_base64: Set(input.image_base64),
            price: Set(input.price),
            stock: Set(input.stock),
            item_type: Set(input
                .item_type
                .unwrap_or_else(|| DEFAULT_ITEM_TYPE.to_string())),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        Ok(item.insert(&self.db).await?)
    }

    /// Finds a live item by ID.
    pub async fn find_by_id(&self, id: ItemId) -> Result<catalog_items::Model, CatalogError> {
        catalog_items::Entity::find_by_id(id.into_inner())
            .filter(catalog_items::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?
            .ok_or(CatalogError::ItemNotFound(id))
    }

    /// Applies a partial update.
    pub async fn update_item(
        &self,
        id: ItemId,
        input: UpdateItemInput,
    ) -> Result<catalog_items::Model, CatalogError> {
        let item = self.find_by_id(id).await?;
        let mut active: catalog_items::ActiveModel = item.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(image_base64) = input.image_base64 {
            active.image_base64 = Set(image_base64);
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(stock) = input.stock {
            active.stock = Set(stock);
        }
        if let Some(item_type) = input.item_type {
            active.item_type = Set(item_type);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Soft-deletes an item. Ownership rows referencing it are kept.
    pub async fn soft_delete_item(&self, id: ItemId) -> Result<(), CatalogError> {
        let item = self.find_by_id(id).await?;
        let now = chrono::Utc::now().into();
        let mut active: catalog_items::ActiveModel = item.into();
        active.deleted_at = Set(Some(now));
        active.updated_at = Set(now);
        active.update(&self.db).await?;
        Ok(())
    }

    /// Lists live items, newest first.
    pub async fn list_items(
        &self,
        filter: &ItemFilter,
        page: PageRequest,
    ) -> Result<(Vec<catalog_items::Model>, u64), CatalogError> {
        let mut query =
            catalog_items::Entity::find().filter(catalog_items::Column::DeletedAt.is_null());

        if filter.active_only {
            query = query.filter(catalog_items::Column::IsActive.eq(true));
        }
        if let Some(item_type) = &filter.item_type {
            query = query.filter(catalog_items::Column::ItemType.eq(item_type.as_str()));
        }

        let total = query.clone().count(&self.db).await?;
        let items = query
            .order_by_desc(catalog_items::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((items, total))
    }
}
