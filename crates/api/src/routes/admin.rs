//! Admin routes: catalog management and manual balance adjustments.
//!
//! Mounted behind both the auth middleware and the admin role check.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{post, put},
};
use mapmem_core::shop::AdminAdjustment;
use mapmem_db::repositories::{CatalogRepository, CreateItemInput, UpdateItemInput};
use mapmem_shared::types::{AccountId, ItemId};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::PageQuery;
use crate::{
    AppState,
    dto::{credit_response, debit_response, item_response, ledger_entry_response},
    error::{catalog_error_response, shop_error_response, validation_error},
    middleware::AuthUser,
};

/// Creates the admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/shop/items", post(create_item))
        .route(
            "/admin/shop/items/{item_id}",
            put(update_item).delete(delete_item),
        )
        .route("/admin/currency/add", post(add_currency))
        .route("/admin/currency/subtract", post(subtract_currency))
        .route(
            "/admin/currency/history",
            axum::routing::get(account_history),
        )
}

/// Request to create a catalog item.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemRequest {
    /// Display name.
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Base64-encoded image.
    #[serde(default)]
    pub image_base64: String,
    /// Unit price.
    #[validate(range(min = 0))]
    pub price: i64,
    /// Initial stock.
    #[validate(range(min = 0))]
    pub stock: i32,
    /// Item type tag, defaults to `marker`.
    #[validate(length(min = 1, max = 50))]
    pub item_type: Option<String>,
}

/// Partial update of a catalog item.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItemRequest {
    /// Display name.
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Base64-encoded image.
    pub image_base64: Option<String>,
    /// Unit price.
    #[validate(range(min = 0))]
    pub price: Option<i64>,
    /// Stock level.
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    /// Item type tag.
    #[validate(length(min = 1, max = 50))]
    pub item_type: Option<String>,
    /// Purchasable flag.
    pub is_active: Option<bool>,
}

/// Request to add or subtract currency.
#[derive(Debug, Deserialize, Validate)]
pub struct AdjustCurrencyRequest {
    /// Target account.
    pub account_id: Uuid,
    /// Positive amount.
    #[validate(range(min = 1))]
    pub amount: i64,
    /// Reason recorded on the ledger entry. Optional free text.
    #[serde(default)]
    #[validate(length(max = 500))]
    pub description: String,
}

/// Query for an account's ledger.
#[derive(Debug, Deserialize)]
pub struct AccountHistoryQuery {
    account_id: Option<String>,
    #[serde(flatten)]
    page: PageQuery,
}

/// POST /admin/shop/items - Create a catalog item.
async fn create_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateItemRequest>,
) -> Response {
    if let Err(e) = payload.validate() {
        return validation_error(e.to_string());
    }

    let input = CreateItemInput {
        name: payload.name,
        description: payload.description,
        image_base64: payload.image_base64,
        price: payload.price,
        stock: payload.stock,
        item_type: payload.item_type,
    };

    match CatalogRepository::new((*state.db).clone())
        .create_item(input)
        .await
    {
        Ok(item) => {
            info!(item_id = %item.id, admin_id = %auth.account_id(), "Shop item created");
            (StatusCode::CREATED, Json(item_response(item))).into_response()
        }
        Err(e) => catalog_error_response(&e),
    }
}

/// PUT `/admin/shop/items/{item_id}` - Update a catalog item.
async fn update_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateItemRequest>,
) -> Response {
    if let Err(e) = payload.validate() {
        return validation_error(e.to_string());
    }

    let input = UpdateItemInput {
        name: payload.name,
        description: payload.description,
        image_base64: payload.image_base64,
        price: payload.price,
        stock: payload.stock,
        item_type: payload.item_type,
        is_active: payload.is_active,
    };

    match CatalogRepository::new((*state.db).clone())
        .update_item(ItemId::from_uuid(item_id), input)
        .await
    {
        Ok(item) => {
            info!(item_id = %item.id, admin_id = %auth.account_id(), "Shop item updated");
            Json(item_response(item)).into_response()
        }
        Err(e) => catalog_error_response(&e),
    }
}

/// DELETE `/admin/shop/items/{item_id}` - Soft-delete a catalog item.
async fn delete_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(item_id): Path<Uuid>,
) -> Response {
    match CatalogRepository::new((*state.db).clone())
        .soft_delete_item(ItemId::from_uuid(item_id))
        .await
    {
        Ok(()) => {
            info!(%item_id, admin_id = %auth.account_id(), "Shop item deleted");
            Json(json!({ "message": "Shop item deleted" })).into_response()
        }
        Err(e) => catalog_error_response(&e),
    }
}

fn adjustment(auth: &AuthUser, payload: AdjustCurrencyRequest) -> AdminAdjustment {
    AdminAdjustment {
        actor_id: auth.account_id(),
        target_account_id: AccountId::from_uuid(payload.account_id),
        amount: payload.amount,
        description: payload.description,
    }
}

/// POST /admin/currency/add - Credit an account.
async fn add_currency(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<AdjustCurrencyRequest>,
) -> Response {
    if let Err(e) = payload.validate() {
        return validation_error(e.to_string());
    }

    match state.shop.admin_credit(adjustment(&auth, payload)).await {
        Ok(receipt) => Json(credit_response(&receipt)).into_response(),
        Err(e) => shop_error_response(&e),
    }
}

/// POST /admin/currency/subtract - Debit an account.
async fn subtract_currency(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<AdjustCurrencyRequest>,
) -> Response {
    if let Err(e) = payload.validate() {
        return validation_error(e.to_string());
    }

    match state.shop.admin_debit(adjustment(&auth, payload)).await {
        Ok(receipt) => Json(debit_response(&receipt)).into_response(),
        Err(e) => shop_error_response(&e),
    }
}

/// GET /admin/currency/history - Any account's ledger.
async fn account_history(
    State(state): State<AppState>,
    Query(query): Query<AccountHistoryQuery>,
) -> Response {
    let Some(account_id) = query
        .account_id
        .as_deref()
        .and_then(|raw| raw.parse::<AccountId>().ok())
    else {
        return validation_error("account_id query parameter must be a valid UUID");
    };

    let page = query.page.to_page_request();
    match state
        .shop
        .list_ledger(account_id, page.page(), page.limit())
        .await
    {
        Ok(entries) => Json(entries.map(ledger_entry_response)).into_response(),
        Err(e) => shop_error_response(&e),
    }
}
