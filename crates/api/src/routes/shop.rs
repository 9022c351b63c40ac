//! Shop routes: catalog browsing, purchases and owned items.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use mapmem_core::shop::PurchaseRequest;
use mapmem_db::repositories::{CatalogRepository, ItemFilter, OwnershipRepository};
use mapmem_shared::types::{ItemId, PageResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::PageQuery;
use crate::{
    AppState,
    dto::{item_response, owned_item_response, purchase_response},
    error::{catalog_error_response, internal_error, shop_error_response},
    middleware::AuthUser,
};

/// Catalog routes open to anyone.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/shop/items", get(list_items))
        .route("/shop/items/{item_id}", get(get_item))
}

/// Routes for the authenticated caller (auth middleware applied externally).
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/shop/purchase", post(purchase))
        .route("/shop/my-items", get(my_items))
}

/// Query parameters for the catalog listing.
#[derive(Debug, Deserialize)]
pub struct ItemListQuery {
    #[serde(flatten)]
    page: PageQuery,
    item_type: Option<String>,
    active_only: Option<String>,
}

/// Query parameters for owned items.
#[derive(Debug, Deserialize)]
pub struct MyItemsQuery {
    #[serde(flatten)]
    page: PageQuery,
    item_type: Option<String>,
}

/// Purchase request body.
#[derive(Debug, Deserialize)]
pub struct PurchaseBody {
    /// Item to buy.
    pub item_id: Uuid,
    /// Units to buy.
    pub quantity: i32,
}

/// GET /shop/items - List catalog items.
async fn list_items(State(state): State<AppState>, Query(query): Query<ItemListQuery>) -> Response {
    let page = query.page.to_page_request();
    let filter = ItemFilter {
        item_type: query.item_type.filter(|t| !t.is_empty()),
        // Anything but an explicit "false" keeps deactivated items hidden.
        active_only: query.active_only.as_deref() != Some("false"),
    };

    match CatalogRepository::new((*state.db).clone())
        .list_items(&filter, page)
        .await
    {
        Ok((items, total)) => {
            let items = items.into_iter().map(item_response).collect();
            Json(PageResponse::new(items, page, total)).into_response()
        }
        Err(e) => catalog_error_response(&e),
    }
}

/// GET `/shop/items/{item_id}` - Get one catalog item.
async fn get_item(State(state): State<AppState>, Path(item_id): Path<Uuid>) -> Response {
    match CatalogRepository::new((*state.db).clone())
        .find_by_id(ItemId::from_uuid(item_id))
        .await
    {
        Ok(item) => Json(item_response(item)).into_response(),
        Err(e) => catalog_error_response(&e),
    }
}

/// POST /shop/purchase - Buy an item with the caller's balance.
async fn purchase(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<PurchaseBody>,
) -> Response {
    let request = PurchaseRequest {
        account_id: auth.account_id(),
        item_id: ItemId::from_uuid(body.item_id),
        quantity: body.quantity,
    };

    match state.shop.purchase(request).await {
        Ok(receipt) => Json(purchase_response(receipt)).into_response(),
        Err(e) => shop_error_response(&e),
    }
}

/// GET /shop/my-items - Items held by the caller.
async fn my_items(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<MyItemsQuery>,
) -> Response {
    let page = query.page.to_page_request();
    let item_type = query.item_type.as_deref().filter(|t| !t.is_empty());

    match OwnershipRepository::new((*state.db).clone())
        .list_for_account(auth.account_id(), item_type, page)
        .await
    {
        Ok((owned, total)) => {
            let owned = owned.into_iter().map(owned_item_response).collect();
            Json(PageResponse::new(owned, page, total)).into_response()
        }
        Err(e) => internal_error("Failed to list owned items", &e),
    }
}
