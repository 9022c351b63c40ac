//! Currency routes for the authenticated caller.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
};

use super::PageQuery;
use crate::{
    AppState,
    dto::{BalanceResponse, ledger_entry_response},
    error::shop_error_response,
    middleware::AuthUser,
};

/// Creates the currency router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/currency/balance", get(balance))
        .route("/currency/history", get(history))
}

/// GET /currency/balance - The caller's balance.
async fn balance(State(state): State<AppState>, auth: AuthUser) -> Response {
    let account_id = auth.account_id();
    match state.shop.balance(account_id).await {
        Ok(balance) => Json(BalanceResponse {
            account_id: account_id.into_inner(),
            balance,
        })
        .into_response(),
        Err(e) => shop_error_response(&e),
    }
}

/// GET /currency/history - The caller's ledger, newest first.
async fn history(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> Response {
    let page = query.to_page_request();
    match state
        .shop
        .list_ledger(auth.account_id(), page.page(), page.limit())
        .await
    {
        Ok(entries) => Json(entries.map(ledger_entry_response)).into_response(),
        Err(e) => shop_error_response(&e),
    }
}
