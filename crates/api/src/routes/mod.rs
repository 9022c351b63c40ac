//! API route definitions.

use axum::{Router, middleware};

use crate::{
    AppState,
    middleware::auth::{auth_middleware, require_admin},
};

pub mod admin;
pub mod currency;
pub mod health;
pub mod shop;

/// Lenient `page`/`limit` query parameters.
///
/// Values are kept as raw strings so that garbage falls back to the
/// defaults instead of rejecting the request.
#[derive(Debug, Default, serde::Deserialize)]
pub struct PageQuery {
    /// Page number (1-based).
    pub page: Option<String>,
    /// Items per page.
    pub limit: Option<String>,
}

impl PageQuery {
    /// Resolves to a valid page request.
    #[must_use]
    pub fn to_page_request(&self) -> mapmem_shared::types::PageRequest {
        mapmem_shared::types::PageRequest::from_query(
            parse_number(self.page.as_deref()),
            parse_number(self.limit.as_deref()),
        )
    }
}

fn parse_number(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|v| v.trim().parse().ok())
}

/// Creates the API router; protected and admin routes get their middleware here.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(shop::protected_routes())
        .merge(currency::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Layers run outside-in: authenticate first, then check the role.
    let admin_routes = Router::new()
        .merge(admin::routes())
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(shop::public_routes())
        .merge(protected_routes)
        .merge(admin_routes)
}
