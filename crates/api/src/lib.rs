//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for the shop, currency and admin surfaces
//! - Authentication and admin-role middleware
//! - JSON error responses and response mapping

pub mod dto;
pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use mapmem_core::shop::ShopService;
use mapmem_shared::JwtService;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, used by the catalog and ownership reads.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Purchases, balance adjustments and ledger reads.
    pub shop: Arc<dyn ShopService>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
