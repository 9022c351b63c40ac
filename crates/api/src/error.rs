//! JSON error responses.
//!
//! Every error body has the same shape:
//!
//! ```json
//! { "error": "insufficient_stock", "message": "...", "details": { ... } }
//! ```
//!
//! `details` is `null` unless the error carries numbers the client can act on.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mapmem_core::shop::ShopError;
use mapmem_db::repositories::CatalogError;
use mapmem_shared::AppError;
use serde_json::{Value, json};
use tracing::error;

/// Builds an error response with the standard body.
pub fn error_response(
    status: StatusCode,
    code: &str,
    message: impl Into<String>,
    details: Option<Value>,
) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
            "details": details,
        })),
    )
        .into_response()
}

/// 500 response for an unexpected failure. The cause is logged, never returned.
pub fn internal_error(context: &str, err: &dyn std::fmt::Display) -> Response {
    error!(error = %err, "{context}");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "An error occurred",
        None,
    )
}

/// 400 response for a malformed request.
pub fn validation_error(message: impl Into<String>) -> Response {
    error_response(StatusCode::BAD_REQUEST, "validation_error", message, None)
}

/// Maps a shop error to its HTTP response.
///
/// Storage failures were already logged by the coordinator.
pub fn shop_error_response(err: &ShopError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let details = match err {
        ShopError::InsufficientStock {
            available,
            requested,
            ..
        } => Some(json!({
            "available_stock": available,
            "requested_quantity": requested,
        })),
        ShopError::InsufficientBalance {
            balance, required, ..
        } => Some(json!({
            "current_balance": balance,
            "required_amount": required,
        })),
        _ => None,
    };

    let message = match err {
        ShopError::Storage(_) => "An error occurred".to_string(),
        ShopError::AccountNotFound(_) => "Account not found".to_string(),
        ShopError::ItemNotFound(_) => "Shop item not found".to_string(),
        ShopError::ItemInactive(_) => "Item is not available for purchase".to_string(),
        ShopError::InsufficientStock { .. } => "Insufficient stock".to_string(),
        ShopError::InsufficientBalance { .. } => "Insufficient balance".to_string(),
        other => other.to_string(),
    };

    error_response(status, err.error_code(), message, details)
}

/// Maps a catalog repository error to its HTTP response.
pub fn catalog_error_response(err: &CatalogError) -> Response {
    match err {
        CatalogError::ItemNotFound(_) => error_response(
            StatusCode::NOT_FOUND,
            "item_not_found",
            "Shop item not found",
            None,
        ),
        CatalogError::Database(e) => internal_error("Catalog query failed", e),
    }
}

/// Maps an application error to its HTTP response.
pub fn app_error_response(err: &AppError) -> Response {
    if matches!(err, AppError::Database(_) | AppError::Internal(_)) {
        error!(error = %err, "request failed");
    }
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    error_response(status, err.error_code(), err.public_message(), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use mapmem_shared::types::{AccountId, ItemId};

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_insufficient_stock_details() {
        let response = shop_error_response(&ShopError::InsufficientStock {
            item_id: ItemId::new(),
            available: 0,
            requested: 1,
        });

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "insufficient_stock");
        assert_eq!(body["details"]["available_stock"], 0);
        assert_eq!(body["details"]["requested_quantity"], 1);
    }

    #[tokio::test]
    async fn test_insufficient_balance_details() {
        let response = shop_error_response(&ShopError::InsufficientBalance {
            account_id: AccountId::new(),
            balance: 100,
            required: 500,
        });

        let body = body_json(response).await;
        assert_eq!(body["details"]["current_balance"], 100);
        assert_eq!(body["details"]["required_amount"], 500);
    }

    #[tokio::test]
    async fn test_storage_error_is_masked() {
        let response = shop_error_response(&ShopError::Storage("pool timed out".into()));

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "internal_error");
        assert_eq!(body["message"], "An error occurred");
        assert!(body["details"].is_null());
    }

    #[tokio::test]
    async fn test_catalog_not_found() {
        let response = catalog_error_response(&CatalogError::ItemNotFound(ItemId::new()));

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "item_not_found");
    }

    #[tokio::test]
    async fn test_app_error_response() {
        let response = app_error_response(&AppError::Forbidden("Admin access required".into()));

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["error"], "forbidden");
        assert_eq!(body["message"], "Admin access required");
    }
}
