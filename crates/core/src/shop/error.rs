//! Shop error types.

use mapmem_shared::types::{AccountId, ItemId, PageError};
use thiserror::Error;

/// Broad classification of a [`ShopError`], used by callers that only need
/// to know what class of failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShopErrorKind {
    /// Account or item does not exist.
    NotFound,
    /// Item exists but is not purchasable.
    InvalidState,
    /// Not enough stock for the requested quantity.
    InsufficientStock,
    /// Not enough currency for the requested change.
    InsufficientBalance,
    /// Caller supplied a malformed value.
    InvalidInput,
    /// Persistence failed; nothing was committed.
    Storage,
}

/// Errors that can occur during shop and currency operations.
#[derive(Debug, Error)]
pub enum ShopError {
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Item not found or soft-deleted.
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    /// Item is deactivated.
    #[error("Item {0} is not available for purchase")]
    ItemInactive(ItemId),

    /// Requested more units than the item has left.
    #[error("Insufficient stock for item {item_id}: available {available}, requested {requested}")]
    InsufficientStock {
        /// The item.
        item_id: ItemId,
        /// Units left.
        available: i32,
        /// Units requested.
        requested: i32,
    },

    /// Balance too low.
    #[error("Insufficient balance for account {account_id}: balance {balance}, required {required}")]
    InsufficientBalance {
        /// The account.
        account_id: AccountId,
        /// Current balance.
        balance: i64,
        /// Amount the operation needed.
        required: i64,
    },

    /// Purchase quantity below 1.
    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(i32),

    /// Admin adjustment amount not positive.
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(i64),

    /// Page or page size out of range.
    #[error("Invalid pagination: {0}")]
    InvalidPagination(#[from] PageError),

    /// Arithmetic on a balance or cost overflowed `i64`.
    #[error("Amount overflow")]
    AmountOverflow,

    /// Storage failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ShopError {
    /// Returns the failure class.
    #[must_use]
    pub const fn kind(&self) -> ShopErrorKind {
        match self {
            Self::AccountNotFound(_) | Self::ItemNotFound(_) => ShopErrorKind::NotFound,
            Self::ItemInactive(_) => ShopErrorKind::InvalidState,
            Self::InsufficientStock { .. } => ShopErrorKind::InsufficientStock,
            Self::InsufficientBalance { .. } => ShopErrorKind::InsufficientBalance,
            Self::InvalidQuantity(_)
            | Self::InvalidAmount(_)
            | Self::InvalidPagination(_)
            | Self::AmountOverflow => ShopErrorKind::InvalidInput,
            Self::Storage(_) => ShopErrorKind::Storage,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AccountNotFound(_) => "account_not_found",
            Self::ItemNotFound(_) => "item_not_found",
            Self::ItemInactive(_) => "item_inactive",
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::InvalidQuantity(_) => "invalid_quantity",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::InvalidPagination(_) => "invalid_pagination",
            Self::AmountOverflow => "amount_overflow",
            Self::Storage(_) => "internal_error",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self.kind() {
            ShopErrorKind::NotFound => 404,
            ShopErrorKind::InvalidState => 409,
            // Shortfalls are reported as bad requests, same as input errors
            ShopErrorKind::InsufficientStock
            | ShopErrorKind::InsufficientBalance
            | ShopErrorKind::InvalidInput => 400,
            ShopErrorKind::Storage => 500,
        }
    }

    /// Returns true for failures caused by storage rather than by the request.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ShopError::AccountNotFound(AccountId::new()), 404, "account_not_found")]
    #[case(ShopError::ItemNotFound(ItemId::new()), 404, "item_not_found")]
    #[case(ShopError::ItemInactive(ItemId::new()), 409, "item_inactive")]
    #[case(
        ShopError::InsufficientStock { item_id: ItemId::new(), available: 1, requested: 2 },
        400,
        "insufficient_stock"
    )]
    #[case(
        ShopError::InsufficientBalance { account_id: AccountId::new(), balance: 5, required: 9 },
        400,
        "insufficient_balance"
    )]
    #[case(ShopError::InvalidQuantity(0), 400, "invalid_quantity")]
    #[case(ShopError::InvalidAmount(-3), 400, "invalid_amount")]
    #[case(ShopError::InvalidPagination(PageError::InvalidPage(0)), 400, "invalid_pagination")]
    #[case(ShopError::AmountOverflow, 400, "amount_overflow")]
    #[case(ShopError::Storage("down".into()), 500, "internal_error")]
    fn test_status_and_code(#[case] err: ShopError, #[case] status: u16, #[case] code: &str) {
        assert_eq!(err.http_status_code(), status);
        assert_eq!(err.error_code(), code);
    }

    #[test]
    fn test_kind() {
        assert_eq!(ShopError::ItemInactive(ItemId::new()).kind(), ShopErrorKind::InvalidState);
        assert_eq!(ShopError::AmountOverflow.kind(), ShopErrorKind::InvalidInput);
        assert!(ShopError::Storage(String::new()).is_storage());
        assert!(!ShopError::InvalidAmount(0).is_storage());
    }

    #[test]
    fn test_display_includes_shortfall() {
        let err = ShopError::InsufficientBalance {
            account_id: AccountId::new(),
            balance: 30,
            required: 50,
        };
        let msg = err.to_string();
        assert!(msg.contains("balance 30"));
        assert!(msg.contains("required 50"));
    }
}
