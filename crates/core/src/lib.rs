//! Core business logic for Map Memories.
//!
//! This crate has no web or database dependencies. Storage is reached
//! through the ports in [`shop::ports`], so the same coordinator runs over
//! PostgreSQL in production and over the in-memory store in tests.
//!
//! # Modules
//!
//! - `shop` - Purchases, admin balance adjustments and the currency ledger

pub mod shop;
