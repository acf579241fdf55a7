//! Sheetshop Core - Shared domain types.
//!
//! This crate provides the types used across the Sheetshop components:
//! - `storefront` - Telegram Mini App server (catalog, checkout, admin)
//! - `integration-tests` - End-to-end tests against a mock gateway
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients. Normalization of gateway rows lives in the storefront crate;
//! the canonical shapes it produces live here.
//!
//! # Modules
//!
//! - [`types`] - Products, identifiers, access grants, identities, orders

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
