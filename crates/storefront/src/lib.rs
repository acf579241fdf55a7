//! Sheetshop storefront library.
//!
//! A Telegram Mini App storefront whose catalog, purchases and analytics live
//! in a spreadsheet behind a webhook gateway. Exposed as a library so the
//! binary and the integration tests share one router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod gateway;
pub mod markup;
pub mod middleware;
pub mod registry;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod view;
