//! Core types for Sheetshop.
//!
//! This module provides type-safe wrappers for the storefront's domain concepts.

pub mod access;
pub mod email;
pub mod id;
pub mod identity;
pub mod order;
pub mod price;
pub mod product;

pub use access::AccessGrant;
pub use email::{Email, EmailError};
pub use id::{AccessKey, OrderId, ProductId};
pub use identity::{TelegramUser, UserIdentity};
pub use order::Order;
pub use price::Price;
pub use product::{ButtonStyle, Media, MediaKind, Product, Section};
