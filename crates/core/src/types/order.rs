//! Checkout order record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::{OrderId, ProductId};
use super::identity::UserIdentity;
use super::price::Price;
use super::product::Product;

/// An order submitted from the checkout form.
///
/// Write-only: it is reported to the gateway and then forgotten. Payment
/// status is tracked by the external payment page, never here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_title: String,
    pub price: Price,
    pub customer_name: String,
    pub customer_email: Email,
    pub customer: UserIdentity,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create an order for `product`, stamped with the current time.
    #[must_use]
    pub fn new(product: &Product, customer_name: &str, customer_email: Email, customer: UserIdentity) -> Self {
        let created_at = Utc::now();
        Self {
            order_id: OrderId::from_timestamp(created_at),
            product_id: product.id.clone(),
            product_title: product.title.clone(),
            price: product.price,
            customer_name: customer_name.trim().to_string(),
            customer_email,
            customer,
            created_at,
        }
    }
}
