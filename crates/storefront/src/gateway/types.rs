//! Wire types for the spreadsheet gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sheetshop_core::{Order, UserIdentity};

/// One spreadsheet row as the gateway returns it: column header → cell.
///
/// Headers are typed by hand, so keys vary in case and surrounding
/// whitespace. Fold them before lookup.
pub type RawRow = serde_json::Map<String, serde_json::Value>;

/// Body of the `getStats` action.
///
/// Missing arrays are treated as empty; rows are kept raw and folded by the
/// dashboard conversion.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayStats {
    #[serde(default)]
    pub sessions: Vec<serde_json::Value>,
    #[serde(default)]
    pub leads: Vec<serde_json::Value>,
}

/// Event pinged to the gateway with a JSON `POST`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GatewayEvent {
    /// A view was entered (also sent on app start).
    Session(SessionPing),
    /// A checkout form was submitted.
    Order(OrderPing),
}

/// Payload of a `session` ping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPing {
    pub user_id: String,
    pub username: String,
    pub page: String,
    pub timestamp: DateTime<Utc>,
}

/// Payload of an `order` ping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPing {
    pub order_id: String,
    pub product_id: String,
    pub product_title: String,
    pub price: String,
    pub name: String,
    pub email: String,
    pub user_id: String,
    pub username: String,
    pub timestamp: DateTime<Utc>,
}

impl GatewayEvent {
    /// Build a `session` ping for `identity` entering `page`.
    #[must_use]
    pub fn session(identity: &UserIdentity, page: &str) -> Self {
        Self::Session(SessionPing {
            user_id: identity.gateway_id(),
            username: identity.username().unwrap_or_default().to_string(),
            page: page.to_string(),
            timestamp: Utc::now(),
        })
    }

    /// Build an `order` ping from a submitted order.
    #[must_use]
    pub fn order(order: &Order) -> Self {
        Self::Order(OrderPing {
            order_id: order.order_id.to_string(),
            product_id: order.product_id.to_string(),
            product_title: order.product_title.clone(),
            price: order.price.to_string(),
            name: order.customer_name.clone(),
            email: order.customer_email.to_string(),
            user_id: order.customer.gateway_id(),
            username: order.customer.username().unwrap_or_default().to_string(),
            timestamp: order.created_at,
        })
    }

    /// Event type as sent in the `type` field.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Session(_) => "session",
            Self::Order(_) => "order",
        }
    }
}
