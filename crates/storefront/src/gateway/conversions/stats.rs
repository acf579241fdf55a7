//! `getStats` aggregation for the admin dashboard.
//!
//! Session and lead rows are written by this storefront's own pings, but an
//! operator can edit the sheet by hand, so rows are folded like catalog rows
//! and missing cells degrade to empty values.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use sheetshop_core::Price;

use super::FoldedRow;
use crate::gateway::GatewayStats;

/// How many products the dashboard ranks.
pub const TOP_PRODUCTS: usize = 5;

/// How many leads the dashboard lists.
pub const LATEST_LEADS: usize = 10;

/// Aggregated analytics shown on `/admin`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_sessions: usize,
    pub unique_users: usize,
    pub total_leads: usize,
    pub revenue: Price,
    pub top_products: Vec<LeadCount>,
    pub latest_leads: Vec<LeadRow>,
}

/// Leads for one product title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadCount {
    pub product: String,
    pub count: usize,
    pub revenue: Price,
}

/// One row of the `leads` sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRow {
    pub order_id: String,
    pub product: String,
    pub price: Price,
    pub name: String,
    pub email: String,
    pub username: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl LeadRow {
    fn from_row(row: &FoldedRow<'_>) -> Self {
        let product = match row.text(&["producttitle"]) {
            title if title.is_empty() => row.text(&["productid"]),
            title => title,
        };

        Self {
            order_id: row.text(&["orderid"]),
            product,
            price: row.value(&["price"]).map_or(Price::ZERO, Price::from_json),
            name: row.text(&["name"]),
            email: row.text(&["email"]),
            username: row.text(&["username"]),
            timestamp: parse_timestamp(&row.text(&["timestamp", "date"])),
        }
    }

    /// Timestamp formatted for the dashboard table.
    #[must_use]
    pub fn time_display(&self) -> String {
        self.timestamp
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default()
    }
}

/// Aggregate raw `getStats` rows. Non-object rows are ignored.
#[must_use]
pub fn convert_stats(stats: &GatewayStats) -> DashboardSummary {
    let sessions: Vec<FoldedRow<'_>> = object_rows(&stats.sessions).collect();
    let unique_users = sessions
        .iter()
        .map(|row| row.text(&["userid"]))
        .filter(|id| !id.is_empty())
        .collect::<HashSet<_>>()
        .len();

    let leads: Vec<LeadRow> = object_rows(&stats.leads)
        .map(|row| LeadRow::from_row(&row))
        .collect();

    let revenue = leads
        .iter()
        .fold(Price::ZERO, |total, lead| total.saturating_add(lead.price));

    DashboardSummary {
        total_sessions: sessions.len(),
        unique_users,
        total_leads: leads.len(),
        revenue,
        top_products: top_products(&leads),
        latest_leads: latest_leads(&leads),
    }
}

fn object_rows(rows: &[Value]) -> impl Iterator<Item = FoldedRow<'_>> {
    rows.iter().filter_map(Value::as_object).map(FoldedRow::new)
}

fn top_products(leads: &[LeadRow]) -> Vec<LeadCount> {
    let mut counts: HashMap<&str, LeadCount> = HashMap::new();
    for lead in leads.iter().filter(|lead| !lead.product.is_empty()) {
        let entry = counts.entry(&lead.product).or_insert_with(|| LeadCount {
            product: lead.product.clone(),
            count: 0,
            revenue: Price::ZERO,
        });
        entry.count += 1;
        entry.revenue = entry.revenue.saturating_add(lead.price);
    }

    let mut ranked: Vec<LeadCount> = counts.into_values().collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.product.cmp(&b.product)));
    ranked.truncate(TOP_PRODUCTS);
    ranked
}

/// Newest first. Rows are appended to the sheet, so undated rows fall back
/// to sheet order (later rows are newer) and sort after dated ones.
fn latest_leads(leads: &[LeadRow]) -> Vec<LeadRow> {
    let mut latest: Vec<LeadRow> = leads.iter().rev().cloned().collect();
    latest.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    latest.truncate(LATEST_LEADS);
    latest
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
