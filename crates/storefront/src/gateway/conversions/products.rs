//! Catalog row normalization.
//!
//! Turns `getProducts` rows into [`Product`] records. The defaulting rules
//! here are the storefront's contract with whoever edits the spreadsheet:
//!
//! | field | rule |
//! |---|---|
//! | `id` | trimmed cell, else the row's spreadsheet position |
//! | `price` | first number in the cell, else 0 |
//! | `mediaType` | `video` (any case) → video, anything else → image |
//! | `section` | contains `bonus` → bonus, else contains `portfolio` → portfolio, else shop |
//! | `useDetailModal` | `true` (any case) → true, anything else → false |
//! | `buttonText` | cell, else `Open` |
//! | other text | cell, else empty |

use serde_json::Value;

use sheetshop_core::product::DEFAULT_BUTTON_TEXT;
use sheetshop_core::{ButtonStyle, Media, MediaKind, Price, Product, ProductId, Section};

use super::FoldedRow;
use crate::gateway::types::RawRow;

/// Folded column names, aliases in priority order.
mod keys {
    pub const ID: &[&str] = &["id"];
    pub const TITLE: &[&str] = &["title"];
    pub const DESCRIPTION: &[&str] = &["description"];
    pub const CATEGORY: &[&str] = &["category"];
    pub const PRICE: &[&str] = &["price"];
    pub const MEDIA_URL: &[&str] = &["mediaurl", "media", "image"];
    pub const MEDIA_TYPE: &[&str] = &["mediatype"];
    pub const SECTION: &[&str] = &["section"];
    pub const BUTTON_TEXT: &[&str] = &["buttontext"];
    pub const BUTTON_COLOR: &[&str] = &["buttoncolor"];
    pub const USE_DETAIL_MODAL: &[&str] = &["usedetailmodal"];
    pub const FULL_DESCRIPTION: &[&str] = &["fulldescription"];
    pub const GALLERY: &[&str] = &["gallery"];
    pub const SECRET_CONTENT: &[&str] = &["secretcontent"];
    pub const EXTERNAL_LINK: &[&str] = &["externallink"];
    pub const PAYMENT_ID: &[&str] = &["paymentid", "paymenturl"];
}

/// Normalize every object row of a `getProducts` response.
///
/// Non-object entries are skipped but still consume their position, so
/// synthesized IDs keep matching spreadsheet row numbers.
#[must_use]
pub fn convert_rows(rows: &[Value]) -> Vec<Product> {
    rows.iter()
        .enumerate()
        .filter_map(|(index, row)| match row {
            Value::Object(map) => Some(convert_row(index, map)),
            other => {
                tracing::debug!(index, kind = %json_kind(other), "Skipping non-object catalog row");
                None
            }
        })
        .collect()
}

/// Normalize one row at zero-based position `index`.
#[must_use]
pub fn convert_row(index: usize, row: &RawRow) -> Product {
    let row = FoldedRow::new(row);

    let id = match row.text(keys::ID) {
        id if id.is_empty() => ProductId::from_row_position(index),
        id => ProductId::new(&id),
    };

    let button_text = match row.text(keys::BUTTON_TEXT) {
        text if text.is_empty() => DEFAULT_BUTTON_TEXT.to_string(),
        text => text,
    };

    Product {
        id,
        title: row.text(keys::TITLE),
        description: row.raw_text(keys::DESCRIPTION),
        category: row.text(keys::CATEGORY),
        price: row.value(keys::PRICE).map_or(Price::ZERO, Price::from_json),
        media: Media {
            url: row.text(keys::MEDIA_URL),
            kind: media_kind(&row.text(keys::MEDIA_TYPE)),
        },
        section: classify_section(&row.text(keys::SECTION)),
        button: ButtonStyle {
            text: button_text,
            color: row.text(keys::BUTTON_COLOR),
        },
        use_detail_modal: is_true(&row.text(keys::USE_DETAIL_MODAL)),
        full_description: row.raw_text(keys::FULL_DESCRIPTION),
        gallery: split_gallery(&row.raw_text(keys::GALLERY)),
        secret_content: row.raw_text(keys::SECRET_CONTENT),
        external_link: row.text(keys::EXTERNAL_LINK),
        payment_id: row.text(keys::PAYMENT_ID),
    }
}

/// Classify the free-text section column.
///
/// `bonus` is checked before `portfolio`, so text naming both is a bonus.
#[must_use]
pub fn classify_section(raw: &str) -> Section {
    let lower = raw.to_lowercase();
    if lower.contains("bonus") {
        Section::Bonus
    } else if lower.contains("portfolio") {
        Section::Portfolio
    } else {
        Section::Shop
    }
}

/// Only an exact (case-insensitive) `video` selects video.
#[must_use]
pub fn media_kind(raw: &str) -> MediaKind {
    if raw.trim().eq_ignore_ascii_case("video") {
        MediaKind::Video
    } else {
        MediaKind::Image
    }
}

fn is_true(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

/// Gallery cells list URLs separated by commas or line breaks.
fn split_gallery(raw: &str) -> Vec<String> {
    raw.split([',', '\n'])
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(String::from)
        .collect()
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
