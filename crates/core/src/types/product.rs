//! Canonical product record.
//!
//! Produced by the catalog normalizer from loosely typed spreadsheet rows.
//! Serialized (camelCase) for the disposable catalog cache and the JSON API.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Default label of a product's call-to-action button.
pub const DEFAULT_BUTTON_TEXT: &str = "Open";

/// Storefront section a product is listed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// Main catalog.
    #[default]
    Shop,
    /// Portfolio / showcase items.
    Portfolio,
    /// Bonus materials.
    Bonus,
}

impl Section {
    /// Lowercase name used in templates and the JSON API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shop => "shop",
            Self::Portfolio => "portfolio",
            Self::Bonus => "bonus",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of the product's primary media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
}

/// Primary media of a product card.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Media {
    /// Media URL (may be empty).
    pub url: String,
    /// Image or video.
    pub kind: MediaKind,
}

/// Call-to-action button appearance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonStyle {
    /// Button label.
    pub text: String,
    /// CSS color (empty = theme default).
    pub color: String,
}

impl Default for ButtonStyle {
    fn default() -> Self {
        Self {
            text: DEFAULT_BUTTON_TEXT.to_string(),
            color: String::new(),
        }
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: Price,
    pub media: Media,
    pub section: Section,
    pub button: ButtonStyle,
    /// Open the detail overlay instead of going straight to checkout.
    pub use_detail_modal: bool,
    /// Long description for the detail overlay (may embed media directives).
    pub full_description: String,
    /// Extra media URLs for the detail overlay.
    pub gallery: Vec<String>,
    /// Content revealed to owners only.
    pub secret_content: String,
    /// External page the button links to, if any.
    pub external_link: String,
    /// Payment provider identifier or payment link for this product.
    pub payment_id: String,
}

impl Product {
    /// Create a product with the given ID and title and defaults elsewhere.
    #[must_use]
    pub fn new(id: ProductId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            category: String::new(),
            price: Price::ZERO,
            media: Media::default(),
            section: Section::Shop,
            button: ButtonStyle::default(),
            use_detail_modal: false,
            full_description: String::new(),
            gallery: Vec::new(),
            secret_content: String::new(),
            external_link: String::new(),
            payment_id: String::new(),
        }
    }

    /// Returns true if the product has owner-only content.
    #[must_use]
    pub fn has_secret(&self) -> bool {
        !self.secret_content.trim().is_empty()
    }

    /// Text for the detail overlay: the full description, or the short one.
    #[must_use]
    pub fn detail_text(&self) -> &str {
        if self.full_description.trim().is_empty() {
            &self.description
        } else {
            &self.full_description
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let product = Product::new(ProductId::new("p1"), "Course");
        assert_eq!(product.section, Section::Shop);
        assert_eq!(product.media.kind, MediaKind::Image);
        assert_eq!(product.button.text, "Open");
        assert!(product.price.is_zero());
        assert!(!product.has_secret());
    }

    #[test]
    fn test_detail_text_prefers_full_description() {
        let mut product = Product::new(ProductId::new("p1"), "Course");
        product.description = "short".to_string();
        assert_eq!(product.detail_text(), "short");
        product.full_description = "long".to_string();
        assert_eq!(product.detail_text(), "long");
    }

    #[test]
    fn test_serde_camel_case_roundtrip() {
        let mut product = Product::new(ProductId::new("p1"), "Course");
        product.use_detail_modal = true;
        product.section = Section::Bonus;

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["useDetailModal"], true);
        assert_eq!(json["section"], "bonus");
        assert_eq!(json["media"]["kind"], "image");

        let back: Product = serde_json::from_value(json).unwrap();
        assert_eq!(back, product);
    }
}
