//! Identifier newtypes.
//!
//! Product identifiers arrive from a spreadsheet and are compared
//! case- and whitespace-insensitively. [`ProductId`] keeps the trimmed value
//! for display and URLs; [`AccessKey`] is the folded form every match uses.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Spreadsheet row number of the first data row (rows are 1-based and the
/// first row holds the column headers).
pub const FIRST_DATA_ROW: usize = 2;

/// A product identifier as published by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a product ID from a raw value, trimming surrounding whitespace.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_owned())
    }

    /// Synthesize an ID from the zero-based position of a row in the
    /// `getProducts` response.
    ///
    /// The result is unique within one sync but changes when rows are
    /// inserted or reordered upstream.
    #[must_use]
    pub fn from_row_position(index: usize) -> Self {
        Self((index + FIRST_DATA_ROW).to_string())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the key used to match this product against access lists.
    #[must_use]
    pub fn key(&self) -> AccessKey {
        AccessKey::new(&self.0)
    }

    /// Returns true if `other` names the same product, ignoring case and
    /// surrounding whitespace.
    #[must_use]
    pub fn matches(&self, other: &str) -> bool {
        self.key() == AccessKey::new(other)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A normalized (trimmed, lowercased) identifier used for entitlement checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessKey(String);

impl AccessKey {
    /// Token that grants every product.
    pub const WILDCARD: &'static str = "all";

    /// Normalize a raw access token or product ID.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this is the `all` wildcard.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.0 == Self::WILDCARD
    }

    /// Returns true if the token was blank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A locally synthesized order identifier.
///
/// Derived from the submission timestamp and used only to build the payment
/// page URL. It is never confirmed by the gateway and two clients submitting
/// in the same millisecond get the same ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Prefix of every generated order ID.
    pub const PREFIX: &'static str = "ORD-";

    /// Build the order ID for a submission at `at`.
    #[must_use]
    pub fn from_timestamp(at: DateTime<Utc>) -> Self {
        Self(format!("{}{}", Self::PREFIX, at.timestamp_millis()))
    }

    /// Build the order ID for a submission happening now.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_timestamp(Utc::now())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_product_id_trims() {
        let id = ProductId::new("  Course-1 ");
        assert_eq!(id.as_str(), "Course-1");
        assert_eq!(id.to_string(), "Course-1");
    }

    #[test]
    fn test_product_id_key_is_lowercase() {
        assert_eq!(ProductId::new(" ABC ").key().as_str(), "abc");
    }

    #[test]
    fn test_product_id_matches_ignores_case_and_whitespace() {
        let id = ProductId::new("abc");
        assert!(id.matches(" ABC "));
        assert!(id.matches("Abc"));
        assert!(!id.matches("abcd"));
    }

    #[test]
    fn test_from_row_position_accounts_for_header() {
        assert_eq!(ProductId::from_row_position(0).as_str(), "2");
        assert_eq!(ProductId::from_row_position(7).as_str(), "9");
    }

    #[test]
    fn test_access_key_wildcard() {
        assert!(AccessKey::new(" ALL ").is_wildcard());
        assert!(!AccessKey::new("allx").is_wildcard());
        assert!(AccessKey::new("   ").is_empty());
    }

    #[test]
    fn test_order_id_from_timestamp() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            OrderId::from_timestamp(at).as_str(),
            "ORD-1700000000123"
        );
    }

    #[test]
    fn test_order_id_generate_has_prefix() {
        assert!(OrderId::generate().as_str().starts_with(OrderId::PREFIX));
    }
}
