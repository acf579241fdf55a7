//! Per-user product entitlements.

use std::collections::HashSet;

use super::id::{AccessKey, ProductId};
use super::product::Product;

/// The set of products a user may open.
///
/// Built from the gateway's access list. Tokens are normalized like product
/// IDs, so `" ABC "` grants product `abc`; the token `all` grants everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessGrant {
    keys: HashSet<AccessKey>,
    wildcard: bool,
}

impl AccessGrant {
    /// A grant that owns nothing.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// A grant that owns every product.
    #[must_use]
    pub fn all() -> Self {
        Self {
            keys: HashSet::new(),
            wildcard: true,
        }
    }

    /// Build a grant from raw access tokens. Blank tokens are dropped.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut grant = Self::none();
        for token in tokens {
            let key = AccessKey::new(token.as_ref());
            if key.is_empty() {
                continue;
            }
            if key.is_wildcard() {
                grant.wildcard = true;
            }
            grant.keys.insert(key);
        }
        grant
    }

    /// Returns true if the grant covers the product with this ID.
    #[must_use]
    pub fn grants(&self, id: &ProductId) -> bool {
        self.wildcard || self.keys.contains(&id.key())
    }

    /// Returns true if the grant contains the `all` wildcard.
    #[must_use]
    pub const fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Returns true if the grant owns nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.wildcard && self.keys.is_empty()
    }

    /// Number of distinct tokens (the wildcard counts as one).
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Sorted tokens, for logs and the JSON API.
    #[must_use]
    pub fn tokens(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = self.keys.iter().map(AccessKey::as_str).collect();
        tokens.sort_unstable();
        tokens
    }

    /// The products from `catalog` this grant covers, in catalog order.
    #[must_use]
    pub fn owned<'a>(&self, catalog: &'a [Product]) -> Vec<&'a Product> {
        catalog.iter().filter(|p| self.grants(&p.id)).collect()
    }
}
