//! Checkout form validation and payment page links.

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use sheetshop_core::{Email, EmailError, Order, Product};

use crate::config::PaymentConfig;

/// Value browsers send for a ticked checkbox.
const CHECKED: &str = "on";

/// Raw checkout form as posted. Unticked checkboxes are absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub consent_offer: Option<String>,
    #[serde(default)]
    pub consent_privacy: Option<String>,
}

/// Which fields failed validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvalidFields {
    pub name: bool,
    pub email: bool,
    pub consent_offer: bool,
    pub consent_privacy: bool,
}

impl InvalidFields {
    #[must_use]
    pub const fn any(&self) -> bool {
        self.name || self.email || self.consent_offer || self.consent_privacy
    }
}

/// The form cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("checkout form is incomplete")]
pub struct CheckoutError {
    pub fields: InvalidFields,
    /// Why the email was rejected, when it was.
    pub email: Option<EmailError>,
}

/// A form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCheckout {
    pub name: String,
    pub email: Email,
}

impl CheckoutForm {
    /// Check the form: a name, a valid email, and both consents.
    ///
    /// # Errors
    ///
    /// Returns every failing field at once so the form can mark them all.
    pub fn validate(&self) -> Result<ValidCheckout, CheckoutError> {
        let name = self.name.trim();
        let email = Email::parse(&self.email);

        let fields = InvalidFields {
            name: name.is_empty(),
            email: email.is_err(),
            consent_offer: !is_checked(self.consent_offer.as_deref()),
            consent_privacy: !is_checked(self.consent_privacy.as_deref()),
        };

        match email {
            Ok(email) if !fields.any() => Ok(ValidCheckout {
                name: name.to_string(),
                email,
            }),
            Ok(_) => Err(CheckoutError {
                fields,
                email: None,
            }),
            Err(e) => Err(CheckoutError {
                fields,
                email: Some(e),
            }),
        }
    }
}

fn is_checked(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case(CHECKED) || v.eq_ignore_ascii_case("true"))
}

/// Hosted payment page for `order`.
///
/// A product whose payment ID is an absolute http(s) URL uses it; anything
/// else falls back to the configured payment page. The order ID and email
/// are appended as `order_id` and `customer_email`.
#[must_use]
pub fn payment_url(config: &PaymentConfig, product: &Product, order: &Order) -> Url {
    let mut url = Url::parse(product.payment_id.trim())
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or_else(|| config.base_url.clone());

    url.query_pairs_mut()
        .append_pair("order_id", order.order_id.as_str())
        .append_pair("customer_email", order.customer_email.as_str());
    url
}
