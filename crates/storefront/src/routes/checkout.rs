//! Checkout overlay: form and payment frame.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::{info, instrument};

use sheetshop_core::Order;

use crate::checkout::{CheckoutForm, InvalidFields, payment_url};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::Identity;
use crate::state::AppState;
use crate::view::{ViewEvent, ViewMachine};

use super::products::find_product;
use super::{ProductCard, encode_path_segment};

#[derive(Template, WebTemplate)]
#[template(path = "overlays/checkout.html")]
pub struct CheckoutTemplate {
    pub card: ProductCard,
    pub action: String,
    pub name: String,
    pub email: String,
    pub consent_offer: bool,
    pub consent_privacy: bool,
    pub invalid: InvalidFields,
    pub email_error: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "overlays/payment.html")]
pub struct PaymentTemplate {
    pub title: String,
    pub price: String,
    pub order_id: String,
    pub payment_url: String,
}

/// Checkout form for a product, prefilled with the Telegram first name.
#[instrument(skip(state, identity, session))]
pub async fn show(
    State(state): State<AppState>,
    Identity(identity): Identity,
    session: Session,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let product = find_product(&state, &id)?;
    ViewMachine::load(session)
        .await?
        .fire(ViewEvent::OpenCheckout(product.id.clone()))
        .await?;

    let grant = state.registry().access_state(&identity).await.grant();
    let name = identity
        .user()
        .and_then(|u| u.first_name.clone())
        .unwrap_or_default();

    Ok(CheckoutTemplate {
        card: ProductCard::new(&product, &grant, &state.config().currency),
        action: format!("/checkout/{}", encode_path_segment(product.id.as_str())),
        name,
        email: String::new(),
        consent_offer: false,
        consent_privacy: false,
        invalid: InvalidFields::default(),
        email_error: String::new(),
    })
}

/// Submit the checkout form.
///
/// An invalid form is re-rendered with 422 and nothing is recorded. A valid
/// one creates the order, pings the gateway and opens the payment frame.
#[instrument(skip(state, identity, session, form))]
pub async fn submit(
    State(state): State<AppState>,
    Identity(identity): Identity,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let product = find_product(&state, &id)?;

    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(e) => {
            let grant = state.registry().access_state(&identity).await.grant();
            let page = CheckoutTemplate {
                card: ProductCard::new(&product, &grant, &state.config().currency),
                action: format!("/checkout/{}", encode_path_segment(product.id.as_str())),
                name: form.name.clone(),
                email: form.email.clone(),
                consent_offer: form.consent_offer.is_some(),
                consent_privacy: form.consent_privacy.is_some(),
                invalid: e.fields,
                email_error: e.email.map(|e| e.to_string()).unwrap_or_default(),
            };
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let order = Order::new(&product, &valid.name, valid.email, identity);
    let url = payment_url(&state.config().payment, &product, &order);

    ViewMachine::load(session)
        .await?
        .fire(ViewEvent::Submit {
            product: product.id.clone(),
            order_id: order.order_id.clone(),
            payment_url: url.to_string(),
        })
        .await?;

    state.telemetry().order(&order);
    add_breadcrumb(
        "checkout",
        "Order submitted",
        Some(&[
            ("order_id", order.order_id.as_str()),
            ("product_id", product.id.as_str()),
        ]),
    );
    info!(order_id = %order.order_id.as_str(), product_id = %product.id.as_str(), "Order created");

    Ok(PaymentTemplate {
        title: product.title.clone(),
        price: super::price_label(product.price, &state.config().currency),
        order_id: order.order_id.as_str().to_string(),
        payment_url: url.to_string(),
    }
    .into_response())
}
