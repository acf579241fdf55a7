//! View state machine.
//!
//! The Mini App shows one primary page at a time, optionally covered by one
//! overlay. Every user-visible transition goes through [`ViewState::next`];
//! transitions outside the table below are rejected.
//!
//! | from | event | to |
//! |---|---|---|
//! | any | `Navigate(q)` | `Page(q)` |
//! | `Page(p)` | `OpenDetail(id)` | `DetailModal { base: p }` |
//! | `Page(p)` | `OpenSecret(id)` | `SecretModal { base: p }` |
//! | `Page(p)` or `DetailModal { base: p, id }` | `OpenCheckout(id)` | `Checkout { base: p }` |
//! | `Checkout { base: p, id }` | `Submit { id, .. }` | `PaymentFrame { base: p }` |
//! | any overlay | `Close` | `Page(base)` |
//!
//! The current state is kept in the visitor's session.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_sessions::Session;

use sheetshop_core::{OrderId, ProductId};

/// Session key holding the serialized [`ViewState`].
pub const VIEW_STATE_KEY: &str = "view_state";

/// Primary pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    Home,
    Catalog,
    Portfolio,
    Account,
}

impl Page {
    /// Pages in tab-bar order.
    pub const ALL: [Self; 4] = [Self::Home, Self::Catalog, Self::Portfolio, Self::Account];

    /// Name used in telemetry and navigation markup.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Catalog => "catalog",
            Self::Portfolio => "portfolio",
            Self::Account => "account",
        }
    }

    /// Route of the page.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Catalog => "/catalog",
            Self::Portfolio => "/portfolio",
            Self::Account => "/account",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Catalog => "Catalog",
            Self::Portfolio => "Portfolio",
            Self::Account => "My purchases",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the visitor is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewState {
    Page(Page),
    DetailModal {
        base: Page,
        product: ProductId,
    },
    SecretModal {
        base: Page,
        product: ProductId,
    },
    Checkout {
        base: Page,
        product: ProductId,
    },
    PaymentFrame {
        base: Page,
        product: ProductId,
        order_id: OrderId,
        payment_url: String,
    },
}

impl Default for ViewState {
    fn default() -> Self {
        Self::Page(Page::Home)
    }
}

/// Something the visitor did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Navigate(Page),
    OpenDetail(ProductId),
    OpenSecret(ProductId),
    OpenCheckout(ProductId),
    /// A validated checkout form was submitted.
    Submit {
        product: ProductId,
        order_id: OrderId,
        payment_url: String,
    },
    Close,
}

impl ViewEvent {
    const fn name(&self) -> &'static str {
        match self {
            Self::Navigate(_) => "navigate",
            Self::OpenDetail(_) => "open_detail",
            Self::OpenSecret(_) => "open_secret",
            Self::OpenCheckout(_) => "open_checkout",
            Self::Submit { .. } => "submit",
            Self::Close => "close",
        }
    }
}

/// A transition outside the table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {event} from {from}")]
pub struct TransitionError {
    pub from: &'static str,
    pub event: &'static str,
}

impl ViewState {
    /// Short state name for errors and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Page(_) => "page",
            Self::DetailModal { .. } => "detail",
            Self::SecretModal { .. } => "secret",
            Self::Checkout { .. } => "checkout",
            Self::PaymentFrame { .. } => "payment",
        }
    }

    /// The primary page shown (under the overlay, if any).
    #[must_use]
    pub const fn page(&self) -> Page {
        match self {
            Self::Page(page)
            | Self::DetailModal { base: page, .. }
            | Self::SecretModal { base: page, .. }
            | Self::Checkout { base: page, .. }
            | Self::PaymentFrame { base: page, .. } => *page,
        }
    }

    /// True when an overlay covers the page.
    #[must_use]
    pub const fn has_overlay(&self) -> bool {
        !matches!(self, Self::Page(_))
    }

    /// Apply `event`, returning the next state.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` for transitions outside the table.
    pub fn next(&self, event: ViewEvent) -> Result<Self, TransitionError> {
        let rejected = TransitionError {
            from: self.name(),
            event: event.name(),
        };

        match (self, event) {
            (_, ViewEvent::Navigate(page)) => Ok(Self::Page(page)),

            (Self::Page(base), ViewEvent::OpenDetail(product)) => Ok(Self::DetailModal {
                base: *base,
                product,
            }),

            (Self::Page(base), ViewEvent::OpenSecret(product)) => Ok(Self::SecretModal {
                base: *base,
                product,
            }),

            (Self::Page(base), ViewEvent::OpenCheckout(product)) => Ok(Self::Checkout {
                base: *base,
                product,
            }),

            (Self::DetailModal { base, product: open }, ViewEvent::OpenCheckout(product))
                if open.matches(product.as_str()) =>
            {
                Ok(Self::Checkout {
                    base: *base,
                    product,
                })
            }

            (
                Self::Checkout {
                    base,
                    product: open,
                },
                ViewEvent::Submit {
                    product,
                    order_id,
                    payment_url,
                },
            ) if open.matches(product.as_str()) => Ok(Self::PaymentFrame {
                base: *base,
                product,
                order_id,
                payment_url,
            }),

            (state, ViewEvent::Close) if state.has_overlay() => Ok(Self::Page(state.page())),

            _ => Err(rejected),
        }
    }

    /// The overlay's product, if an overlay is open.
    #[must_use]
    pub const fn product(&self) -> Option<&ProductId> {
        match self {
            Self::Page(_) => None,
            Self::DetailModal { product, .. }
            | Self::SecretModal { product, .. }
            | Self::Checkout { product, .. }
            | Self::PaymentFrame { product, .. } => Some(product),
        }
    }
}

/// A visitor's view state bound to their session.
pub struct ViewMachine {
    session: Session,
    state: ViewState,
}

impl ViewMachine {
    /// Load the visitor's state; a new session starts on the home page.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn load(session: Session) -> Result<Self, tower_sessions::session::Error> {
        let state = session
            .get::<ViewState>(VIEW_STATE_KEY)
            .await?
            .unwrap_or_default();
        Ok(Self { session, state })
    }

    #[must_use]
    pub const fn state(&self) -> &ViewState {
        &self.state
    }

    /// Apply `event` and persist the new state.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Transition` when the event is not allowed from the
    /// current state (the stored state is left unchanged).
    pub async fn fire(&mut self, event: ViewEvent) -> Result<&ViewState, ViewError> {
        let next = self.state.next(event)?;
        self.session.insert(VIEW_STATE_KEY, &next).await?;
        tracing::debug!(from = self.state.name(), to = next.name(), "View transition");
        self.state = next;
        Ok(&self.state)
    }
}

/// Errors from [`ViewMachine::fire`].
#[derive(Debug, Error)]
pub enum ViewError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}
