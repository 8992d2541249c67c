//! Checkout page controller.
//!
//! One [`CheckoutController`] drives a visitor's checkout from mount to
//! leaving the page:
//!
//! ```text
//! Loading ──load──► Ready ──submit──► Submitting ──ok──► RedirectPending ──timer──► Left(Home)
//!    │                ▲                   │                    │
//!    │ empty cart     └──── failure ──────┘                    └──back──► Left(Home), cart cleared
//!    ▼
//! Left(Home)                       back (no pending redirect) ──► Left(Back)
//! ```
//!
//! After a successful order the cart is cleared and the visitor sent home
//! after a short delay. Pressing back while that delay is pending cancels
//! the timer and performs the same clear-and-go-home immediately. Whichever
//! of the two gets there first takes the pending redirect out of its slot,
//! so the cart is cleared and navigation happens exactly once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::Mutex;
use smile_cart_core::{
    CartItems, CartSummary, CheckoutDetails, CheckoutForm, Country, FormErrors, Order,
    OrderPayload, Product,
};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::AbortHandle;

use crate::api::{ApiError, StoreApi};
use crate::cart::CartStore;
use crate::remote::{self, RemoteData};
use crate::storage::{CHECKOUT_FORM_STORAGE_KEY, LocalStorage, read_json, write_json};

/// Delay between a placed order and the automatic redirect home.
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_millis(1500);

/// Where the visitor goes when they leave checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// The home page.
    Home,
    /// The previous page.
    Back(String),
}

impl Navigation {
    /// Path to navigate to.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Home => "/",
            Self::Back(path) => path,
        }
    }
}

/// Checkout page lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutPhase {
    Loading,
    Ready,
    Submitting,
    RedirectPending,
    Left(Navigation),
}

impl CheckoutPhase {
    #[must_use]
    pub const fn has_left(&self) -> bool {
        matches!(self, Self::Left(_))
    }
}

/// Errors from submitting the checkout form.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// One or more fields failed validation. Nothing was sent.
    #[error("Checkout form is invalid: {0}")]
    Invalid(#[from] FormErrors),

    /// A submission is already in flight, or the page is not ready.
    #[error("Checkout is not accepting submissions while {0:?}")]
    NotReady(CheckoutPhase),

    /// The cart emptied before the order could be placed.
    #[error("Cart is empty")]
    EmptyCart,

    /// The store API refused or failed the order.
    #[error("Order creation failed: {0}")]
    Submission(#[from] ApiError),
}

/// Controller settings.
#[derive(Debug, Clone)]
pub struct CheckoutOptions {
    pub redirect_delay: Duration,
    /// Path of the page the visitor came from, used by back.
    pub return_to: Option<String>,
}

impl Default for CheckoutOptions {
    fn default() -> Self {
        Self {
            redirect_delay: DEFAULT_REDIRECT_DELAY,
            return_to: None,
        }
    }
}

/// Everything the checkout page renders, gathered by [`CheckoutController::load`].
#[derive(Debug, Clone)]
pub struct CheckoutData {
    /// Cart as it was when the page loaded.
    pub cart: CartItems,
    pub products: RemoteData<Vec<Product>>,
    pub countries: RemoteData<Vec<Country>>,
    /// Saved details from a previous checkout, or the empty form.
    pub initial_values: CheckoutDetails,
}

impl CheckoutData {
    /// Totals over the loaded products.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        let products = self.products.data().map_or(&[][..], Vec::as_slice);
        CartSummary::compute(&self.cart, products)
    }

    /// Loaded countries, empty if the fetch failed.
    #[must_use]
    pub fn country_list(&self) -> &[Country] {
        self.countries.data().map_or(&[][..], Vec::as_slice)
    }
}

/// Result of mounting the checkout page.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Ready(Arc<CheckoutData>),
    Redirect(Navigation),
}

struct PendingRedirect {
    id: u64,
    task: AbortHandle,
}

/// State machine behind one visitor's checkout page.
pub struct CheckoutController {
    cart: CartStore,
    options: CheckoutOptions,
    phase: Arc<watch::Sender<CheckoutPhase>>,
    data: OnceLock<Arc<CheckoutData>>,
    pending_redirect: Arc<Mutex<Option<PendingRedirect>>>,
    redirect_seq: AtomicU64,
}

impl std::fmt::Debug for CheckoutController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutController")
            .field("phase", &*self.phase.borrow())
            .field("return_to", &self.options.return_to)
            .finish_non_exhaustive()
    }
}

impl CheckoutController {
    #[must_use]
    pub fn new(cart: CartStore, options: CheckoutOptions) -> Self {
        let (phase, _) = watch::channel(CheckoutPhase::Loading);
        Self {
            cart,
            options,
            phase: Arc::new(phase),
            data: OnceLock::new(),
            pending_redirect: Arc::new(Mutex::new(None)),
            redirect_seq: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn phase(&self) -> CheckoutPhase {
        self.phase.borrow().clone()
    }

    /// Receive every phase change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CheckoutPhase> {
        self.phase.subscribe()
    }

    /// Data gathered by [`Self::load`], once it has completed.
    #[must_use]
    pub fn data(&self) -> Option<Arc<CheckoutData>> {
        self.data.get().cloned()
    }

    #[must_use]
    pub const fn redirect_delay(&self) -> Duration {
        self.options.redirect_delay
    }

    #[must_use]
    pub fn has_pending_redirect(&self) -> bool {
        self.pending_redirect.lock().is_some()
    }

    /// Mount the page.
    ///
    /// Fetches the cart's products and the country list concurrently and
    /// reads saved details from storage. The page becomes ready only once
    /// both fetches have resolved, successfully or not. An empty cart sends
    /// the visitor home instead.
    pub async fn load<A, S>(&self, api: &A, storage: &S) -> LoadOutcome
    where
        A: StoreApi,
        S: LocalStorage,
    {
        if let Some(data) = self.data.get() {
            return match self.phase() {
                CheckoutPhase::Left(navigation) => LoadOutcome::Redirect(navigation),
                _ => LoadOutcome::Ready(Arc::clone(data)),
            };
        }

        let (cart, _) = self.cart.pick();
        let keys = cart.keys();

        let (products, countries, saved) = tokio::join!(
            remote::fetch_cart_products(api, &keys),
            remote::fetch_countries(api),
            read_json::<CheckoutDetails, _>(storage, CHECKOUT_FORM_STORAGE_KEY),
        );

        if self.cart.is_empty() {
            tracing::debug!("Cart is empty, leaving checkout");
            self.leave(Navigation::Home);
            return LoadOutcome::Redirect(Navigation::Home);
        }

        let initial_values = match saved {
            Ok(Some(details)) => details,
            Ok(None) => CheckoutDetails::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable saved checkout details");
                CheckoutDetails::default()
            }
        };

        let data = Arc::new(CheckoutData {
            cart,
            products,
            countries,
            initial_values,
        });
        let data = Arc::clone(self.data.get_or_init(|| data));

        self.phase.send_if_modified(|phase| {
            if *phase == CheckoutPhase::Loading {
                *phase = CheckoutPhase::Ready;
                true
            } else {
                false
            }
        });

        LoadOutcome::Ready(data)
    }

    /// Validate and place the order.
    ///
    /// On success the details are saved (or `null` is saved when the visitor
    /// did not opt in) and the delayed redirect home is scheduled. On failure
    /// the page returns to ready with cart and storage untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Invalid`] without sending anything if a field
    /// fails validation, [`CheckoutError::NotReady`] if another submission is
    /// in flight, [`CheckoutError::EmptyCart`] if the cart has emptied, and
    /// [`CheckoutError::Submission`] if the API fails.
    pub async fn submit<A, S>(
        &self,
        api: &A,
        storage: &S,
        form: CheckoutForm,
    ) -> Result<Order, CheckoutError>
    where
        A: StoreApi,
        S: LocalStorage,
    {
        let countries = self.data.get().map_or(&[][..], |d| d.country_list());
        form.details.validate(countries)?;

        self.begin_submission()?;

        let cart = self.cart.snapshot();
        if cart.is_empty() {
            self.leave(Navigation::Home);
            return Err(CheckoutError::EmptyCart);
        }

        let payload = OrderPayload::new(form.details, &cart);
        match remote::create_order(api, &payload).await {
            Ok(order) => {
                let saved = form.save_for_next_time.then_some(&payload.details);
                if let Err(e) = write_json(storage, CHECKOUT_FORM_STORAGE_KEY, saved).await {
                    tracing::error!(error = %e, order_id = %order.id, "Failed to save checkout details");
                }
                self.schedule_redirect();
                Ok(order)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Order was not placed");
                self.phase.send_if_modified(|phase| {
                    if *phase == CheckoutPhase::Submitting {
                        *phase = CheckoutPhase::Ready;
                        true
                    } else {
                        false
                    }
                });
                Err(CheckoutError::Submission(e))
            }
        }
    }

    /// Leave the page through the back control.
    ///
    /// With a redirect pending this cancels it, clears the cart and goes
    /// home. Otherwise it returns to the previous page.
    pub fn back(&self) -> Navigation {
        let pending = self.pending_redirect.lock().take();
        let navigation = match pending {
            Some(pending) => {
                pending.task.abort();
                self.cart.clear();
                tracing::info!("Redirect cancelled by back, leaving checkout");
                Navigation::Home
            }
            None => Navigation::Back(
                self.options
                    .return_to
                    .clone()
                    .unwrap_or_else(|| Navigation::Home.path().to_string()),
            ),
        };
        self.leave(navigation.clone());
        navigation
    }

    fn begin_submission(&self) -> Result<(), CheckoutError> {
        let mut rejected = None;
        self.phase.send_if_modified(|phase| {
            if *phase == CheckoutPhase::Ready {
                *phase = CheckoutPhase::Submitting;
                true
            } else {
                rejected = Some(phase.clone());
                false
            }
        });
        rejected.map_or(Ok(()), |phase| Err(CheckoutError::NotReady(phase)))
    }

    fn leave(&self, navigation: Navigation) {
        self.phase.send_replace(CheckoutPhase::Left(navigation));
    }

    fn schedule_redirect(&self) {
        let id = self.redirect_seq.fetch_add(1, Ordering::Relaxed);
        let delay = self.options.redirect_delay;
        let slot = Arc::clone(&self.pending_redirect);
        let (_, actions) = self.cart.pick();
        let phase = Arc::clone(&self.phase);

        let mut pending = self.pending_redirect.lock();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let fired = slot.lock().take_if(|p| p.id == id).is_some();
            if fired {
                actions.clear_cart();
                phase.send_replace(CheckoutPhase::Left(Navigation::Home));
                tracing::info!("Order placed, leaving checkout");
            }
        });
        if let Some(previous) = pending.replace(PendingRedirect {
            id,
            task: task.abort_handle(),
        }) {
            previous.task.abort();
        }
        drop(pending);

        self.phase.send_if_modified(|phase| {
            if *phase == CheckoutPhase::Submitting {
                *phase = CheckoutPhase::RedirectPending;
                true
            } else {
                false
            }
        });
    }
}
