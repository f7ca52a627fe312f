//! The entitlement gate in front of the player

use crate::client::Product;
use keypoint_core::BookSummary;

/// Shown to the listener whenever fetching the store fails
pub const FETCH_ERROR_MESSAGE: &str = "Error on fetching subscriptions. Please retry";

/// Purchase offer shown over the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paywall {
    pub product: Product,
}

impl Paywall {
    pub fn new(product: Product) -> Self {
        Self { product }
    }

    pub fn title(&self) -> &str {
        &self.product.display_name
    }

    pub fn description(&self) -> &str {
        &self.product.description
    }

    pub fn action_text(&self) -> String {
        format!("Start listening for {}", self.product.display_price)
    }
}

/// Everything the gate knows about access to one book
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateState {
    book: BookSummary,
    error_message: Option<String>,
    is_loading: bool,
    paywall: Option<Paywall>,
    entitled: bool,
    player_ready: bool,
}

impl GateState {
    pub fn new(book: BookSummary) -> Self {
        Self {
            book,
            error_message: None,
            is_loading: false,
            paywall: None,
            entitled: false,
            player_ready: false,
        }
    }

    pub fn book(&self) -> &BookSummary {
        &self.book
    }

    pub fn purchase_id(&self) -> &str {
        &self.book.purchase_id
    }

    /// Blocking error with a retry action, if the last fetch failed
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn paywall(&self) -> Option<&Paywall> {
        self.paywall.as_ref()
    }

    /// True once the book's purchase id was seen as active
    pub fn is_entitled(&self) -> bool {
        self.entitled
    }

    /// True once the initial fetch completed and the player may be shown
    pub fn is_player_ready(&self) -> bool {
        self.player_ready
    }

    /// True when the player is shown and nothing covers it
    pub fn is_unlocked(&self) -> bool {
        self.player_ready && self.paywall.is_none() && self.error_message.is_none()
    }
}

/// Inputs to the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateAction {
    Appeared,
    RetryTapped,
    Disappeared,
    GotProduct(Product),
    /// A product id reported as active, either by the initial fetch or by
    /// the live update feed
    ActiveEntitlement(String),
    FinishedLoading,
    FetchFailed(String),
    PurchaseTapped,
}

/// Work the gate asks its driver to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateEffect {
    /// Replace the fetch-then-listen task with a fresh one
    StartFetchAndListen,
    CancelListen,
    /// Fire-and-forget purchase
    Purchase(Product),
    PaywallDismissed,
    PlayerReady,
}

/// Applies one action to the gate and returns the effects to run
pub fn reduce_gate(state: &mut GateState, action: GateAction) -> Vec<GateEffect> {
    match action {
        GateAction::Appeared | GateAction::RetryTapped => {
            state.error_message = None;
            state.is_loading = true;
            vec![GateEffect::StartFetchAndListen]
        }
        GateAction::Disappeared => vec![GateEffect::CancelListen],
        GateAction::GotProduct(product) => {
            if !state.entitled {
                state.paywall = Some(Paywall::new(product));
            }
            Vec::new()
        }
        GateAction::ActiveEntitlement(product_id) => {
            if product_id != state.book.purchase_id {
                return Vec::new();
            }
            state.entitled = true;
            match state.paywall.take() {
                // Still loading, so the paywall was never on screen
                Some(_) if state.is_loading => Vec::new(),
                Some(_) => {
                    log::info!("Entitlement {} active, dismissing paywall", product_id);
                    vec![GateEffect::PaywallDismissed]
                }
                None => Vec::new(),
            }
        }
        GateAction::FinishedLoading => {
            state.is_loading = false;
            if state.player_ready {
                return Vec::new();
            }
            state.player_ready = true;
            vec![GateEffect::PlayerReady]
        }
        GateAction::FetchFailed(reason) => {
            log::warn!("Subscription fetch failed: {}", reason);
            state.is_loading = false;
            state.error_message = Some(FETCH_ERROR_MESSAGE.to_string());
            Vec::new()
        }
        GateAction::PurchaseTapped => match &state.paywall {
            Some(paywall) => vec![GateEffect::Purchase(paywall.product.clone())],
            None => Vec::new(),
        },
    }
}
