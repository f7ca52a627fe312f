//! Async driver for the entitlement gate

use crate::client::{Product, StoreClient};
use crate::error::{StoreError, StoreResult};
use crate::gate::{reduce_gate, GateAction, GateEffect, GateState};
use keypoint_core::{AppError, BookSummary};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Tunables for the gate driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateSettings {
    /// Upper bound for each store fetch
    pub fetch_timeout: StdDuration,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            fetch_timeout: StdDuration::from_secs(15),
        }
    }
}

/// Requests a front end can make of the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateCommand {
    Retry,
    Purchase,
    Shutdown,
}

/// Changes a front end should react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateNotice {
    PlayerReady,
    PaywallDismissed,
    Error(AppError),
}

/// Cloneable front-end side of a [`GateSession`]
#[derive(Debug, Clone)]
pub struct GateHandle {
    commands: mpsc::Sender<GateCommand>,
    state: watch::Receiver<GateState>,
}

impl GateHandle {
    pub async fn retry(&self) -> StoreResult<()> {
        self.send(GateCommand::Retry).await
    }

    pub async fn purchase(&self) -> StoreResult<()> {
        self.send(GateCommand::Purchase).await
    }

    pub async fn shutdown(&self) -> StoreResult<()> {
        self.send(GateCommand::Shutdown).await
    }

    async fn send(&self, command: GateCommand) -> StoreResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| StoreError::SessionClosed)
    }

    pub fn state(&self) -> GateState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<GateState> {
        self.state.clone()
    }
}

/// Runs the gate: fetches the product and active entitlements once, then
/// keeps listening for entitlement updates until the session ends.
///
/// The update feed is subscribed before the fetch starts so a purchase
/// completed in between is not missed; its items are only applied after
/// the fetch finished or failed.
pub struct GateSession {
    state: GateState,
    store: Arc<dyn StoreClient>,
    settings: GateSettings,
    commands: mpsc::Receiver<GateCommand>,
    actions_tx: mpsc::UnboundedSender<GateAction>,
    actions: mpsc::UnboundedReceiver<GateAction>,
    listener: Option<JoinHandle<()>>,
    published: watch::Sender<GateState>,
    notices: mpsc::UnboundedSender<GateNotice>,
}

impl GateSession {
    pub fn new(
        book: BookSummary,
        store: Arc<dyn StoreClient>,
        settings: GateSettings,
    ) -> (Self, GateHandle, mpsc::UnboundedReceiver<GateNotice>) {
        let state = GateState::new(book);
        let (command_tx, command_rx) = mpsc::channel(16);
        let (actions_tx, actions_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(state.clone());
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        let session = Self {
            state,
            store,
            settings,
            commands: command_rx,
            actions_tx,
            actions: actions_rx,
            listener: None,
            published: state_tx,
            notices: notice_tx,
        };
        let handle = GateHandle {
            commands: command_tx,
            state: state_rx,
        };
        (session, handle, notice_rx)
    }

    /// Runs until shut down or every handle is dropped, then returns the
    /// final gate state
    pub async fn run(mut self) -> GateState {
        self.dispatch(GateAction::Appeared);

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(GateCommand::Retry) => self.dispatch(GateAction::RetryTapped),
                    Some(GateCommand::Purchase) => self.dispatch(GateAction::PurchaseTapped),
                    Some(GateCommand::Shutdown) | None => break,
                },
                Some(action) = self.actions.recv() => self.dispatch(action),
            }
        }

        self.dispatch(GateAction::Disappeared);
        self.state.clone()
    }

    fn dispatch(&mut self, action: GateAction) {
        let failure = match &action {
            GateAction::FetchFailed(reason) => Some(AppError::entitlement_fetch(reason.clone())),
            _ => None,
        };

        for effect in reduce_gate(&mut self.state, action) {
            self.run_effect(effect);
        }
        if let Some(error) = failure {
            self.notify(GateNotice::Error(error));
        }

        let next = self.state.clone();
        self.published.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn run_effect(&mut self, effect: GateEffect) {
        match effect {
            GateEffect::StartFetchAndListen => {
                self.cancel_listener();
                let store = Arc::clone(&self.store);
                let purchase_id = self.state.purchase_id().to_string();
                let timeout = self.settings.fetch_timeout;
                let actions = self.actions_tx.clone();
                self.listener = Some(tokio::spawn(fetch_then_listen(
                    store,
                    purchase_id,
                    timeout,
                    actions,
                )));
            }
            GateEffect::CancelListen => self.cancel_listener(),
            GateEffect::Purchase(product) => {
                let store = Arc::clone(&self.store);
                tokio::spawn(purchase(store, product));
            }
            GateEffect::PaywallDismissed => self.notify(GateNotice::PaywallDismissed),
            GateEffect::PlayerReady => self.notify(GateNotice::PlayerReady),
        }
    }

    fn cancel_listener(&mut self) {
        if let Some(listener) = self.listener.take() {
            log::debug!("Cancelling entitlement listener");
            listener.abort();
        }
    }

    fn notify(&self, notice: GateNotice) {
        if self.notices.send(notice).is_err() {
            log::trace!("No gate notice receiver");
        }
    }
}

impl Drop for GateSession {
    fn drop(&mut self) {
        self.cancel_listener();
    }
}

impl std::fmt::Debug for GateSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateSession")
            .field("state", &self.state)
            .field("settings", &self.settings)
            .finish()
    }
}

async fn with_timeout<T>(
    limit: StdDuration,
    request: impl Future<Output = StoreResult<T>>,
) -> StoreResult<T> {
    tokio::time::timeout(limit, request)
        .await
        .map_err(|_| StoreError::Timeout)?
}

async fn fetch(
    store: &dyn StoreClient,
    purchase_id: &str,
    limit: StdDuration,
    actions: &mpsc::UnboundedSender<GateAction>,
) -> StoreResult<()> {
    let product = with_timeout(limit, store.fetch_product(purchase_id)).await?;
    let _ = actions.send(GateAction::GotProduct(product));

    let active = with_timeout(limit, store.fetch_active_entitlements()).await?;
    for product_id in active {
        let _ = actions.send(GateAction::ActiveEntitlement(product_id));
    }
    Ok(())
}

async fn fetch_then_listen(
    store: Arc<dyn StoreClient>,
    purchase_id: String,
    limit: StdDuration,
    actions: mpsc::UnboundedSender<GateAction>,
) {
    let mut updates = store.entitlement_updates();

    let outcome = match fetch(store.as_ref(), &purchase_id, limit, &actions).await {
        Ok(()) => GateAction::FinishedLoading,
        Err(err) => GateAction::FetchFailed(err.to_string()),
    };
    if actions.send(outcome).is_err() {
        return;
    }

    while let Some(product_id) = updates.recv().await {
        log::debug!("Entitlement update: {}", product_id);
        if actions.send(GateAction::ActiveEntitlement(product_id)).is_err() {
            break;
        }
    }
}

/// Failures stop here; success shows up on the update feed
async fn purchase(store: Arc<dyn StoreClient>, product: Product) {
    if let Err(err) = store.purchase(&product).await {
        log::warn!("Purchase of {} did not complete: {}", product.id, err);
    }
}
