//! Store kept entirely in memory

use crate::client::{Product, StoreClient};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration as StdDuration;
use tokio::sync::mpsc;

#[derive(Debug, Default)]
struct Inner {
    products: HashMap<String, Product>,
    active: HashSet<String>,
    subscribers: Vec<mpsc::UnboundedSender<String>>,
    /// Number of upcoming fetches that fail
    failing_fetches: u32,
}

/// A store with a fixed catalogue, used by the command line player and
/// in tests.
///
/// Purchases always succeed for known products. Every completed purchase,
/// and every [`InMemoryStore::grant`], is broadcast to all live
/// entitlement subscribers.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
    latency: Option<StdDuration>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(self, product: Product) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.products.insert(product.id.clone(), product);
        }
        self
    }

    /// Marks a product as already owned
    pub fn with_active(self, product_id: impl Into<String>) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.active.insert(product_id.into());
        }
        self
    }

    /// Delays every fetch, e.g. to exercise timeouts
    pub fn with_latency(mut self, latency: StdDuration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes the next `count` fetches fail
    pub fn fail_next_fetches(&self, count: u32) {
        if let Ok(mut inner) = self.lock() {
            inner.failing_fetches = count;
        }
    }

    /// Activates a product outside of [`StoreClient::purchase`], like a
    /// restore on another device
    pub fn grant(&self, product_id: &str) -> StoreResult<()> {
        let mut inner = self.lock()?;
        inner.active.insert(product_id.to_string());
        broadcast(&mut inner, product_id);
        Ok(())
    }

    pub fn is_active(&self, product_id: &str) -> bool {
        self.lock()
            .map(|inner| inner.active.contains(product_id))
            .unwrap_or(false)
    }

    /// Number of entitlement subscribers still listening
    pub fn subscriber_count(&self) -> usize {
        self.lock()
            .map(|mut inner| {
                inner.subscribers.retain(|s| !s.is_closed());
                inner.subscribers.len()
            })
            .unwrap_or(0)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::FetchFailed("store lock poisoned".to_string()))
    }

    async fn simulate_request(&self) -> StoreResult<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let mut inner = self.lock()?;
        if inner.failing_fetches > 0 {
            inner.failing_fetches -= 1;
            return Err(StoreError::FetchFailed("store unavailable".to_string()));
        }
        Ok(())
    }
}

fn broadcast(inner: &mut Inner, product_id: &str) {
    inner
        .subscribers
        .retain(|subscriber| subscriber.send(product_id.to_string()).is_ok());
    log::debug!(
        "Entitlement {} broadcast to {} subscribers",
        product_id,
        inner.subscribers.len()
    );
}

#[async_trait]
impl StoreClient for InMemoryStore {
    async fn fetch_product(&self, purchase_id: &str) -> StoreResult<Product> {
        self.simulate_request().await?;
        self.lock()?
            .products
            .get(purchase_id)
            .cloned()
            .ok_or_else(|| StoreError::ProductNotFound(purchase_id.to_string()))
    }

    async fn fetch_active_entitlements(&self) -> StoreResult<HashSet<String>> {
        self.simulate_request().await?;
        Ok(self.lock()?.active.clone())
    }

    async fn purchase(&self, product: &Product) -> StoreResult<()> {
        let mut inner = self.lock()?;
        if !inner.products.contains_key(&product.id) {
            return Err(StoreError::ProductNotFound(product.id.clone()));
        }
        inner.active.insert(product.id.clone());
        log::info!("Purchased {}", product.id);
        broadcast(&mut inner, &product.id);
        Ok(())
    }

    fn entitlement_updates(&self) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut inner) = self.lock() {
            inner.subscribers.push(tx);
        }
        rx
    }
}
