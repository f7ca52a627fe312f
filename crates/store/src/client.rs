//! Store collaborator contract

use crate::error::StoreResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A purchasable product as presented by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub display_name: String,
    /// Localised price string, shown verbatim
    pub display_price: String,
    #[serde(default)]
    pub description: String,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        display_price: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            display_price: display_price.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Access to products and entitlements
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Looks up the product sold under `purchase_id`
    async fn fetch_product(&self, purchase_id: &str) -> StoreResult<Product>;

    /// Ids of every product currently active for the user
    async fn fetch_active_entitlements(&self) -> StoreResult<HashSet<String>>;

    /// Starts a purchase. Completion is only observable through
    /// [`StoreClient::entitlement_updates`].
    async fn purchase(&self, product: &Product) -> StoreResult<()>;

    /// Live feed of product ids that just became active, from any source
    fn entitlement_updates(&self) -> mpsc::UnboundedReceiver<String>;
}

#[async_trait]
impl<S: StoreClient + ?Sized> StoreClient for Arc<S> {
    async fn fetch_product(&self, purchase_id: &str) -> StoreResult<Product> {
        (**self).fetch_product(purchase_id).await
    }

    async fn fetch_active_entitlements(&self) -> StoreResult<HashSet<String>> {
        (**self).fetch_active_entitlements().await
    }

    async fn purchase(&self, product: &Product) -> StoreResult<()> {
        (**self).purchase(product).await
    }

    fn entitlement_updates(&self) -> mpsc::UnboundedReceiver<String> {
        (**self).entitlement_updates()
    }
}
