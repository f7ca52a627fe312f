//! Entitlement gate for keypoint
//!
//! A book is playable once the product sold under its purchase id is an
//! active entitlement. [`GateSession`] fetches the product and the active
//! entitlements through a [`StoreClient`], shows a paywall when needed and
//! keeps listening for entitlement updates so a purchase made anywhere
//! dismisses the paywall.

mod client;
mod error;
mod gate;
mod memory;
mod session;

pub use client::{Product, StoreClient};
pub use error::{StoreError, StoreResult};
pub use gate::{reduce_gate, GateAction, GateEffect, GateState, Paywall, FETCH_ERROR_MESSAGE};
pub use memory::InMemoryStore;
pub use session::{GateCommand, GateHandle, GateNotice, GateSession, GateSettings};
