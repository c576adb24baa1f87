//! In-memory subscription registry
//!
//! Subscriptions live only in process memory and are lost on restart.
//! Every read and write goes through the registry's lock, so delivery
//! tasks never iterate a list that is being mutated underneath them.

use super::types::{SubscriptionKeys, SubscriptionRecord};
use tokio::sync::RwLock;

/// Result of a registration attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    /// False when the endpoint was already registered
    pub accepted: bool,
    /// Number of subscriptions after the call
    pub total_count: usize,
}

/// Endpoint-deduplicated set of push subscriptions
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    subscriptions: RwLock<Vec<SubscriptionRecord>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription. The first registration of an endpoint wins;
    /// later ones are ignored and leave the stored keys untouched.
    pub async fn register(&self, endpoint: String, keys: SubscriptionKeys) -> Registration {
        let mut subscriptions = self.subscriptions.write().await;

        if subscriptions.iter().any(|s| s.endpoint == endpoint) {
            log::debug!("Ignoring duplicate subscription for {}", endpoint);
            return Registration {
                accepted: false,
                total_count: subscriptions.len(),
            };
        }

        subscriptions.push(SubscriptionRecord::new(endpoint, keys));
        log::info!(
            "Registered push subscription (total: {})",
            subscriptions.len()
        );

        Registration {
            accepted: true,
            total_count: subscriptions.len(),
        }
    }

    /// Copy of the current subscriptions, in registration order
    pub async fn snapshot(&self) -> Vec<SubscriptionRecord> {
        self.subscriptions.read().await.clone()
    }

    /// Remove a subscription by endpoint. Returns whether one was removed.
    pub async fn remove(&self, endpoint: &str) -> bool {
        let mut subscriptions = self.subscriptions.write().await;

        let initial_count = subscriptions.len();
        subscriptions.retain(|s| s.endpoint != endpoint);
        let removed = subscriptions.len() < initial_count;

        if removed {
            log::info!(
                "Removed push subscription {} (total: {})",
                endpoint,
                subscriptions.len()
            );
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.subscriptions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.subscriptions.read().await.is_empty()
    }
}
