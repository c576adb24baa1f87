//! Push notification fan-out
//!
//! `dispatch` snapshots the registry and spawns one independent delivery
//! task per subscriber. The caller gets the number scheduled and may drop
//! the task handles; deliveries keep running in the background.

use super::registry::SubscriptionRegistry;
use super::transport::PushTransport;
use super::types::{NotificationPayload, SubscriptionRecord};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// What happened to a single delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The push service accepted the message
    Delivered,
    /// The endpoint is gone and the subscription was dropped
    Removed,
    /// Delivery failed for another reason; the subscription is kept
    Failed,
}

/// Deliveries scheduled by one `dispatch` call
#[derive(Debug)]
pub struct Dispatch {
    /// Number of delivery tasks spawned
    pub queued: usize,
    handles: Vec<JoinHandle<DeliveryOutcome>>,
}

impl Dispatch {
    /// Wait for every delivery to finish and collect the outcomes.
    ///
    /// A delivery task that panicked is reported as `Failed`.
    pub async fn settled(self) -> Vec<DeliveryOutcome> {
        let mut outcomes = Vec::with_capacity(self.handles.len());
        for handle in self.handles {
            outcomes.push(handle.await.unwrap_or(DeliveryOutcome::Failed));
        }
        outcomes
    }
}

/// Fans a payload out to every registered subscriber
#[derive(Clone)]
pub struct DeliveryDispatcher {
    registry: Arc<SubscriptionRegistry>,
    transport: Arc<dyn PushTransport>,
}

impl DeliveryDispatcher {
    pub fn new(registry: Arc<SubscriptionRegistry>, transport: Arc<dyn PushTransport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Schedule one delivery per current subscriber and return immediately
    pub async fn dispatch(&self, payload: NotificationPayload) -> Dispatch {
        let subscriptions = self.registry.snapshot().await;

        if subscriptions.is_empty() {
            log::debug!("No push subscriptions, skipping notification");
            return Dispatch {
                queued: 0,
                handles: Vec::new(),
            };
        }

        let payload = Arc::new(payload);
        let handles: Vec<_> = subscriptions
            .into_iter()
            .map(|subscription| {
                let dispatcher = self.clone();
                let payload = payload.clone();
                tokio::spawn(async move { dispatcher.deliver_one(&subscription, &payload).await })
            })
            .collect();

        log::info!("Queued push notification for {} subscribers", handles.len());

        Dispatch {
            queued: handles.len(),
            handles,
        }
    }

    /// Attempt a single delivery. Never retries.
    pub async fn deliver_one(
        &self,
        subscription: &SubscriptionRecord,
        payload: &NotificationPayload,
    ) -> DeliveryOutcome {
        let body = match serde_json::to_vec(payload) {
            Ok(body) => body,
            Err(e) => {
                log::warn!("Failed to serialize push payload: {}", e);
                return DeliveryOutcome::Failed;
            }
        };

        match self.transport.send(subscription, &body).await {
            Ok(()) => {
                log::debug!("Sent push notification to {}", subscription.endpoint);
                DeliveryOutcome::Delivered
            }
            Err(e) if e.is_permanent() => {
                log::info!(
                    "Removing expired subscription {}: {}",
                    subscription.endpoint,
                    e
                );
                self.registry.remove(&subscription.endpoint).await;
                DeliveryOutcome::Removed
            }
            Err(e) => {
                log::warn!(
                    "Failed to send push notification to {}: {}",
                    subscription.endpoint,
                    e
                );
                DeliveryOutcome::Failed
            }
        }
    }
}
