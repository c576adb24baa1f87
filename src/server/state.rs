//! Server application state shared across handlers

use crate::push::{DeliveryDispatcher, PushTransport, SubscriptionRegistry};
use crate::shutdown::ShutdownState;
use std::sync::Arc;

/// Shared state for the server. Cloned into every handler.
#[derive(Clone)]
pub struct ServerAppState {
    /// Registered push subscriptions
    pub registry: Arc<SubscriptionRegistry>,

    /// Fan-out to the registered subscriptions
    pub dispatcher: DeliveryDispatcher,

    /// VAPID public key handed to browsers for `pushManager.subscribe`
    pub vapid_public_key: Arc<str>,

    /// Message returned by the index endpoint
    pub greeting: Option<Arc<str>>,

    /// Shutdown state
    pub shutdown_state: ShutdownState,
}

impl ServerAppState {
    pub fn new(
        vapid_public_key: impl Into<Arc<str>>,
        transport: Arc<dyn PushTransport>,
        greeting: Option<String>,
        shutdown_state: ShutdownState,
    ) -> Self {
        let registry = Arc::new(SubscriptionRegistry::new());
        let dispatcher = DeliveryDispatcher::new(registry.clone(), transport);

        Self {
            registry,
            dispatcher,
            vapid_public_key: vapid_public_key.into(),
            greeting: greeting.map(Into::into),
            shutdown_state,
        }
    }
}
