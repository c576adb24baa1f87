//! Push notification routes

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::push::{NotificationPayload, SubscriptionKeys};
use crate::server::ServerAppState;

/// Response for VAPID public key
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VapidPublicKeyResponse {
    pub public_key: String,
}

/// Body of `POST /subscribe`, as produced by `PushSubscription.toJSON()`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeInput {
    /// Push subscription endpoint
    pub endpoint: String,
    /// Subscription keys
    pub keys: SubscriptionKeys,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeResponse {
    /// False when the endpoint was already registered
    pub success: bool,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendResponse {
    pub queued: usize,
}

/// Get the VAPID public key for client subscription
pub async fn vapid_public_key_handler(
    State(state): State<ServerAppState>,
) -> Json<VapidPublicKeyResponse> {
    Json(VapidPublicKeyResponse {
        public_key: state.vapid_public_key.to_string(),
    })
}

/// Register a browser push subscription
pub async fn subscribe_handler(
    State(state): State<ServerAppState>,
    Json(input): Json<SubscribeInput>,
) -> Json<SubscribeResponse> {
    let registration = state.registry.register(input.endpoint, input.keys).await;

    Json(SubscribeResponse {
        success: registration.accepted,
        total: registration.total_count,
    })
}

/// Fan a notification out to every subscriber. Deliveries continue after
/// the response is sent.
pub async fn send_handler(
    State(state): State<ServerAppState>,
    Json(payload): Json<NotificationPayload>,
) -> Json<SendResponse> {
    let dispatch = state.dispatcher.dispatch(payload).await;

    Json(SendResponse {
        queued: dispatch.queued,
    })
}
