//! Push transport
//!
//! The dispatcher only knows about the `PushTransport` trait. The production
//! implementation signs with VAPID and encrypts with the `web-push` crate.

use super::types::{SubscriptionRecord, AUTH_KEY, P256DH_KEY};
use super::vapid::VapidCredentials;
use async_trait::async_trait;
use thiserror::Error;
use web_push::{
    ContentEncoding, IsahcWebPushClient, SubscriptionInfo, VapidSignatureBuilder, WebPushClient,
    WebPushError, WebPushMessageBuilder, URL_SAFE_NO_PAD,
};

/// Default time the push service may hold an undelivered message (24 hours)
pub const DEFAULT_TTL_SECS: u32 = 86_400;

/// Why a single delivery failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The push service reports the subscription no longer exists (410 Gone)
    #[error("Endpoint gone")]
    EndpointGone,

    #[error("Subscription is missing the '{0}' key")]
    MissingKey(&'static str),

    #[error("Failed to sign VAPID claims: {0}")]
    Vapid(String),

    #[error("Failed to build push message: {0}")]
    Message(String),

    /// Any other transport failure: network, 4xx, 5xx
    #[error("Push service rejected delivery: {0}")]
    Rejected(String),
}

impl DeliveryError {
    /// Whether the subscription should be dropped from the registry
    pub fn is_permanent(&self) -> bool {
        matches!(self, DeliveryError::EndpointGone)
    }
}

/// Sends one already-serialized payload to one subscriber
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send(
        &self,
        subscription: &SubscriptionRecord,
        payload: &[u8],
    ) -> Result<(), DeliveryError>;
}

/// Web Push transport backed by the `web-push` crate
pub struct WebPushTransport {
    client: IsahcWebPushClient,
    credentials: VapidCredentials,
    ttl: u32,
}

impl WebPushTransport {
    pub fn new(credentials: VapidCredentials, ttl: u32) -> Result<Self, WebPushError> {
        Ok(Self {
            client: IsahcWebPushClient::new()?,
            credentials,
            ttl,
        })
    }
}

#[async_trait]
impl PushTransport for WebPushTransport {
    async fn send(
        &self,
        subscription: &SubscriptionRecord,
        payload: &[u8],
    ) -> Result<(), DeliveryError> {
        let p256dh = subscription
            .key(P256DH_KEY)
            .ok_or(DeliveryError::MissingKey(P256DH_KEY))?;
        let auth = subscription
            .key(AUTH_KEY)
            .ok_or(DeliveryError::MissingKey(AUTH_KEY))?;

        let subscription_info = SubscriptionInfo::new(subscription.endpoint.as_str(), p256dh, auth);

        let mut sig_builder = VapidSignatureBuilder::from_base64(
            self.credentials.private_key.trim_end_matches('='),
            URL_SAFE_NO_PAD,
            &subscription_info,
        )
        .map_err(|e| DeliveryError::Vapid(format!("{:?}", e)))?;
        sig_builder.add_claim("sub", self.credentials.subject.as_str());

        let signature = sig_builder
            .build()
            .map_err(|e| DeliveryError::Vapid(format!("{:?}", e)))?;

        let mut builder = WebPushMessageBuilder::new(&subscription_info);
        builder.set_payload(ContentEncoding::Aes128Gcm, payload);
        builder.set_vapid_signature(signature);
        builder.set_ttl(self.ttl);

        let message = builder
            .build()
            .map_err(|e| DeliveryError::Message(format!("{:?}", e)))?;

        self.client.send(message).await.map_err(classify)
    }
}

/// Map a `web-push` error onto the relay's failure classes
fn classify(error: WebPushError) -> DeliveryError {
    match error {
        // Only 410 Gone drops the subscription; 404 is kept like any other 4xx
        WebPushError::EndpointNotValid => DeliveryError::EndpointGone,
        WebPushError::ServerError(retry_after) => {
            DeliveryError::Rejected(format!("Server error, retry after: {:?}", retry_after))
        }
        other => DeliveryError::Rejected(format!("{:?}", other)),
    }
}
