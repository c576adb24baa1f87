//! Types for push subscriptions and notification payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Opaque key material issued by the browser alongside a subscription.
///
/// Real browsers send `p256dh` and `auth`, but nothing here requires them;
/// missing or malformed keys only surface when a delivery is attempted.
pub type SubscriptionKeys = BTreeMap<String, String>;

/// Key name for the subscriber's P-256 ECDH public key
pub const P256DH_KEY: &str = "p256dh";
/// Key name for the subscriber's auth secret
pub const AUTH_KEY: &str = "auth";

/// A registered browser push subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRecord {
    /// The push endpoint URL, unique within the registry
    pub endpoint: String,
    /// Encryption keys, passed through unmodified
    pub keys: SubscriptionKeys,
    /// When the subscription was first registered
    pub registered_at: DateTime<Utc>,
}

impl SubscriptionRecord {
    pub fn new(endpoint: impl Into<String>, keys: SubscriptionKeys) -> Self {
        Self {
            endpoint: endpoint.into(),
            keys,
            registered_at: Utc::now(),
        }
    }

    /// Look up a key field by name
    pub fn key(&self, name: &str) -> Option<&str> {
        self.keys.get(name).map(String::as_str)
    }
}

fn default_url() -> String {
    "/".to_string()
}

/// Payload fanned out to every subscriber
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Notification title
    pub title: String,
    /// Notification body text
    pub body: String,
    /// URL to open when the notification is clicked
    #[serde(default = "default_url")]
    pub url: String,
}

impl NotificationPayload {
    /// Create a new notification payload pointing at the site root
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            url: default_url(),
        }
    }

    /// Set the click-through URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}
