//! Web Push relay core
//!
//! Holds browser push subscriptions in memory and fans notifications out
//! to them through a `PushTransport`.

pub mod dispatcher;
pub mod registry;
pub mod transport;
pub mod types;
pub mod vapid;

pub use dispatcher::{DeliveryDispatcher, DeliveryOutcome, Dispatch};
pub use registry::{Registration, SubscriptionRegistry};
pub use transport::{DeliveryError, PushTransport, WebPushTransport, DEFAULT_TTL_SECS};
pub use types::{NotificationPayload, SubscriptionKeys, SubscriptionRecord};
pub use vapid::{generate_vapid_keys, VapidCredentials, VapidError, VapidKeyPair};
