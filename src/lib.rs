// Module declarations
pub mod config;
pub mod push;
pub mod shutdown;

// Server module (HTTP API)
pub mod server;

pub use config::{Cli, Command, ConfigError, RelayConfig};
pub use push::{
    DeliveryDispatcher, DeliveryError, DeliveryOutcome, NotificationPayload, PushTransport,
    SubscriptionRecord, SubscriptionRegistry, VapidCredentials, WebPushTransport,
};
pub use server::{build_cors, build_router, run_server, ServerAppState, ServerError};
