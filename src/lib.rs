// Serene - Typed consumers of RESTful APIs
//
// This library bundles the handler, configuration, event and mocking crates
// behind one dependency.

// Re-export the handler and everything it exposes
pub use serene_http_client::*;

// Re-export supporting crates
pub use serene_config;
pub use serene_events;

#[cfg(feature = "testing")]
pub use serene_testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use serene_config::{ApiConfig, ApiDefaults, ConfigManager};
    pub use serene_events::{Event, EventBus};
    pub use serene_http_client::prelude::*;

    #[cfg(feature = "testing")]
    pub use serene_testing::{MockConnectionProvider, MockResponse, MockTransport};
}
