//! OpenID Connect provider metadata and health.

pub mod discovery;
pub mod health;

pub use discovery::{DiscoveryClient, DiscoveryDocument, DiscoveryError};
pub use health::{HealthState, ProviderHealth, check_provider};
