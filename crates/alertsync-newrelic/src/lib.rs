//! New Relic adapters for the alertsync engine.
//!
//! [`NewRelicClient`] carries the HTTP client, base URLs and API key.
//! [`ConditionApi`] implements `ResourceAdapter` for a single condition kind
//! and [`PolicyApi`] implements `PolicyDirectory`.

pub mod client;
pub mod conditions;
pub mod policies;

pub use client::{DEFAULT_API_URL, DEFAULT_INFRA_API_URL, Endpoints, NewRelicClient};
pub use conditions::{ConditionApi, condition_adapters};
pub use policies::{PolicyApi, PolicyPager};
