//! Mirage: routing and matching core of a service-virtualization proxy.
//!
//! For every intercepted request the proxy needs two answers: which client
//! carries live traffic to the origin (direct, a static upstream proxy, or
//! whatever a PAC script picks for the host), and whether a stored
//! simulation pair already answers the request.
//!
//! - [`matching`] - Field and request matchers
//! - [`simulation`] - Stored pairs, the store and first-match selection
//! - [`upstream`] - Client factory, TLS policy, PAC evaluation and resolver
//! - [`decision`] - Both answers for one request
//! - [`config`] - YAML routing configuration

pub mod config;
pub mod decision;
pub mod error;
pub mod matching;
pub mod request;
pub mod simulation;
pub mod upstream;

pub use config::RoutingConfig;
pub use decision::{Decision, DecisionEngine};
pub use error::{ConfigError, MatcherError, PacError, RoutingError};
pub use request::RequestDetails;
