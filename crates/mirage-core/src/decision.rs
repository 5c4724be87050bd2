//! The per-request routing decision.

use crate::config::RoutingConfig;
use crate::error::{ConfigError, RoutingError};
use crate::request::RequestDetails;
use crate::simulation::{select, MatcherResponsePair, SimulationStore};
use crate::upstream::{ProxyClientResolver, UpstreamClient};
use std::sync::Arc;
use tracing::debug;

/// Outcome of routing one request.
#[derive(Debug, Clone)]
pub struct Decision {
    /// Client to use if the request goes to the network.
    pub client: Arc<UpstreamClient>,
    /// First stored pair whose matcher accepts the request.
    pub matched: Option<Arc<MatcherResponsePair>>,
}

impl Decision {
    pub fn is_simulated(&self) -> bool {
        self.matched.is_some()
    }
}

/// Combines client resolution with simulation lookup.
pub struct DecisionEngine {
    resolver: ProxyClientResolver,
    store: Arc<dyn SimulationStore>,
}

impl DecisionEngine {
    pub fn new(resolver: ProxyClientResolver, store: Arc<dyn SimulationStore>) -> Self {
        Self { resolver, store }
    }

    pub fn from_config(
        config: &RoutingConfig,
        store: Arc<dyn SimulationStore>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(ProxyClientResolver::from_config(config)?, store))
    }

    pub fn resolver(&self) -> &ProxyClientResolver {
        &self.resolver
    }

    pub fn store(&self) -> &Arc<dyn SimulationStore> {
        &self.store
    }

    /// Resolve the client and look up a stored response for `request`.
    ///
    /// The client is always resolved, so PAC failures surface even for
    /// requests a simulation would have answered.
    pub fn decide(&self, request: &RequestDetails) -> Result<Decision, RoutingError> {
        let client = self.resolver.resolve_client(&request.destination)?;
        let matched = self.find_pair(request);

        debug!(
            method = %request.method,
            destination = %request.destination,
            path = %request.path,
            proxy = client.proxy().map(|u| u.as_str()),
            matched = matched.is_some(),
            "Routing decision"
        );

        Ok(Decision { client, matched })
    }

    /// First stored pair matching `request`, evaluated against one snapshot.
    pub fn find_pair(&self, request: &RequestDetails) -> Option<Arc<MatcherResponsePair>> {
        let snapshot = self.store.all_pairs();
        select(request, &snapshot).cloned()
    }
}
