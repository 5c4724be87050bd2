//! Per-request choice of the upstream client.

use super::client::{ClientFactory, UpstreamClient};
use super::directive::{first_directive, ProxyDirective};
use super::pac::PacScript;
use crate::config::RoutingConfig;
use crate::error::{ConfigError, PacError};
use crate::request::strip_port;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Per-host cache of PAC decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacCacheConfig {
    pub enabled: bool,
    /// Maximum number of cached hosts (least recently used evicted first).
    pub max_size: usize,
    /// Age after which an entry is evaluated again. Zero disables expiry.
    pub ttl: Duration,
}

impl Default for PacCacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_size: 1024,
            ttl: Duration::from_secs(300),
        }
    }
}

impl PacCacheConfig {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }
}

struct CacheEntry {
    client: Option<Arc<UpstreamClient>>,
    created_at: Instant,
    last_accessed: Instant,
}

impl CacheEntry {
    fn new(client: Option<Arc<UpstreamClient>>) -> Self {
        let now = Instant::now();
        Self {
            client,
            created_at: now,
            last_accessed: now,
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        !ttl.is_zero() && self.created_at.elapsed() > ttl
    }
}

#[derive(Default)]
struct PacState {
    script: Option<Arc<PacScript>>,
    cache: HashMap<String, CacheEntry>,
}

impl PacState {
    /// Cached decision for `host`. The outer `None` is a miss.
    fn lookup(&mut self, host: &str, ttl: Duration) -> Option<Option<Arc<UpstreamClient>>> {
        if self.cache.get(host)?.is_expired(ttl) {
            self.cache.remove(host);
            trace!(host, "PAC cache entry expired");
            return None;
        }
        let entry = self.cache.get_mut(host)?;
        entry.last_accessed = Instant::now();
        Some(entry.client.clone())
    }

    fn insert(&mut self, host: &str, client: Option<Arc<UpstreamClient>>, max_size: usize) {
        if max_size == 0 {
            return;
        }
        if self.cache.len() >= max_size && !self.cache.contains_key(host) {
            self.evict_lru();
        }
        self.cache.insert(host.to_string(), CacheEntry::new(client));
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .cache
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(host, _)| host.clone());
        if let Some(host) = oldest {
            self.cache.remove(&host);
            trace!(host = %host, "Evicted PAC cache entry");
        }
    }
}

/// Picks the client for each outbound request.
///
/// Without a PAC script every request uses the shared default client. With
/// one, the script is evaluated for the destination host and its first
/// recognized directive decides.
pub struct ProxyClientResolver {
    factory: ClientFactory,
    default_client: Arc<UpstreamClient>,
    direct_client: Arc<UpstreamClient>,
    pac: RwLock<PacState>,
    cache: PacCacheConfig,
}

impl ProxyClientResolver {
    pub fn new(
        factory: ClientFactory,
        upstream_proxy: &str,
        pac_script: Option<PacScript>,
        cache: PacCacheConfig,
    ) -> Result<Self, ConfigError> {
        let default_client = Arc::new(factory.build(upstream_proxy)?);
        let direct_client = if default_client.proxy().is_none() {
            Arc::clone(&default_client)
        } else {
            Arc::new(factory.build_with_proxy(None)?)
        };

        if pac_script.is_some() && default_client.proxy().is_some() {
            warn!("Both a PAC script and an upstream proxy are configured; the PAC script takes precedence");
        }
        info!(
            upstream = default_client.proxy().map(|u| u.as_str()),
            pac = pac_script.is_some(),
            pac_cache = cache.enabled,
            pac_cache_max_size = cache.max_size,
            pac_cache_ttl_secs = cache.ttl.as_secs(),
            "Proxy client resolver ready"
        );

        Ok(Self {
            factory,
            default_client,
            direct_client,
            pac: RwLock::new(PacState {
                script: pac_script.map(Arc::new),
                cache: HashMap::new(),
            }),
            cache,
        })
    }

    pub fn from_config(config: &RoutingConfig) -> Result<Self, ConfigError> {
        let factory = ClientFactory::new(config.tls_verification)?;
        Self::new(
            factory,
            config.upstream_proxy.as_deref().unwrap_or_default(),
            config.load_pac_script()?,
            config.pac_cache_config(),
        )
    }

    /// Client used when no PAC script is configured or it recognizes nothing.
    pub fn default_client(&self) -> &Arc<UpstreamClient> {
        &self.default_client
    }

    pub fn pac_script(&self) -> Option<Arc<PacScript>> {
        self.pac.read().script.clone()
    }

    /// Number of hosts with a cached PAC decision.
    pub fn cached_hosts(&self) -> usize {
        self.pac.read().cache.len()
    }

    /// Swap the PAC script at runtime. Cached host decisions are dropped.
    pub fn replace_pac_script(&self, script: Option<PacScript>) {
        let mut state = self.pac.write();
        info!(pac = script.is_some(), "Replacing PAC script");
        *state = PacState {
            script: script.map(Arc::new),
            cache: HashMap::new(),
        };
    }

    /// Client for a request to `destination` (`host` or `host:port`).
    pub fn resolve_client(&self, destination: &str) -> Result<Arc<UpstreamClient>, PacError> {
        Ok(self
            .resolve_pac(destination)?
            .unwrap_or_else(|| Arc::clone(&self.default_client)))
    }

    /// Evaluate the PAC script for `destination`.
    ///
    /// `Ok(None)` means there is no script, or its result contained no
    /// `DIRECT` or `PROXY` directive.
    pub fn resolve_pac(
        &self,
        destination: &str,
    ) -> Result<Option<Arc<UpstreamClient>>, PacError> {
        let host = strip_port(destination);

        let script = if self.cache.enabled {
            let mut state = self.pac.write();
            let Some(script) = state.script.clone() else {
                return Ok(None);
            };
            if let Some(hit) = state.lookup(host, self.cache.ttl) {
                return Ok(hit);
            }
            script
        } else {
            let Some(script) = self.pac.read().script.clone() else {
                return Ok(None);
            };
            script
        };

        let result = script.find_proxy("", host)?;
        let client = match first_directive(&result) {
            Some(ProxyDirective::Direct) => Some(Arc::clone(&self.direct_client)),
            Some(ProxyDirective::Proxy(address)) => {
                let client = self.factory.build(&address).map_err(|e| PacError::InvalidProxy {
                    address: address.clone(),
                    reason: e.to_string(),
                })?;
                Some(Arc::new(client))
            }
            None => {
                debug!(host, result = %result, "PAC result has no usable directive");
                None
            }
        };

        if self.cache.enabled {
            let mut state = self.pac.write();
            // Skip the insert if the script was replaced while evaluating
            let unchanged = state
                .script
                .as_ref()
                .is_some_and(|current| Arc::ptr_eq(current, &script));
            if unchanged {
                state.insert(host, client.clone(), self.cache.max_size);
            }
        }

        Ok(client)
    }
}
