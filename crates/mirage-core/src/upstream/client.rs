//! Outbound HTTP client construction.

use super::tls::insecure_client_config;
use crate::config::parse_upstream_proxy;
use crate::error::ConfigError;
use reqwest::redirect::Policy;
use reqwest::Url;
use tracing::{debug, warn};

/// Settings a client was built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub tls_verification: bool,
    pub proxy: Option<Url>,
    pub follows_redirects: bool,
}

impl ClientSettings {
    fn redirect_policy(&self) -> Policy {
        if self.follows_redirects {
            Policy::default()
        } else {
            Policy::none()
        }
    }
}

/// An outbound HTTP client together with the settings it was built from.
///
/// Clients never follow redirects: 3xx responses reach the caller as-is so
/// they can be recorded and replayed verbatim.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    settings: ClientSettings,
    http: reqwest::Client,
}

impl UpstreamClient {
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn verifies_tls(&self) -> bool {
        self.settings.tls_verification
    }

    /// Upstream proxy all traffic is sent through, if any.
    pub fn proxy(&self) -> Option<&Url> {
        self.settings.proxy.as_ref()
    }

    pub fn follows_redirects(&self) -> bool {
        self.settings.follows_redirects
    }
}

/// Builds upstream clients sharing one TLS policy.
pub struct ClientFactory {
    tls_verification: bool,
    insecure_tls: Option<rustls::ClientConfig>,
}

impl ClientFactory {
    pub fn new(tls_verification: bool) -> Result<Self, ConfigError> {
        let insecure_tls = if tls_verification {
            None
        } else {
            warn!("Upstream TLS certificate verification is disabled");
            Some(insecure_client_config()?)
        };
        Ok(Self {
            tls_verification,
            insecure_tls,
        })
    }

    pub fn tls_verification(&self) -> bool {
        self.tls_verification
    }

    /// Build a client. An empty `upstream_proxy` means connect directly.
    pub fn build(&self, upstream_proxy: &str) -> Result<UpstreamClient, ConfigError> {
        let proxy = parse_upstream_proxy(upstream_proxy)?;
        self.build_with_proxy(proxy)
    }

    pub fn build_with_proxy(&self, proxy: Option<Url>) -> Result<UpstreamClient, ConfigError> {
        let settings = ClientSettings {
            tls_verification: self.tls_verification,
            proxy,
            follows_redirects: false,
        };
        let mut builder = reqwest::Client::builder().redirect(settings.redirect_policy());

        builder = match &settings.proxy {
            Some(url) => builder.proxy(reqwest::Proxy::all(url.clone())?),
            // Ignore HTTP(S)_PROXY from the environment
            None => builder.no_proxy(),
        };

        if let Some(tls) = &self.insecure_tls {
            builder = builder.use_preconfigured_tls(tls.clone());
        }

        let http = builder.build()?;
        debug!(
            tls_verification = settings.tls_verification,
            proxy = settings.proxy.as_ref().map(Url::as_str),
            "Built upstream client"
        );

        Ok(UpstreamClient { settings, http })
    }
}

/// Build a single client. Prefer a shared [`ClientFactory`] when building
/// several, since it prepares the TLS configuration once.
pub fn build_client(
    tls_verification: bool,
    upstream_proxy: &str,
) -> Result<UpstreamClient, ConfigError> {
    ClientFactory::new(tls_verification)?.build(upstream_proxy)
}
