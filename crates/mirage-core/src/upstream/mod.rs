//! Upstream routing: how live traffic leaves the proxy.
//!
//! - `client` - `ClientFactory` and the `UpstreamClient` it builds
//! - `tls` - Certificate verification policy
//! - `pac` - Proxy auto-config evaluation
//! - `directive` - Parsing `FindProxyForURL` results
//! - `resolver` - Per-request client choice

mod client;
mod directive;
mod pac;
mod resolver;
mod tls;

pub use client::{build_client, ClientFactory, ClientSettings, UpstreamClient};
pub use directive::{first_directive, parse_directives, ProxyDirective};
pub use pac::PacScript;
pub use resolver::{PacCacheConfig, ProxyClientResolver};
pub use tls::{insecure_client_config, NoVerifier};
