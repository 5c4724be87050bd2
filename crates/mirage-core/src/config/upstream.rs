//! Upstream proxy address handling.

use crate::error::ConfigError;
use reqwest::Url;

/// Parse an upstream proxy address.
///
/// An empty address means no upstream. Addresses without an `http://` or
/// `https://` scheme are treated as `host:port` and given `http://` first,
/// so hosts named like `http-gw.corp` still parse.
pub fn parse_upstream_proxy(address: &str) -> Result<Option<Url>, ConfigError> {
    let address = address.trim();
    if address.is_empty() {
        return Ok(None);
    }

    let has_scheme = ["http://", "https://"].iter().any(|scheme| {
        address
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    });
    let invalid = |reason: String| ConfigError::InvalidUpstreamProxy {
        address: address.to_string(),
        reason,
    };

    let normalized = if has_scheme {
        address.to_string()
    } else if let Some((scheme, _)) = address.split_once("://") {
        return Err(invalid(format!("unsupported scheme '{scheme}'")));
    } else {
        format!("http://{address}")
    };

    let url = Url::parse(&normalized).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(Some(url))
}
