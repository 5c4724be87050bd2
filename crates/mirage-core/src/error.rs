//! Error types for the routing-and-matching core.
//!
//! Only genuine failures are modelled here. "No pair matched" and "no
//! recognised PAC directive" are ordinary outcomes and are returned as
//! `Option`s by the components that produce them.

use bytes::Bytes;
use http_body_util::Full;
use hyper::Response;
use std::path::PathBuf;

/// Startup-time configuration failures. These abort process startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not parse upstream proxy '{address}': {reason}")]
    InvalidUpstreamProxy { address: String, reason: String },

    #[error("Failed to read PAC file '{}': {source}", path.display())]
    PacFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read configuration file '{}': {source}", path.display())]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to build TLS configuration: {0}")]
    Tls(#[from] rustls::Error),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Per-request proxy auto-configuration failures.
#[derive(Debug, thiserror::Error)]
pub enum PacError {
    #[error("Unable to parse PAC file: {0}")]
    Parse(String),

    #[error("PAC file does not define FindProxyForURL")]
    MissingEntryPoint,

    #[error("PAC evaluation failed for host '{host}': {reason}")]
    Evaluation { host: String, reason: String },

    #[error("PAC file returned a non-string result for host '{0}'")]
    NonStringResult(String),

    #[error("PAC directive names an invalid proxy '{address}': {reason}")]
    InvalidProxy { address: String, reason: String },
}

/// Failures building a matcher or a stored response from a declared view.
#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error("Invalid regex pattern for {field}: {source}")]
    Regex {
        field: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid JSON pattern for {field}: {source}")]
    Json {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid JSONPath expression for {field}: {reason}")]
    JsonPath { field: &'static str, reason: String },

    #[error("Invalid XML pattern for {field}: {reason}")]
    Xml { field: &'static str, reason: String },

    #[error("Invalid XPath expression for {field}: {reason}")]
    XPath { field: &'static str, reason: String },

    #[error("Invalid response status code: {0}")]
    Status(u16),

    #[error("Response body is flagged as encoded but is not valid base64: {0}")]
    EncodedBody(#[from] base64::DecodeError),

    #[error("Failed to parse simulation: {0}")]
    Simulation(#[from] serde_json::Error),
}

/// Failure to route a single request. Surfaced to the client as a 502.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error(transparent)]
    Pac(#[from] PacError),
}

impl RoutingError {
    /// HTTP status used when reporting this error to the proxied client.
    pub fn status(&self) -> u16 {
        502
    }

    /// Render the error through the proxy's normal error-response path.
    pub fn to_response(&self) -> Response<Full<Bytes>> {
        let body = serde_json::json!({ "error": self.to_string() }).to_string();
        let mut response = Response::new(Full::new(Bytes::from(body)));
        *response.status_mut() =
            hyper::StatusCode::from_u16(self.status()).unwrap_or(hyper::StatusCode::BAD_GATEWAY);
        response.headers_mut().insert(
            hyper::header::CONTENT_TYPE,
            hyper::header::HeaderValue::from_static("application/json"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_error_renders_bad_gateway() {
        let err = RoutingError::from(PacError::MissingEntryPoint);
        let response = err.to_response();

        assert_eq!(response.status(), 502);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_pac_error_message_names_host() {
        let err = PacError::Evaluation {
            host: "example.com".to_string(),
            reason: "boom".to_string(),
        };
        assert!(err.to_string().contains("example.com"));
    }
}
