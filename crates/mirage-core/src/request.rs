//! Canonical per-request snapshot used throughout matching.

use hyper::header::HOST;
use hyper::Request;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Decomposition of an HTTP request into the fields a matcher can constrain.
///
/// Built once per intercepted request and dropped once the routing decision
/// has been made.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetails {
    pub scheme: String,
    /// `host[:port]` of the origin the client is trying to reach.
    pub destination: String,
    pub method: String,
    pub path: String,
    /// Query string without the leading `?`, pairs sorted by [`normalize_query`].
    pub query: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Vec<String>>,
}

impl RequestDetails {
    /// Snapshot an intercepted request.
    ///
    /// `default_scheme` is used when the request line is in origin-form, which
    /// is the case for requests unwrapped from a CONNECT tunnel ("https") and
    /// for plain requests sent straight to the proxy ("http").
    pub fn from_request<B>(req: &Request<B>, body: &[u8], default_scheme: &str) -> Self {
        let uri = req.uri();

        let destination = uri
            .authority()
            .map(|a| a.as_str().to_string())
            .or_else(|| {
                req.headers()
                    .get(HOST)
                    .map(|h| String::from_utf8_lossy(h.as_bytes()).into_owned())
            })
            .unwrap_or_default();

        let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in req.headers() {
            headers
                .entry(canonical_header_name(name.as_str()))
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }

        RequestDetails {
            scheme: uri.scheme_str().unwrap_or(default_scheme).to_string(),
            destination,
            method: req.method().as_str().to_string(),
            path: uri.path().to_string(),
            query: normalize_query(uri.query().unwrap_or("")),
            body: String::from_utf8_lossy(body).into_owned(),
            headers,
        }
    }

    /// Host part of the destination, without any port.
    pub fn host(&self) -> &str {
        strip_port(&self.destination)
    }

    /// All values carried for a header, looked up case-insensitively.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .flat_map(|(_, values)| values.iter().map(String::as_str))
    }
}

/// Re-serialize a query string with its `key=value` pairs sorted by the full
/// pair text, so that `b=b&a=a` and `a=a&b=b` compare equal.
///
/// Idempotent: normalizing an already normalized query returns it unchanged.
pub fn normalize_query(query: &str) -> String {
    if query.is_empty() {
        return String::new();
    }
    let mut pairs: Vec<&str> = query.split('&').collect();
    pairs.sort_unstable();
    pairs.join("&")
}

/// Strip a trailing `:port` from a host, leaving IPv6 literals intact.
pub fn strip_port(destination: &str) -> &str {
    if let Some(rest) = destination.strip_prefix('[') {
        // [::1]:8080
        return match rest.find(']') {
            Some(end) => &rest[..end],
            None => destination,
        };
    }
    match destination.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => {
            host
        }
        _ => destination,
    }
}

/// `content-type` -> `Content-Type`, matching how recorded simulations spell names.
fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_query_sorts_pairs() {
        assert_eq!(normalize_query("b=b&a=a"), "a=a&b=b");
        assert_eq!(normalize_query("z=1&a=2&m=3"), "a=2&m=3&z=1");
        assert_eq!(normalize_query(""), "");
    }

    #[test]
    fn test_normalize_query_is_idempotent() {
        for q in ["b=b&a=a", "a=1&a=0", "x", "c=3&b=2&a=1&", "k=v&k=a&j=z"] {
            let once = normalize_query(q);
            assert_eq!(normalize_query(&once), once, "query: {q}");
        }
    }

    #[test]
    fn test_normalize_query_sorts_by_full_pair() {
        // Same key: value decides the order
        assert_eq!(normalize_query("a=2&a=1"), "a=1&a=2");
    }

    #[test]
    fn test_from_request_absolute_form() {
        let req = Request::builder()
            .method("POST")
            .uri("http://api.example.com:8080/users?b=2&a=1")
            .header("content-type", "application/json")
            .header("x-trace", "one")
            .header("x-trace", "two")
            .body(())
            .unwrap();

        let details = RequestDetails::from_request(&req, br#"{"id":1}"#, "http");

        assert_eq!(details.scheme, "http");
        assert_eq!(details.destination, "api.example.com:8080");
        assert_eq!(details.method, "POST");
        assert_eq!(details.path, "/users");
        assert_eq!(details.query, "a=1&b=2");
        assert_eq!(details.body, r#"{"id":1}"#);
        assert_eq!(
            details.headers.get("Content-Type"),
            Some(&vec!["application/json".to_string()])
        );
        assert_eq!(
            details.headers.get("X-Trace"),
            Some(&vec!["one".to_string(), "two".to_string()])
        );
    }

    #[test]
    fn test_from_request_origin_form_uses_host_header() {
        let req = Request::builder()
            .uri("/secure")
            .header("host", "bank.example.com")
            .body(())
            .unwrap();

        let details = RequestDetails::from_request(&req, b"", "https");

        assert_eq!(details.scheme, "https");
        assert_eq!(details.destination, "bank.example.com");
        assert_eq!(details.method, "GET");
        assert_eq!(details.query, "");
    }

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("example.com:443"), "example.com");
        assert_eq!(strip_port("example.com"), "example.com");
        assert_eq!(strip_port("[::1]:8080"), "::1");
        assert_eq!(strip_port("::1"), "::1");
    }

    #[test]
    fn test_header_values_case_insensitive() {
        let mut details = RequestDetails::default();
        details
            .headers
            .insert("Accept".to_string(), vec!["text/html".to_string()]);

        let values: Vec<&str> = details.header_values("accept").collect();
        assert_eq!(values, vec!["text/html"]);
    }
}
