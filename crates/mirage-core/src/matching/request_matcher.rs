//! Whole-request predicate built from per-dimension field matchers.

use super::field::{RequestFieldMatchers, RequestFieldMatchersView};
use crate::error::MatcherError;
use crate::request::RequestDetails;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declared form of a request matcher.
///
/// An absent dimension places no constraint on the request.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestMatcherView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<RequestFieldMatchersView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<RequestFieldMatchersView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<RequestFieldMatchersView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<RequestFieldMatchersView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<RequestFieldMatchersView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<RequestFieldMatchersView>,
    /// Header name -> values that must all be present.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Vec<String>>,
}

/// Compiled request predicate.
#[derive(Debug, Clone, Default)]
pub struct RequestMatcher {
    pub scheme: Option<RequestFieldMatchers>,
    pub destination: Option<RequestFieldMatchers>,
    pub method: Option<RequestFieldMatchers>,
    pub path: Option<RequestFieldMatchers>,
    pub query: Option<RequestFieldMatchers>,
    pub body: Option<RequestFieldMatchers>,
    pub headers: BTreeMap<String, Vec<String>>,
}

impl RequestMatcher {
    /// Compile a declared matcher.
    ///
    /// Every pattern is validated here; an exact-match query is stored with
    /// its pairs sorted so it compares equal to normalized request queries.
    pub fn from_view(view: &RequestMatcherView) -> Result<Self, MatcherError> {
        Ok(RequestMatcher {
            scheme: RequestFieldMatchers::from_view(view.scheme.as_ref(), "scheme")?,
            destination: RequestFieldMatchers::from_view(
                view.destination.as_ref(),
                "destination",
            )?,
            method: RequestFieldMatchers::from_view(view.method.as_ref(), "method")?,
            path: RequestFieldMatchers::from_view(view.path.as_ref(), "path")?,
            query: RequestFieldMatchers::from_query_view(view.query.as_ref())?,
            body: RequestFieldMatchers::from_view(view.body.as_ref(), "body")?,
            headers: view.headers.clone(),
        })
    }

    /// The declared view, after normalization.
    pub fn view(&self) -> RequestMatcherView {
        RequestMatcherView {
            scheme: self.scheme.as_ref().map(RequestFieldMatchers::view),
            destination: self.destination.as_ref().map(RequestFieldMatchers::view),
            method: self.method.as_ref().map(RequestFieldMatchers::view),
            path: self.path.as_ref().map(RequestFieldMatchers::view),
            query: self.query.as_ref().map(RequestFieldMatchers::view),
            body: self.body.as_ref().map(RequestFieldMatchers::view),
            headers: self.headers.clone(),
        }
    }

    fn dimensions(&self) -> [(Option<&RequestFieldMatchers>, fn(&RequestDetails) -> &str); 6] {
        [
            (self.scheme.as_ref(), |r| r.scheme.as_str()),
            (self.destination.as_ref(), |r| r.destination.as_str()),
            (self.method.as_ref(), |r| r.method.as_str()),
            (self.path.as_ref(), |r| r.path.as_str()),
            (self.query.as_ref(), |r| r.query.as_str()),
            (self.body.as_ref(), |r| r.body.as_str()),
        ]
    }

    /// True when no dimension is constrained, so every request matches.
    pub fn is_open(&self) -> bool {
        self.headers.is_empty() && self.dimensions().iter().all(|(m, _)| m.is_none())
    }

    /// Check if a request satisfies every populated dimension.
    pub fn matches(&self, request: &RequestDetails) -> bool {
        let fields_match = self
            .dimensions()
            .into_iter()
            .all(|(matcher, field)| matcher.map_or(true, |m| m.matches(field(request))));

        fields_match && self.headers_match(request)
    }

    fn headers_match(&self, request: &RequestDetails) -> bool {
        self.headers.iter().all(|(name, required)| {
            required
                .iter()
                .all(|value| request.header_values(name).any(|actual| actual == value))
        })
    }

    /// Reduce the matcher to a concrete request when it is a pure
    /// conjunction of equality tests.
    ///
    /// Returns `None` when no field dimension is constrained (header-only
    /// matchers included) or when any populated dimension uses a strategy
    /// other than a single exact match. Headers are always equality
    /// constraints and are copied through.
    pub fn build_request_details_from_exact_matches(&self) -> Option<RequestDetails> {
        if self.dimensions().iter().all(|(m, _)| m.is_none()) {
            return None;
        }

        let mut exact = [""; 6];
        for (slot, (matcher, _)) in exact.iter_mut().zip(self.dimensions()) {
            if let Some(matcher) = matcher {
                *slot = matcher.exact_only()?;
            }
        }
        let [scheme, destination, method, path, query, body] = exact;

        Some(RequestDetails {
            scheme: scheme.to_string(),
            destination: destination.to_string(),
            method: method.to_string(),
            path: path.to_string(),
            query: query.to_string(),
            body: body.to_string(),
            headers: self.headers.clone(),
        })
    }
}
