//! Stored request/response pairs and their import/export format.

use crate::error::MatcherError;
use crate::matching::{RequestMatcher, RequestMatcherView};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// A recorded response returned instead of contacting the origin.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDetails {
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub body: String,
    /// Body holds base64 of a binary payload.
    #[serde(default)]
    pub encoded_body: bool,
    #[serde(default)]
    pub headers: BTreeMap<String, Vec<String>>,
    /// Body contains template directives to render against the matched
    /// request. Rendering happens outside this crate; the flag is carried as is.
    #[serde(default)]
    pub templated: bool,
}

fn default_status() -> u16 {
    200
}

impl Default for ResponseDetails {
    fn default() -> Self {
        Self {
            status: default_status(),
            body: String::new(),
            encoded_body: false,
            headers: BTreeMap::new(),
            templated: false,
        }
    }
}

impl ResponseDetails {
    fn validate(&self) -> Result<(), MatcherError> {
        StatusCode::from_u16(self.status).map_err(|_| MatcherError::Status(self.status))?;
        self.body_bytes()?;
        Ok(())
    }

    /// Raw body bytes, decoding base64 when `encoded_body` is set.
    pub fn body_bytes(&self) -> Result<Bytes, MatcherError> {
        if self.encoded_body {
            Ok(Bytes::from(STANDARD.decode(&self.body)?))
        } else {
            Ok(Bytes::from(self.body.clone()))
        }
    }

    /// Build the HTTP response to send back to the proxied client.
    pub fn to_response(&self) -> Result<Response<Full<Bytes>>, MatcherError> {
        let mut response = Response::new(Full::new(self.body_bytes()?));
        *response.status_mut() =
            StatusCode::from_u16(self.status).map_err(|_| MatcherError::Status(self.status))?;

        let headers = response.headers_mut();
        for (name, values) in &self.headers {
            let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
                warn!("Skipping invalid stored header name: {}", name);
                continue;
            };
            for value in values {
                match HeaderValue::from_str(value) {
                    Ok(v) => {
                        headers.append(header_name.clone(), v);
                    }
                    Err(_) => warn!("Skipping invalid value for stored header {}", name),
                }
            }
        }

        Ok(response)
    }
}

/// Declared form of a pair, as imported from and exported to simulation files.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MatcherResponsePairView {
    #[serde(default)]
    pub request_matcher: RequestMatcherView,
    #[serde(default)]
    pub response: ResponseDetails,
}

/// A compiled request matcher and the response it answers with.
#[derive(Debug, Clone)]
pub struct MatcherResponsePair {
    pub request_matcher: RequestMatcher,
    pub response: ResponseDetails,
}

impl MatcherResponsePair {
    pub fn new(request_matcher: RequestMatcher, response: ResponseDetails) -> Self {
        Self {
            request_matcher,
            response,
        }
    }

    /// Compile a declared pair, validating every pattern and the response.
    pub fn from_view(view: &MatcherResponsePairView) -> Result<Self, MatcherError> {
        view.response.validate()?;
        Ok(Self {
            request_matcher: RequestMatcher::from_view(&view.request_matcher)?,
            response: view.response.clone(),
        })
    }

    pub fn view(&self) -> MatcherResponsePairView {
        MatcherResponsePairView {
            request_matcher: self.request_matcher.view(),
            response: self.response.clone(),
        }
    }
}

/// A whole simulation document: `{"data": {"pairs": [...]}}`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct SimulationView {
    pub data: SimulationData,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct SimulationData {
    #[serde(default)]
    pub pairs: Vec<MatcherResponsePairView>,
}

impl SimulationView {
    pub fn from_json(json: &str) -> Result<Self, MatcherError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Compile every pair, in document order. Fails on the first bad pair.
    pub fn compile(&self) -> Result<Vec<MatcherResponsePair>, MatcherError> {
        self.data
            .pairs
            .iter()
            .map(MatcherResponsePair::from_view)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::RequestFieldMatchersView;
    use http_body_util::BodyExt;

    #[test]
    fn test_from_view_builds_pair() {
        let unit = MatcherResponsePair::from_view(&MatcherResponsePairView {
            request_matcher: RequestMatcherView {
                path: Some(RequestFieldMatchersView::exact("/")),
                ..Default::default()
            },
            response: ResponseDetails {
                body: "body".to_string(),
                ..Default::default()
            },
        })
        .unwrap();

        assert_eq!(
            unit.request_matcher.path.as_ref().unwrap().exact_only(),
            Some("/")
        );
        assert!(unit.request_matcher.destination.is_none());
        assert_eq!(unit.response.body, "body");
    }

    #[test]
    fn test_from_view_sorts_query() {
        let unit = MatcherResponsePair::from_view(&MatcherResponsePairView {
            request_matcher: RequestMatcherView {
                query: Some(RequestFieldMatchersView::exact("b=b&a=a")),
                ..Default::default()
            },
            response: ResponseDetails::default(),
        })
        .unwrap();

        assert_eq!(
            unit.request_matcher.query.as_ref().unwrap().exact_only(),
            Some("a=a&b=b")
        );
    }

    #[test]
    fn test_from_view_stores_templated() {
        let unit = MatcherResponsePair::from_view(&MatcherResponsePairView {
            request_matcher: RequestMatcherView::default(),
            response: ResponseDetails {
                body: "{{ Request.Path }}".to_string(),
                templated: true,
                ..Default::default()
            },
        })
        .unwrap();

        assert!(unit.response.templated);
        assert!(unit.view().response.templated);
    }

    #[test]
    fn test_from_view_rejects_bad_encoded_body() {
        let err = MatcherResponsePair::from_view(&MatcherResponsePairView {
            request_matcher: RequestMatcherView::default(),
            response: ResponseDetails {
                body: "!!not base64!!".to_string(),
                encoded_body: true,
                ..Default::default()
            },
        })
        .unwrap_err();
        assert!(matches!(err, MatcherError::EncodedBody(_)));
    }

    #[test]
    fn test_from_view_rejects_bad_status() {
        let err = MatcherResponsePair::from_view(&MatcherResponsePairView {
            request_matcher: RequestMatcherView::default(),
            response: ResponseDetails {
                status: 42,
                ..Default::default()
            },
        })
        .unwrap_err();
        assert!(matches!(err, MatcherError::Status(42)));
    }

    #[tokio::test]
    async fn test_to_response_decodes_body_and_headers() {
        let response = ResponseDetails {
            status: 201,
            body: STANDARD.encode(b"\x00\x01binary"),
            encoded_body: true,
            headers: BTreeMap::from([(
                "Set-Cookie".to_string(),
                vec!["a=1".to_string(), "b=2".to_string()],
            )]),
            templated: false,
        }
        .to_response()
        .unwrap();

        assert_eq!(response.status(), 201);
        assert_eq!(response.headers().get_all("set-cookie").iter().count(), 2);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"\x00\x01binary");
    }

    #[test]
    fn test_simulation_document_parses() {
        let json = r#"{
            "data": {
                "pairs": [
                    {
                        "requestMatcher": {
                            "destination": {"exactMatch": "api.example.com"},
                            "path": {"globMatch": "/users/*"}
                        },
                        "response": {"status": 200, "body": "user", "templated": false}
                    },
                    {
                        "requestMatcher": {},
                        "response": {"status": 404}
                    }
                ]
            }
        }"#;

        let pairs = SimulationView::from_json(json).unwrap().compile().unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].response.body, "user");
        assert!(pairs[1].request_matcher.is_open());
        assert_eq!(pairs[1].response.status, 404);
    }
}
