//! Per-dimension matcher container and its declared view.

use super::strategy::{FieldMatcher, MatchStrategy};
use crate::error::MatcherError;
use crate::request::normalize_query;
use serde::{Deserialize, Serialize};

/// Declared form of one request dimension's matchers, as found in
/// simulation files. Every populated strategy must pass.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestFieldMatchersView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact_match: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glob_match: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex_match: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_match: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_path_match: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xml_match: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xpath_match: Option<String>,
}

impl RequestFieldMatchersView {
    /// Shorthand for a view holding only an exact match.
    pub fn exact(value: impl Into<String>) -> Self {
        Self {
            exact_match: Some(value.into()),
            ..Default::default()
        }
    }

    fn slot(&self, strategy: MatchStrategy) -> Option<&String> {
        match strategy {
            MatchStrategy::Exact => self.exact_match.as_ref(),
            MatchStrategy::Glob => self.glob_match.as_ref(),
            MatchStrategy::Regex => self.regex_match.as_ref(),
            MatchStrategy::JsonEqual => self.json_match.as_ref(),
            MatchStrategy::JsonPath => self.json_path_match.as_ref(),
            MatchStrategy::XmlEqual => self.xml_match.as_ref(),
            MatchStrategy::XPath => self.xpath_match.as_ref(),
        }
    }

    fn slot_mut(&mut self, strategy: MatchStrategy) -> &mut Option<String> {
        match strategy {
            MatchStrategy::Exact => &mut self.exact_match,
            MatchStrategy::Glob => &mut self.glob_match,
            MatchStrategy::Regex => &mut self.regex_match,
            MatchStrategy::JsonEqual => &mut self.json_match,
            MatchStrategy::JsonPath => &mut self.json_path_match,
            MatchStrategy::XmlEqual => &mut self.xml_match,
            MatchStrategy::XPath => &mut self.xpath_match,
        }
    }
}

/// Compiled matchers for one request dimension.
///
/// Never empty: a dimension without any strategy is represented by the
/// absence of a `RequestFieldMatchers` altogether.
#[derive(Debug, Clone)]
pub struct RequestFieldMatchers {
    matchers: Vec<FieldMatcher>,
}

impl RequestFieldMatchers {
    /// Compile a declared view. Returns `None` when the view (or any of its
    /// strategies) is absent, meaning the dimension is unconstrained.
    pub fn from_view(
        view: Option<&RequestFieldMatchersView>,
        field: &'static str,
    ) -> Result<Option<Self>, MatcherError> {
        let Some(view) = view else {
            return Ok(None);
        };

        let mut matchers = Vec::new();
        for strategy in MatchStrategy::ALL {
            if let Some(pattern) = view.slot(strategy) {
                matchers.push(FieldMatcher::compile(strategy, pattern, field)?);
            }
        }

        if matchers.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Self { matchers }))
        }
    }

    /// Like [`from_view`](Self::from_view), with the exact-match query sorted
    /// by [`normalize_query`] first. Other strategies see the raw text.
    pub fn from_query_view(
        view: Option<&RequestFieldMatchersView>,
    ) -> Result<Option<Self>, MatcherError> {
        let normalized = view.map(|v| RequestFieldMatchersView {
            exact_match: v.exact_match.as_deref().map(normalize_query),
            ..v.clone()
        });
        Self::from_view(normalized.as_ref(), "query")
    }

    /// All strategies must pass.
    pub fn matches(&self, actual: &str) -> bool {
        self.matchers.iter().all(|m| m.matches(actual))
    }

    /// The literal value when this dimension is a single exact match.
    pub fn exact_only(&self) -> Option<&str> {
        match self.matchers.as_slice() {
            [FieldMatcher::Exact(value)] => Some(value),
            _ => None,
        }
    }

    pub fn matchers(&self) -> &[FieldMatcher] {
        &self.matchers
    }

    pub fn view(&self) -> RequestFieldMatchersView {
        let mut view = RequestFieldMatchersView::default();
        for matcher in &self.matchers {
            *view.slot_mut(matcher.strategy()) = Some(matcher.pattern().to_string());
        }
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_view_builds_matchers() {
        let view = RequestFieldMatchersView::exact("exactly");
        let unit = RequestFieldMatchers::from_view(Some(&view), "path")
            .unwrap()
            .unwrap();

        assert_eq!(unit.exact_only(), Some("exactly"));
        assert_eq!(unit.view(), view);
    }

    #[test]
    fn test_from_view_none_when_absent() {
        assert!(RequestFieldMatchers::from_view(None, "path")
            .unwrap()
            .is_none());
        let empty = RequestFieldMatchersView::default();
        assert!(RequestFieldMatchers::from_view(Some(&empty), "path")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_all_strategies_must_pass() {
        let view = RequestFieldMatchersView {
            glob_match: Some("/api/*".to_string()),
            regex_match: Some(r"\d+$".to_string()),
            ..Default::default()
        };
        let unit = RequestFieldMatchers::from_view(Some(&view), "path")
            .unwrap()
            .unwrap();

        assert!(unit.matches("/api/users/42"));
        assert!(!unit.matches("/api/users"));
        assert!(!unit.matches("/other/42"));
        assert_eq!(unit.exact_only(), None);
    }

    #[test]
    fn test_exact_plus_other_strategy_is_not_exact_only() {
        let view = RequestFieldMatchersView {
            exact_match: Some("/a".to_string()),
            glob_match: Some("/*".to_string()),
            ..Default::default()
        };
        let unit = RequestFieldMatchers::from_view(Some(&view), "path")
            .unwrap()
            .unwrap();
        assert_eq!(unit.exact_only(), None);
    }

    #[test]
    fn test_query_view_sorts_exact_only() {
        let view = RequestFieldMatchersView {
            exact_match: Some("b=b&a=a".to_string()),
            glob_match: Some("b=*&a=*".to_string()),
            ..Default::default()
        };
        let unit = RequestFieldMatchers::from_query_view(Some(&view))
            .unwrap()
            .unwrap();
        let stored = unit.view();

        assert_eq!(stored.exact_match.as_deref(), Some("a=a&b=b"));
        assert_eq!(stored.glob_match.as_deref(), Some("b=*&a=*"));
    }

    #[test]
    fn test_view_serde_camel_case() {
        let json = r#"{"exactMatch": "/", "jsonPathMatch": "$.a"}"#;
        let view: RequestFieldMatchersView = serde_json::from_str(json).unwrap();
        assert_eq!(view.exact_match.as_deref(), Some("/"));
        assert_eq!(view.json_path_match.as_deref(), Some("$.a"));

        let out = serde_json::to_value(&view).unwrap();
        assert_eq!(out, serde_json::json!({"exactMatch": "/", "jsonPathMatch": "$.a"}));
    }
}
