//! Field matching strategies and their compiled runtime form.

use super::structural::{validate_xpath, xpath_selects, XmlNode};
use crate::error::MatcherError;
use regex::Regex;
use serde_json_path::JsonPath;
use std::fmt;
use std::sync::Arc;

/// The closed set of ways a single request field can be matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStrategy {
    Exact,
    Glob,
    Regex,
    JsonEqual,
    JsonPath,
    XmlEqual,
    XPath,
}

impl MatchStrategy {
    /// Evaluation order within a field; cheap strategies first.
    pub const ALL: [MatchStrategy; 7] = [
        MatchStrategy::Exact,
        MatchStrategy::Glob,
        MatchStrategy::Regex,
        MatchStrategy::JsonEqual,
        MatchStrategy::JsonPath,
        MatchStrategy::XmlEqual,
        MatchStrategy::XPath,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::Exact => "exactMatch",
            MatchStrategy::Glob => "globMatch",
            MatchStrategy::Regex => "regexMatch",
            MatchStrategy::JsonEqual => "jsonMatch",
            MatchStrategy::JsonPath => "jsonPathMatch",
            MatchStrategy::XmlEqual => "xmlMatch",
            MatchStrategy::XPath => "xpathMatch",
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled matcher for one field value.
///
/// Patterns are validated and pre-compiled here so evaluation never fails;
/// an actual value that cannot be parsed as the expected structure simply
/// does not match.
#[derive(Debug, Clone)]
pub enum FieldMatcher {
    Exact(String),
    Glob { pattern: String, regex: Arc<Regex> },
    Regex(Arc<Regex>),
    JsonEqual {
        pattern: String,
        value: serde_json::Value,
    },
    JsonPath { pattern: String, path: Arc<JsonPath> },
    XmlEqual { pattern: String, tree: XmlNode },
    XPath(String),
}

impl FieldMatcher {
    /// Compile `pattern` under `strategy`. `field` only labels errors.
    pub fn compile(
        strategy: MatchStrategy,
        pattern: &str,
        field: &'static str,
    ) -> Result<Self, MatcherError> {
        match strategy {
            MatchStrategy::Exact => Ok(FieldMatcher::Exact(pattern.to_string())),
            MatchStrategy::Glob => Ok(FieldMatcher::Glob {
                pattern: pattern.to_string(),
                regex: Arc::new(
                    glob_to_regex(pattern).map_err(|source| MatcherError::Regex { field, source })?,
                ),
            }),
            MatchStrategy::Regex => Ok(FieldMatcher::Regex(Arc::new(
                Regex::new(pattern).map_err(|source| MatcherError::Regex { field, source })?,
            ))),
            MatchStrategy::JsonEqual => Ok(FieldMatcher::JsonEqual {
                pattern: pattern.to_string(),
                value: serde_json::from_str(pattern)
                    .map_err(|source| MatcherError::Json { field, source })?,
            }),
            MatchStrategy::JsonPath => Ok(FieldMatcher::JsonPath {
                pattern: pattern.to_string(),
                path: Arc::new(JsonPath::parse(pattern).map_err(|e| MatcherError::JsonPath {
                    field,
                    reason: e.to_string(),
                })?),
            }),
            MatchStrategy::XmlEqual => Ok(FieldMatcher::XmlEqual {
                pattern: pattern.to_string(),
                tree: XmlNode::parse(pattern)
                    .map_err(|reason| MatcherError::Xml { field, reason })?,
            }),
            MatchStrategy::XPath => {
                validate_xpath(pattern).map_err(|reason| MatcherError::XPath { field, reason })?;
                Ok(FieldMatcher::XPath(pattern.to_string()))
            }
        }
    }

    pub fn strategy(&self) -> MatchStrategy {
        match self {
            FieldMatcher::Exact(_) => MatchStrategy::Exact,
            FieldMatcher::Glob { .. } => MatchStrategy::Glob,
            FieldMatcher::Regex(_) => MatchStrategy::Regex,
            FieldMatcher::JsonEqual { .. } => MatchStrategy::JsonEqual,
            FieldMatcher::JsonPath { .. } => MatchStrategy::JsonPath,
            FieldMatcher::XmlEqual { .. } => MatchStrategy::XmlEqual,
            FieldMatcher::XPath(_) => MatchStrategy::XPath,
        }
    }

    /// The pattern as it was declared.
    pub fn pattern(&self) -> &str {
        match self {
            FieldMatcher::Exact(p) | FieldMatcher::XPath(p) => p,
            FieldMatcher::Regex(regex) => regex.as_str(),
            FieldMatcher::Glob { pattern, .. }
            | FieldMatcher::JsonEqual { pattern, .. }
            | FieldMatcher::JsonPath { pattern, .. }
            | FieldMatcher::XmlEqual { pattern, .. } => pattern,
        }
    }

    /// Check if a field value matches.
    pub fn matches(&self, actual: &str) -> bool {
        match self {
            FieldMatcher::Exact(expected) => actual == expected,
            FieldMatcher::Glob { regex, .. } => regex.is_match(actual),
            FieldMatcher::Regex(regex) => regex.is_match(actual),
            FieldMatcher::JsonEqual { value, .. } => {
                serde_json::from_str::<serde_json::Value>(actual).is_ok_and(|v| &v == value)
            }
            FieldMatcher::JsonPath { path, .. } => {
                serde_json::from_str::<serde_json::Value>(actual)
                    .is_ok_and(|v| !path.query(&v).is_empty())
            }
            FieldMatcher::XmlEqual { tree, .. } => {
                XmlNode::parse(actual).is_ok_and(|actual| &actual == tree)
            }
            FieldMatcher::XPath(expression) => xpath_selects(actual, expression),
        }
    }
}

/// Compile and evaluate in one step.
///
/// Convenience for one-off checks; hot paths should keep the compiled
/// [`FieldMatcher`] instead.
pub fn evaluate(strategy: MatchStrategy, pattern: &str, actual: &str) -> Result<bool, MatcherError> {
    Ok(FieldMatcher::compile(strategy, pattern, "value")?.matches(actual))
}

/// Translate a shell-style wildcard into an anchored regex.
///
/// `*` matches any run of characters, everything else is literal.
fn glob_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("(?s)^{body}$"))
}
