//! Request matching for stored simulations.
//!
//! A simulation declares, per request dimension, zero or more matching
//! strategies. Declarations are compiled once when a simulation is loaded
//! (regexes built, JSON/XML patterns parsed, XPath and JSONPath expressions
//! validated) so that evaluation on the request path cannot fail.
//!
//! # Module Structure
//!
//! - `strategy` - The closed strategy set and the compiled `FieldMatcher`
//! - `structural` - JSON/XML structural comparison and XPath evaluation
//! - `field` - Per-dimension container (`RequestFieldMatchers`) and its view
//! - `request_matcher` - Whole-request predicate and exact-match reduction

mod field;
mod request_matcher;
mod strategy;
mod structural;

pub use field::{RequestFieldMatchers, RequestFieldMatchersView};
pub use request_matcher::{RequestMatcher, RequestMatcherView};
pub use strategy::{evaluate, FieldMatcher, MatchStrategy};
pub use structural::XmlNode;
