//! First-match-wins pair selection.

use super::pair::MatcherResponsePair;
use crate::request::RequestDetails;
use std::sync::Arc;
use tracing::trace;

/// Find the first pair, in store order, whose matcher accepts the request.
///
/// There is no specificity scoring: callers register narrow matchers before
/// broad ones. `None` means the request should fall through to live traffic.
pub fn select<'a>(
    request: &RequestDetails,
    pairs: &'a [Arc<MatcherResponsePair>],
) -> Option<&'a Arc<MatcherResponsePair>> {
    let found = pairs
        .iter()
        .enumerate()
        .find(|(_, pair)| pair.request_matcher.matches(request));

    match found {
        Some((index, pair)) => {
            trace!(index, "Simulation pair matched");
            Some(pair)
        }
        None => None,
    }
}
