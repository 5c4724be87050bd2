//! Simulations: stored request matchers paired with recorded responses.
//!
//! - `pair` - `MatcherResponsePair`, `ResponseDetails` and the import/export views
//! - `store` - The `SimulationStore` contract and the in-memory implementation
//! - `selector` - First-match-wins selection over a store snapshot

mod pair;
mod selector;
mod store;

pub use pair::{
    MatcherResponsePair, MatcherResponsePairView, ResponseDetails, SimulationData, SimulationView,
};
pub use selector::select;
pub use store::{InMemorySimulationStore, PairSnapshot, SimulationStore};
