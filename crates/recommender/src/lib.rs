//! CiteBuddy Recommender
//!
//! Recommends references an article probably should have cited, using only
//! the citation graph reachable from it:
//! - Citation graph traversal (references, their citers)
//! - Popularity ranking of candidates
//! - Same-author suppression via fuzzy name matching

pub mod citation;

pub use citation::{
    LookupFailurePolicy, Recommendation, RecommendationObserver, RecommendationResult,
    Recommender, RecommenderConfig,
};
