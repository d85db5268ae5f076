//! Diagnostic hooks for a recommendation run

use super::traversal::RankedCandidate;
use citebuddy_common::{AppError, ArticleId, ArticleRecord};
use tracing::{debug, info, warn};

/// Receives intermediate results while a recommendation runs.
///
/// Every method has an empty default so implementors pick what they need.
pub trait RecommendationObserver: Send + Sync {
    fn seed_resolved(&self, _seed: &ArticleRecord) {}

    fn references_collected(&self, _seed: &ArticleId, _references: usize) {}

    fn candidates_ranked(&self, _seed: &ArticleId, _candidates: &[RankedCandidate]) {}

    fn candidate_suppressed(&self, _candidate: &ArticleRecord, _similarity: f64) {}

    fn lookup_skipped(&self, _id: &ArticleId, _error: &AppError) {}

    fn recommended(&self, _candidate: &ArticleRecord, _popularity: usize) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RecommendationObserver for NoopObserver {}

/// Observer that emits structured `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RecommendationObserver for TracingObserver {
    fn seed_resolved(&self, seed: &ArticleRecord) {
        debug!(bibcode = %seed.id, title = %seed.title, "Resolved seed article");
    }

    fn references_collected(&self, seed: &ArticleId, references: usize) {
        debug!(bibcode = %seed, references, "Collected direct references");
    }

    fn candidates_ranked(&self, seed: &ArticleId, candidates: &[RankedCandidate]) {
        debug!(
            bibcode = %seed,
            candidates = candidates.len(),
            top_popularity = candidates.first().map(|c| c.popularity).unwrap_or(0),
            "Ranked candidates"
        );
    }

    fn candidate_suppressed(&self, candidate: &ArticleRecord, similarity: f64) {
        debug!(
            bibcode = %candidate.id,
            first_author = candidate.primary_author().unwrap_or_default(),
            similarity,
            "Skipping candidate by the same author"
        );
    }

    fn lookup_skipped(&self, id: &ArticleId, error: &AppError) {
        warn!(bibcode = %id, error = %error, "Lookup failed, skipping identifier");
    }

    fn recommended(&self, candidate: &ArticleRecord, popularity: usize) {
        info!(
            bibcode = %candidate.id,
            title = %candidate.title,
            first_author = candidate.primary_author().unwrap_or_default(),
            popularity,
            "Recommend this paper"
        );
    }
}
