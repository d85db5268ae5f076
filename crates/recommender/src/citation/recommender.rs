//! Three-hop citation recommender
//!
//! seed -> references -> everyone citing those references, ranked by how
//! many of the seed's references they cite, minus the seed's own author.

use super::observer::{RecommendationObserver, TracingObserver};
use super::similarity::{normalize_author, sequence_ratio};
use super::traversal::{collect_citers, exclude_already_cited, rank_candidates, RankedCandidate};
use super::{LookupFailurePolicy, Recommendation, RecommendationResult, RecommenderConfig};
use citebuddy_common::errors::{AppError, Result};
use citebuddy_common::{metrics, ArticleId, ArticleRecord, ArticleRepository};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::pin::pin;
use std::sync::Arc;
use std::time::Instant;

/// Recommends references a seed article probably should have cited
pub struct Recommender {
    repository: Arc<dyn ArticleRepository>,
    config: RecommenderConfig,
    observer: Arc<dyn RecommendationObserver>,
}

/// Output of the same-author walk
struct Selection {
    accepted: Vec<Recommendation>,
    suppressed: usize,
}

impl Recommender {
    /// Create a recommender that reports progress through `tracing`
    pub fn new(repository: Arc<dyn ArticleRepository>, config: RecommenderConfig) -> Self {
        Self {
            repository,
            config,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replace the diagnostic observer
    pub fn with_observer(mut self, observer: Arc<dyn RecommendationObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Recommend up to `num` articles the seed probably should have cited.
    ///
    /// Fails with `InvalidArgument` before any lookup when `num < 1` or the
    /// threshold lies outside `(0, 1]`, and with `ArticleNotFound` when the
    /// seed cannot be resolved. A candidate counts as written by the seed's
    /// author when the first-author similarity strictly exceeds
    /// `similarity_threshold`.
    pub async fn recommend(
        &self,
        seed_id: &ArticleId,
        num: i64,
        similarity_threshold: f64,
    ) -> Result<RecommendationResult> {
        let start = Instant::now();
        let result = self.run(seed_id, num, similarity_threshold).await;
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(outcome) => metrics::record_recommendation(
                elapsed,
                outcome.recommended.len(),
                outcome.suppressed,
                outcome.skipped.len(),
                true,
            ),
            Err(_) => metrics::record_recommendation(elapsed, 0, 0, 0, false),
        }
        result
    }

    async fn run(&self, seed_id: &ArticleId, num: i64, similarity_threshold: f64) -> Result<RecommendationResult> {
        let limit = validate_arguments(num, similarity_threshold)?;

        let seed = self.resolve_seed(seed_id).await?;
        self.observer.seed_resolved(&seed);

        let references = seed.distinct_references();
        self.observer.references_collected(seed_id, references.len());

        let mut skipped = Vec::new();
        let reference_records = self.fetch_references(&references, &mut skipped).await?;

        // The seed cites every one of its references, so it shows up among
        // their citers; it is excluded alongside the references themselves.
        let mut excluded: HashSet<ArticleId> = references.into_iter().collect();
        excluded.insert(seed_id.clone());
        excluded.insert(seed.id.clone());

        let occurrences = exclude_already_cited(collect_citers(&reference_records), &excluded);
        let candidates = rank_candidates(&occurrences);
        self.observer.candidates_ranked(seed_id, &candidates);

        let selection = self
            .select(&seed, &candidates, limit, similarity_threshold, &mut skipped)
            .await?;

        Ok(RecommendationResult {
            seed: seed_id.clone(),
            requested: limit,
            recommended: selection.accepted,
            candidate_pool: candidates.len(),
            suppressed: selection.suppressed,
            skipped,
        })
    }

    /// Resolve the seed; any failure is reported as the seed not being found
    async fn resolve_seed(&self, seed_id: &ArticleId) -> Result<ArticleRecord> {
        self.fetch(seed_id).await.map_err(|e| {
            tracing::warn!(bibcode = %seed_id, error = %e, "Could not resolve seed article");
            AppError::ArticleNotFound { id: seed_id.to_string() }
        })
    }

    /// Fetch each reference's record, preserving reference order
    async fn fetch_references(
        &self,
        references: &[ArticleId],
        skipped: &mut Vec<ArticleId>,
    ) -> Result<Vec<ArticleRecord>> {
        let mut lookups = pin!(stream::iter(references)
            .map(|id| async move { (id, self.fetch(id).await) })
            .buffered(self.fan_out()));

        let mut records = Vec::with_capacity(references.len());
        while let Some((id, outcome)) = lookups.next().await {
            if let Some(record) = self.tolerate(id, outcome, skipped)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Walk candidates in rank order, dropping the seed author's own work.
    ///
    /// Lookups run ahead by at most the fan-out bound; decisions are made
    /// strictly in rank order.
    async fn select(
        &self,
        seed: &ArticleRecord,
        candidates: &[RankedCandidate],
        limit: usize,
        similarity_threshold: f64,
        skipped: &mut Vec<ArticleId>,
    ) -> Result<Selection> {
        let mut selection = Selection {
            accepted: Vec::with_capacity(limit.min(candidates.len())),
            suppressed: 0,
        };
        if candidates.is_empty() {
            return Ok(selection);
        }

        let seed_author = seed.primary_author().map(normalize_author);

        let mut lookups = pin!(stream::iter(candidates)
            .map(|candidate| async move { (candidate, self.fetch(&candidate.id).await) })
            .buffered(self.fan_out()));

        while let Some((candidate, outcome)) = lookups.next().await {
            let Some(record) = self.tolerate(&candidate.id, outcome, skipped)? else {
                continue;
            };

            if let (Some(seed_author), Some(author)) = (seed_author.as_deref(), record.primary_author()) {
                let similarity = sequence_ratio(&normalize_author(author), seed_author);
                if similarity > similarity_threshold {
                    selection.suppressed += 1;
                    self.observer.candidate_suppressed(&record, similarity);
                    continue;
                }
            }

            self.observer.recommended(&record, candidate.popularity);
            selection.accepted.push(Recommendation {
                id: candidate.id.clone(),
                title: record.title.clone(),
                first_author: record.primary_author().map(str::to_string),
                popularity: candidate.popularity,
            });

            if selection.accepted.len() == limit {
                break;
            }
        }

        Ok(selection)
    }

    /// One lookup under the configured timeout, keeping the first record
    async fn fetch(&self, id: &ArticleId) -> Result<ArticleRecord> {
        let records = tokio::time::timeout(self.config.lookup_timeout, self.repository.lookup(id))
            .await
            .map_err(|_| AppError::LookupTimeout {
                id: id.to_string(),
                timeout_ms: self.config.lookup_timeout.as_millis() as u64,
            })??;

        records
            .into_iter()
            .next()
            .ok_or_else(|| AppError::ArticleNotFound { id: id.to_string() })
    }

    /// Apply the failure policy to a downstream lookup outcome
    fn tolerate(
        &self,
        id: &ArticleId,
        outcome: Result<ArticleRecord>,
        skipped: &mut Vec<ArticleId>,
    ) -> Result<Option<ArticleRecord>> {
        match outcome {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_lookup_failure() && self.config.on_lookup_failure == LookupFailurePolicy::Skip => {
                self.observer.lookup_skipped(id, &e);
                skipped.push(id.clone());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn fan_out(&self) -> usize {
        self.config.max_concurrent_lookups.max(1)
    }
}

/// Check `num` and the threshold, returning `num` as a count
fn validate_arguments(num: i64, similarity_threshold: f64) -> Result<usize> {
    if num < 1 {
        return Err(AppError::invalid_argument(
            "num",
            format!("number of requested articles must be a positive integer, got {}", num),
        ));
    }
    // Written so NaN is rejected too
    if !(similarity_threshold > 0.0 && similarity_threshold <= 1.0) {
        return Err(AppError::invalid_argument(
            "ratio",
            format!("self-similarity ratio must be within (0, 1], got {}", similarity_threshold),
        ));
    }
    usize::try_from(num).map_err(|_| AppError::invalid_argument("num", "too large"))
}
