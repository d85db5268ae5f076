//! Candidate collection and popularity ranking
//!
//! Pure steps between fetching the references' records and walking the
//! ranked candidates.

use citebuddy_common::{ArticleId, ArticleRecord};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Candidate with its popularity score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub id: ArticleId,

    /// Occurrences across all second-order citer lists
    pub popularity: usize,
}

/// Concatenate the citers of every reference, in reference order.
///
/// An article citing several references appears once per reference.
pub fn collect_citers(reference_records: &[ArticleRecord]) -> Vec<ArticleId> {
    reference_records
        .iter()
        .flat_map(|record| record.distinct_citations())
        .collect()
}

/// Drop every occurrence of an excluded identifier, keeping the rest in order
pub fn exclude_already_cited(citers: Vec<ArticleId>, excluded: &HashSet<ArticleId>) -> Vec<ArticleId> {
    citers.into_iter().filter(|id| !excluded.contains(id)).collect()
}

/// Count occurrences and sort by popularity descending, identifier ascending
pub fn rank_candidates(occurrences: &[ArticleId]) -> Vec<RankedCandidate> {
    let mut counts: HashMap<&ArticleId, usize> = HashMap::new();
    for id in occurrences {
        *counts.entry(id).or_insert(0) += 1;
    }

    let mut ranked: Vec<RankedCandidate> = counts
        .into_iter()
        .map(|(id, popularity)| RankedCandidate { id: id.clone(), popularity })
        .collect();

    ranked.sort_by(|a, b| b.popularity.cmp(&a.popularity).then_with(|| a.id.cmp(&b.id)));
    ranked
}
