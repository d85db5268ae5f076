//! Citation recommendation
//!
//! Suggests articles a seed article probably should have cited:
//! - Follow the seed's references to everyone else citing them
//! - Rank those citers by how often they show up
//! - Drop candidates written by the seed's first author

mod observer;
mod recommender;
mod similarity;
mod traversal;

pub use observer::{NoopObserver, RecommendationObserver, TracingObserver};
pub use recommender::Recommender;
pub use similarity::{normalize_author, sequence_ratio};
pub use traversal::{collect_citers, exclude_already_cited, rank_candidates, RankedCandidate};

use citebuddy_common::config::RecommenderSettings;
use citebuddy_common::errors::{AppError, Result};
use citebuddy_common::ArticleId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// What to do when a downstream lookup (reference or candidate) fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupFailurePolicy {
    /// Fail the whole recommendation with the lookup error
    #[default]
    Abort,
    /// Log the identifier, leave it out, and continue
    Skip,
}

impl FromStr for LookupFailurePolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            other => Err(AppError::Configuration {
                message: format!("unknown lookup failure policy {:?}", other),
            }),
        }
    }
}

impl fmt::Display for LookupFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => f.write_str("abort"),
            Self::Skip => f.write_str("skip"),
        }
    }
}

/// Recommender configuration
#[derive(Debug, Clone)]
pub struct RecommenderConfig {
    /// Timeout applied to each lookup; elapsing counts as a lookup failure
    pub lookup_timeout: Duration,

    /// Maximum lookups in flight at once
    pub max_concurrent_lookups: usize,

    /// Failure handling for reference and candidate lookups
    pub on_lookup_failure: LookupFailurePolicy,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_secs(30),
            max_concurrent_lookups: 8,
            on_lookup_failure: LookupFailurePolicy::Abort,
        }
    }
}

impl TryFrom<&RecommenderSettings> for RecommenderConfig {
    type Error = AppError;

    fn try_from(settings: &RecommenderSettings) -> Result<Self> {
        Ok(Self {
            lookup_timeout: settings.lookup_timeout(),
            max_concurrent_lookups: settings.max_concurrent_lookups,
            on_lookup_failure: settings.on_lookup_failure.parse()?,
        })
    }
}

/// One accepted recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: ArticleId,
    pub title: String,
    pub first_author: Option<String>,
    pub popularity: usize,
}

/// Outcome of a recommendation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    /// Seed identifier as requested
    pub seed: ArticleId,

    /// Number of recommendations asked for
    pub requested: usize,

    /// Accepted recommendations, most popular first
    pub recommended: Vec<Recommendation>,

    /// Distinct candidates left after excluding already-cited work
    pub candidate_pool: usize,

    /// Candidates dropped as written by the seed's first author
    pub suppressed: usize,

    /// Identifiers whose lookup failed and were skipped
    pub skipped: Vec<ArticleId>,
}

impl RecommendationResult {
    /// Recommended identifiers in rank order
    pub fn ids(&self) -> Vec<ArticleId> {
        self.recommended.iter().map(|r| r.id.clone()).collect()
    }

    /// True when fewer than `requested` came back because candidates ran out.
    /// A shortfall with skipped lookups is not exhaustion.
    pub fn is_exhausted(&self) -> bool {
        self.recommended.len() < self.requested && self.skipped.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parsing() {
        assert_eq!("abort".parse::<LookupFailurePolicy>().unwrap(), LookupFailurePolicy::Abort);
        assert_eq!(" Skip ".parse::<LookupFailurePolicy>().unwrap(), LookupFailurePolicy::Skip);
        assert!("retry".parse::<LookupFailurePolicy>().is_err());
        assert_eq!(LookupFailurePolicy::Skip.to_string(), "skip");
    }

    #[test]
    fn test_config_from_settings() {
        let settings = RecommenderSettings {
            on_lookup_failure: "skip".to_string(),
            lookup_timeout_secs: 5,
            ..RecommenderSettings::default()
        };
        let config = RecommenderConfig::try_from(&settings).unwrap();
        assert_eq!(config.on_lookup_failure, LookupFailurePolicy::Skip);
        assert_eq!(config.lookup_timeout, Duration::from_secs(5));
        assert_eq!(config.max_concurrent_lookups, 8);
    }

    #[test]
    fn test_exhausted_result() {
        let result = RecommendationResult {
            seed: "S".into(),
            requested: 3,
            recommended: vec![Recommendation {
                id: "X".into(),
                title: "X".into(),
                first_author: None,
                popularity: 2,
            }],
            candidate_pool: 1,
            suppressed: 0,
            skipped: Vec::new(),
        };
        assert!(result.is_exhausted());
        assert_eq!(result.ids(), vec![ArticleId::new("X")]);
    }

    #[test]
    fn test_short_result_with_skips_is_not_exhausted() {
        let result = RecommendationResult {
            seed: "S".into(),
            requested: 3,
            recommended: Vec::new(),
            candidate_pool: 1,
            suppressed: 0,
            skipped: vec!["X".into()],
        };
        assert!(!result.is_exhausted());
    }
}
