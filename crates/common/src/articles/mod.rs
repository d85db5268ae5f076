//! Article repository abstraction
//!
//! Resolves an opaque article identifier to its bibliographic record:
//! - ADS search API client (bibcodes)
//! - In-memory citation graph (tests, offline fixtures)

mod ads;
mod memory;

pub use ads::AdsClient;
pub use memory::InMemoryRepository;

use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Opaque key uniquely identifying a publication (e.g. an ADS bibcode)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(String);

impl ArticleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArticleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ArticleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Resolved view of an article identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub id: ArticleId,

    #[serde(default)]
    pub title: String,

    /// Author names; the first entry is the primary author
    #[serde(default)]
    pub authors: Vec<String>,

    /// Articles this one cites
    #[serde(default)]
    pub references: Vec<ArticleId>,

    /// Articles that cite this one
    #[serde(default)]
    pub citations: Vec<ArticleId>,
}

impl ArticleRecord {
    pub fn new(id: impl Into<ArticleId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            authors: Vec::new(),
            references: Vec::new(),
            citations: Vec::new(),
        }
    }

    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    /// First-listed author, if any
    pub fn primary_author(&self) -> Option<&str> {
        self.authors.first().map(String::as_str)
    }

    /// References with duplicates collapsed, first occurrence wins
    pub fn distinct_references(&self) -> Vec<ArticleId> {
        distinct(&self.references)
    }

    /// Citations with duplicates collapsed, first occurrence wins
    pub fn distinct_citations(&self) -> Vec<ArticleId> {
        distinct(&self.citations)
    }
}

fn distinct(ids: &[ArticleId]) -> Vec<ArticleId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter()
        .filter(|id| seen.insert(*id))
        .cloned()
        .collect()
}

/// Capability to resolve article identifiers
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Resolve one identifier.
    ///
    /// Zero records is a valid answer; callers use the first record when
    /// several come back.
    async fn lookup(&self, id: &ArticleId) -> Result<Vec<ArticleRecord>>;

    /// Name used in logs and metrics
    fn name(&self) -> &str;
}
