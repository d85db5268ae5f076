//! In-memory citation graph
//!
//! Serves article records from adjacency lists held in memory

use super::{ArticleId, ArticleRecord, ArticleRepository};
use crate::errors::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Citation graph that answers lookups without any network access
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    /// Article metadata keyed by identifier
    articles: HashMap<ArticleId, ArticleRecord>,

    /// Adjacency list: article -> articles it cites
    outgoing: HashMap<ArticleId, Vec<ArticleId>>,

    /// Reverse adjacency: article -> articles citing it
    incoming: HashMap<ArticleId, Vec<ArticleId>>,
}

/// On-disk fixture format
#[derive(Debug, Deserialize)]
struct GraphFile {
    articles: Vec<FixtureArticle>,

    /// `[citing, cited]` pairs
    #[serde(default)]
    citations: Vec<(ArticleId, ArticleId)>,
}

#[derive(Debug, Deserialize)]
struct FixtureArticle {
    id: ArticleId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    authors: Vec<String>,
}

impl InMemoryRepository {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a graph from a JSON fixture file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Load a graph from a JSON document
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let file: GraphFile = serde_json::from_str(raw)?;

        let mut repo = Self::new();
        for article in file.articles {
            repo.add_article(
                ArticleRecord::new(article.id, article.title).with_authors(article.authors),
            );
        }
        for (citing, cited) in file.citations {
            repo.add_citation(citing, cited);
        }
        Ok(repo)
    }

    /// Register article metadata. Edges on the record are ignored; use
    /// [`add_citation`](Self::add_citation) so both directions stay in sync.
    pub fn add_article(&mut self, record: ArticleRecord) {
        let mut record = record;
        record.references.clear();
        record.citations.clear();
        self.articles.insert(record.id.clone(), record);
    }

    /// Add an edge: `citing` references `cited`
    pub fn add_citation(&mut self, citing: impl Into<ArticleId>, cited: impl Into<ArticleId>) {
        let citing = citing.into();
        let cited = cited.into();

        self.outgoing.entry(citing.clone()).or_default().push(cited.clone());
        self.incoming.entry(cited).or_default().push(citing);
    }

    /// Articles cited by this article
    pub fn references(&self, id: &ArticleId) -> &[ArticleId] {
        self.outgoing.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Articles citing this article
    pub fn citations(&self, id: &ArticleId) -> &[ArticleId] {
        self.incoming.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Number of registered articles
    pub fn article_count(&self) -> usize {
        self.articles.len()
    }

    /// Assemble the record for an identifier, if the article is registered
    pub fn record(&self, id: &ArticleId) -> Option<ArticleRecord> {
        self.articles.get(id).map(|article| {
            let mut record = article.clone();
            record.references = self.references(id).to_vec();
            record.citations = self.citations(id).to_vec();
            record
        })
    }
}

#[async_trait]
impl ArticleRepository for InMemoryRepository {
    async fn lookup(&self, id: &ArticleId) -> Result<Vec<ArticleRecord>> {
        Ok(self.record(id).into_iter().collect())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;

    fn article(id: &str, author: &str) -> ArticleRecord {
        ArticleRecord::new(id, format!("Title of {id}")).with_authors([author])
    }

    #[test]
    fn test_graph_construction() {
        let mut graph = InMemoryRepository::new();
        graph.add_article(article("A", "Smith, J."));
        graph.add_article(article("B", "Jones, K."));
        graph.add_article(article("C", "Brown, L."));

        // A cites B, B cites C
        graph.add_citation("A", "B");
        graph.add_citation("B", "C");

        let b = ArticleId::new("B");
        assert_eq!(graph.article_count(), 3);
        assert_eq!(graph.references(&"A".into()), &[b.clone()]);
        assert_eq!(graph.citations(&b), &[ArticleId::new("A")]);
        assert_eq!(graph.references(&b), &[ArticleId::new("C")]);
    }

    #[tokio::test]
    async fn test_lookup_assembles_both_directions() {
        let mut graph = InMemoryRepository::new();
        graph.add_article(article("A", "Smith, J."));
        graph.add_article(article("B", "Jones, K."));
        graph.add_citation("A", "B");
        graph.add_citation("C", "B");

        let records = graph.lookup(&"B".into()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].citations, vec![ArticleId::new("A"), ArticleId::new("C")]);
        assert!(records[0].references.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_article_yields_no_records() {
        let mut graph = InMemoryRepository::new();
        // Edges alone do not register metadata
        graph.add_citation("A", "B");

        let records = graph.lookup(&"A".into()).await.unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_from_json_str() {
        let raw = r#"{
            "articles": [
                {"id": "S", "title": "Seed", "authors": ["Casey, A. R."]},
                {"id": "A", "title": "First"}
            ],
            "citations": [["S", "A"]]
        }"#;

        let graph = InMemoryRepository::from_json_str(raw).unwrap();
        let seed = graph.record(&"S".into()).unwrap();
        assert_eq!(seed.primary_author(), Some("Casey, A. R."));
        assert_eq!(seed.references, vec![ArticleId::new("A")]);
        assert!(graph.record(&"A".into()).unwrap().authors.is_empty());
    }

    #[test]
    fn test_from_json_str_rejects_garbage() {
        let err = InMemoryRepository::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
