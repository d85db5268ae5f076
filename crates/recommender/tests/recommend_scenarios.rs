use citebuddy::{LookupFailurePolicy, Recommender, RecommenderConfig};
use citebuddy::citation::NoopObserver;
use citebuddy_common::articles::InMemoryRepository;
use citebuddy_common::{AppError, ArticleId, ArticleRecord};
use std::path::PathBuf;
use std::sync::Arc;

const SEED: &str = "2014MNRAS.443..828C";

fn fixture() -> InMemoryRepository {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/citation_graph.json");
    InMemoryRepository::from_json_file(path).expect("fixture graph should load")
}

fn recommender(repo: InMemoryRepository) -> Recommender {
    Recommender::new(Arc::new(repo), RecommenderConfig::default()).with_observer(Arc::new(NoopObserver))
}

fn ids(raw: &[&str]) -> Vec<ArticleId> {
    raw.iter().map(|id| ArticleId::new(*id)).collect()
}

#[tokio::test]
async fn recommends_popular_citers_excluding_same_author() {
    let result = recommender(fixture()).recommend(&SEED.into(), 3, 0.5).await.unwrap();

    // 2015MNRAS.448.2717C ties for most popular but shares the seed's first author
    assert_eq!(
        result.ids(),
        ids(&["2015ApJ...808..132N", "2016ApJ...818...19H", "2016A&A...585A..75J"])
    );
    assert_eq!(result.suppressed, 1);
    assert_eq!(result.candidate_pool, 4);
    assert_eq!(result.recommended[0].popularity, 3);
    assert_eq!(result.recommended[0].first_author.as_deref(), Some("Ness, M."));
}

#[tokio::test]
async fn high_threshold_lets_near_matches_through() {
    // "casey, ar" vs "casey, a r" scores 18/19, just under 0.95
    let result = recommender(fixture()).recommend(&SEED.into(), 3, 0.95).await.unwrap();

    assert_eq!(
        result.ids(),
        ids(&["2015ApJ...808..132N", "2015MNRAS.448.2717C", "2016ApJ...818...19H"])
    );
    assert_eq!(result.suppressed, 0);
}

#[tokio::test]
async fn reference_cited_by_another_reference_is_not_recommended() {
    // 2013ApJ...769...57F cites 2010ApJ...710.1001A but the seed already cites it
    let result = recommender(fixture()).recommend(&SEED.into(), 10, 1.0).await.unwrap();

    let returned = result.ids();
    for excluded in ids(&[SEED, "2010ApJ...710.1001A", "2012A&A...538A.106G", "2013ApJ...769...57F"]) {
        assert!(!returned.contains(&excluded), "{excluded} must not be recommended");
    }
    assert_eq!(returned.len(), 4);
    assert!(result.is_exhausted());
}

#[tokio::test]
async fn repeated_calls_are_identical() {
    let rec = recommender(fixture());
    let first = rec.recommend(&SEED.into(), 2, 0.5).await.unwrap();
    let second = rec.recommend(&SEED.into(), 2, 0.5).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn end_to_end_three_hop_scenario() {
    let mut graph = InMemoryRepository::new();
    for (id, author) in [
        ("S", "Casey, A. R."),
        ("A", "Anders, F."),
        ("B", "Brown, T."),
        ("X", "Xu, Q."),
        ("Y", "Yamada, T."),
        ("Z", "Zhang, W."),
    ] {
        graph.add_article(ArticleRecord::new(id, format!("Paper {id}")).with_authors([author]));
    }
    for (citing, cited) in [("S", "A"), ("S", "B"), ("X", "A"), ("Y", "A"), ("X", "B"), ("Z", "B")] {
        graph.add_citation(citing, cited);
    }

    let result = recommender(graph).recommend(&"S".into(), 2, 0.5).await.unwrap();
    assert_eq!(result.ids(), ids(&["X", "Y"]));
}

#[tokio::test]
async fn unknown_seed_names_identifier() {
    let err = recommender(fixture()).recommend(&"1999ApJ...000....0X".into(), 3, 0.5).await.unwrap_err();

    assert!(matches!(err, AppError::ArticleNotFound { .. }));
    assert!(err.to_string().contains("1999ApJ...000....0X"));
}

#[tokio::test]
async fn skip_policy_tolerates_dangling_citers() {
    let mut graph = fixture();
    // Citer with no record of its own, and the most popular candidate
    for reference in ["2010ApJ...710.1001A", "2012A&A...538A.106G", "2013ApJ...769...57F"] {
        graph.add_citation("2017ApJ...000....1D", reference);
    }

    let abort = recommender(graph.clone());
    let err = abort.recommend(&SEED.into(), 3, 0.5).await.unwrap_err();
    assert!(err.is_lookup_failure());

    let skip = Recommender::new(
        Arc::new(graph),
        RecommenderConfig {
            on_lookup_failure: LookupFailurePolicy::Skip,
            ..RecommenderConfig::default()
        },
    )
    .with_observer(Arc::new(NoopObserver));

    let result = skip.recommend(&SEED.into(), 3, 0.5).await.unwrap();
    assert_eq!(result.skipped, ids(&["2017ApJ...000....1D"]));
    assert_eq!(result.recommended.len(), 3);
}
