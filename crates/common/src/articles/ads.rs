//! NASA ADS search API client
//!
//! Resolves bibcodes through `GET /search/query` with:
//! - Bearer token authentication
//! - Client-side rate limiting
//! - Exponential backoff on transient failures

use super::{ArticleId, ArticleRecord, ArticleRepository};
use crate::config::AdsConfig;
use crate::errors::{AppError, Result};
use crate::metrics;
use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};
use governor::{
    clock::QuantaClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::StatusCode;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Fields requested for every lookup
const FIELDS: &str = "bibcode,title,author,reference,citation";

type AdsRateLimiter = RateLimiter<NotKeyed, InMemoryState, QuantaClock>;

/// ADS API client
pub struct AdsClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
    rows: u32,
    max_retries: u32,
    limiter: Arc<AdsRateLimiter>,
}

#[derive(Deserialize)]
struct AdsResponse {
    response: AdsResponseBody,
}

#[derive(Deserialize)]
struct AdsResponseBody {
    #[serde(default)]
    docs: Vec<AdsDoc>,
}

#[derive(Deserialize)]
struct AdsDoc {
    bibcode: String,
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    author: Vec<String>,
    #[serde(default)]
    reference: Vec<String>,
    #[serde(default)]
    citation: Vec<String>,
}

impl From<AdsDoc> for ArticleRecord {
    fn from(doc: AdsDoc) -> Self {
        ArticleRecord {
            id: ArticleId::new(doc.bibcode),
            title: doc.title.join(" "),
            authors: doc.author,
            references: doc.reference.into_iter().map(ArticleId::new).collect(),
            citations: doc.citation.into_iter().map(ArticleId::new).collect(),
        }
    }
}

impl AdsClient {
    /// Create a new ADS client
    pub fn new(config: &AdsConfig) -> Result<Self> {
        let token = config
            .api_token
            .clone()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| AppError::Configuration {
                message: "ADS API token required (ads.api_token or ADS_API_TOKEN)".to_string(),
            })?;

        let per_minute = NonZeroU32::new(config.requests_per_minute).ok_or_else(|| {
            AppError::Configuration {
                message: "ads.requests_per_minute must be at least 1".to_string(),
            }
        })?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("citebuddy/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            token,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            rows: config.rows.max(1),
            max_retries: config.max_retries,
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
        })
    }

    /// Lookup with retry on transient failures
    async fn request_with_retry(&self, id: &ArticleId) -> Result<Vec<ArticleRecord>> {
        let policy = ExponentialBackoff {
            initial_interval: Duration::from_millis(200),
            max_interval: Duration::from_secs(5),
            max_elapsed_time: Some(Duration::from_secs(60)),
            ..Default::default()
        };

        let mut attempt = 0u32;
        retry(policy, || {
            attempt += 1;
            let current = attempt;
            async move {
                match self.make_request(id).await {
                    Ok(records) => Ok(records),
                    Err(e) if is_transient(&e) && current <= self.max_retries => {
                        tracing::warn!(
                            bibcode = %id,
                            attempt = current,
                            max_retries = self.max_retries,
                            error = %e,
                            "ADS request failed, retrying"
                        );
                        Err(backoff::Error::transient(e))
                    }
                    Err(e) => Err(backoff::Error::permanent(e)),
                }
            }
        })
        .await
    }

    async fn make_request(&self, id: &ArticleId) -> Result<Vec<ArticleRecord>> {
        self.limiter.until_ready().await;

        let url = format!("{}/search/query", self.base_url);
        let query = [
            ("q", format!("bibcode:\"{}\"", id)),
            ("fl", FIELDS.to_string()),
            ("rows", self.rows.to_string()),
        ];

        let response = self.client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::RateLimited { source_name: "ads".to_string() });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::LookupFailed {
                id: id.to_string(),
                message: format!("ADS API error {}: {}", status, body),
            });
        }

        let body = response.text().await?;
        parse_response(&body)
    }
}

/// Decode an ADS search response body into records
fn parse_response(body: &str) -> Result<Vec<ArticleRecord>> {
    let parsed: AdsResponse = serde_json::from_str(body).map_err(|e| {
        AppError::MalformedResponse {
            source_name: "ads".to_string(),
            message: e.to_string(),
        }
    })?;

    Ok(parsed.response.docs.into_iter().map(ArticleRecord::from).collect())
}

fn is_transient(err: &AppError) -> bool {
    match err {
        AppError::RateLimited { .. } => true,
        AppError::HttpClient(e) => e.is_timeout() || e.is_connect() || e.is_request(),
        AppError::LookupFailed { message, .. } => message.starts_with("ADS API error 5"),
        _ => false,
    }
}

#[async_trait]
impl ArticleRepository for AdsClient {
    async fn lookup(&self, id: &ArticleId) -> Result<Vec<ArticleRecord>> {
        let start = Instant::now();
        let result = self.request_with_retry(id).await;
        metrics::record_lookup(self.name(), start.elapsed().as_secs_f64(), result.is_ok());

        if let Ok(records) = &result {
            tracing::debug!(bibcode = %id, records = records.len(), "ADS lookup complete");
        }
        result
    }

    fn name(&self) -> &str {
        "ads"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_token() -> AdsConfig {
        AdsConfig {
            api_token: Some("test-token".to_string()),
            ..AdsConfig::default()
        }
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{
            "responseHeader": {"status": 0},
            "response": {
                "numFound": 1,
                "docs": [{
                    "bibcode": "2014MNRAS.443..828C",
                    "title": ["The Gaia-ESO Survey: calibrating a large stellar survey"],
                    "author": ["Casey, A. R.", "Keller, S. C."],
                    "reference": ["2010ApJ...710.1001A", "2012A&A...538A.106G"],
                    "citation": ["2016ApJ...818...19N"]
                }]
            }
        }"#;

        let records = parse_response(body).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.id.as_str(), "2014MNRAS.443..828C");
        assert_eq!(record.primary_author(), Some("Casey, A. R."));
        assert_eq!(record.references.len(), 2);
        assert_eq!(record.citations, vec![ArticleId::new("2016ApJ...818...19N")]);
    }

    #[test]
    fn test_parse_response_without_optional_fields() {
        let body = r#"{"response": {"docs": [{"bibcode": "X"}]}}"#;
        let records = parse_response(body).unwrap();
        assert!(records[0].authors.is_empty());
        assert!(records[0].references.is_empty());
        assert!(records[0].title.is_empty());
    }

    #[test]
    fn test_parse_response_no_docs() {
        let body = r#"{"response": {"numFound": 0, "docs": []}}"#;
        assert!(parse_response(body).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_response() {
        let err = parse_response(r#"{"error": "bad query"}"#).unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse { .. }));
        assert!(err.is_lookup_failure());
    }

    #[test]
    fn test_token_required() {
        let err = AdsClient::new(&AdsConfig::default()).err().unwrap();
        assert!(matches!(err, AppError::Configuration { .. }));
    }

    #[test]
    fn test_client_creation() {
        let mut config = config_with_token();
        config.base_url = "https://example.org/v1/".to_string();

        let client = AdsClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://example.org/v1");
        assert_eq!(client.name(), "ads");
        tokio_test::block_on(client.limiter.until_ready());
    }

    #[test]
    fn test_transient_classification() {
        let server = AppError::LookupFailed {
            id: "X".into(),
            message: "ADS API error 503 Service Unavailable: ".into(),
        };
        let auth = AppError::LookupFailed {
            id: "X".into(),
            message: "ADS API error 401 Unauthorized: ".into(),
        };
        assert!(is_transient(&server));
        assert!(!is_transient(&auth));
        assert!(is_transient(&AppError::RateLimited { source_name: "ads".into() }));
    }
}
