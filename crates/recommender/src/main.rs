//! CiteBuddy CLI
//!
//! Prints the bibcodes of articles that the given article probably should
//! have cited, one per line:
//! 1. Resolves the article through ADS (or an offline JSON graph)
//! 2. Finds who else cites what it cites
//! 3. Ranks those by popularity, skipping the article's own first author

use citebuddy::{LookupFailurePolicy, Recommender, RecommenderConfig};
use citebuddy_common::{
    articles::{AdsClient, InMemoryRepository},
    config::{AppConfig, ObservabilityConfig},
    errors::Result,
    metrics, ArticleId, ArticleRepository, VERSION,
};
use clap::Parser;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Recommend articles a given article probably should have cited
#[derive(Debug, Parser)]
#[command(name = "citebuddy")]
#[command(version)]
#[command(allow_negative_numbers = true)]
struct Cli {
    /// Article to recommend citations for
    bibcode: ArticleId,

    /// Number of recommendations (default: recommender.num)
    num: Option<i64>,

    /// Same-author similarity threshold in (0, 1] (default: recommender.ratio)
    ratio: Option<f64>,

    /// Use an offline JSON citation graph instead of ADS
    #[arg(long, value_name = "FILE")]
    graph: Option<PathBuf>,

    /// Skip identifiers whose lookup fails instead of aborting
    #[arg(long)]
    skip_failed: bool,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    // Parse arguments; clap handles --help and usage errors
    let cli = Cli::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(&ObservabilityConfig::default());
            error!(error = %e, "Failed to load configuration");
            std::process::exit(78);
        }
    };

    // Initialize tracing
    init_tracing(&config.observability);

    let code = match run(cli, config).await {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, code = e.code().as_code(), "Recommendation failed");
            eprintln!("citebuddy: {}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

async fn run(args: Cli, config: AppConfig) -> Result<()> {
    config.validate()?;

    if config.observability.metrics_port != 0 {
        install_metrics_exporter(config.observability.metrics_port)?;
    }

    let repository: Arc<dyn ArticleRepository> = match &args.graph {
        Some(path) => {
            let graph = InMemoryRepository::from_json_file(path)?;
            info!(path = %path.display(), articles = graph.article_count(), "Loaded offline citation graph");
            Arc::new(graph)
        }
        None => Arc::new(AdsClient::new(&config.ads)?),
    };

    let mut recommender_config = RecommenderConfig::try_from(&config.recommender)?;
    if args.skip_failed {
        recommender_config.on_lookup_failure = LookupFailurePolicy::Skip;
    }

    let num = args.num.unwrap_or(config.recommender.num);
    let ratio = args.ratio.unwrap_or(config.recommender.ratio);

    info!(
        version = VERSION,
        bibcode = %args.bibcode,
        source = repository.name(),
        num,
        ratio,
        on_lookup_failure = %recommender_config.on_lookup_failure,
        "Starting CiteBuddy"
    );

    let recommender = Recommender::new(repository, recommender_config);
    let result = recommender.recommend(&args.bibcode, num, ratio).await?;

    if !result.skipped.is_empty() {
        warn!(skipped = result.skipped.len(), "Some lookups failed and were skipped");
    }
    if result.is_exhausted() {
        info!(
            requested = result.requested,
            returned = result.recommended.len(),
            candidate_pool = result.candidate_pool,
            "Candidate pool exhausted"
        );
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for recommendation in &result.recommended {
            println!("{}", recommendation.id);
        }
    }
    Ok(())
}

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&observability.log_level));

    // Logs go to stderr; stdout carries the recommendations
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn install_metrics_exporter(port: u16) -> Result<()> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    prometheus_builder(addr)?
        .install()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus exporter: {}", e))?;

    metrics::register_metrics();
    info!(%addr, "Prometheus exporter listening");
    Ok(())
}

/// Exporter with lookup latency reported against fixed buckets
fn prometheus_builder(addr: SocketAddr) -> Result<PrometheusBuilder> {
    let builder = PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Full(format!("{}_lookup_duration_seconds", metrics::METRICS_PREFIX)),
            metrics::LOOKUP_BUCKETS,
        )
        .map_err(|e| anyhow::anyhow!("invalid lookup histogram buckets: {}", e))?;
    Ok(builder)
}
