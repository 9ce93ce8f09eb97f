//! gapscan - ranking-drop content-gap analysis from the command line.
//!
//! Every subcommand prints JSON to stdout; logs go to stderr.

mod config;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use gap_analysis::{
    build_analyzer, AnalysisRequest, BrowserConfig, BrowserSearcher, ChromePageLoader,
    ContentFetcher, DiscoveryRequest, DocumentFetcher, PageLoader, PipelineConfig,
    PipelineOrchestrator, QualitySignalChecker, SearchConsoleSource, SearchResultDiscoverer,
    SerpApiSearcher, SiteIdentifier, StaticTokenProvider,
};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "gapscan")]
#[command(about = "Explain a ranking drop by comparing a page against the pages that outrank it")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full three-stage analysis
    Analyze {
        /// Search Console property: https://example.com/ or sc-domain:example.com
        #[arg(long)]
        site: String,
        #[arg(long)]
        page: String,
        /// Analyze these keywords instead of the ones telemetry suggests
        #[arg(long = "keyword")]
        keywords: Vec<String>,
        #[arg(long, default_value = "en")]
        locale: String,
        /// Use the search API instead of browser automation
        #[arg(long)]
        api_preferred: bool,
        /// Reference day for the telemetry window (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },

    /// Detect the drop and pick keywords (stage 1 only)
    Detect {
        #[arg(long)]
        site: String,
        #[arg(long)]
        page: String,
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },

    /// Find the competitors outranking a page for one keyword
    Discover {
        #[arg(long)]
        keyword: String,
        #[arg(long)]
        page: String,
        #[arg(long, default_value = "en")]
        locale: String,
        #[arg(long)]
        api_preferred: bool,
        /// Rank reported by telemetry, if known
        #[arg(long)]
        own_rank: Option<u32>,
        /// CAPTCHA retries before falling back to the search API
        #[arg(long)]
        retry_count: Option<u32>,
    },

    /// Fetch and parse one page, with its quality checklist
    Fetch {
        #[arg(long)]
        url: String,
    },
}

/// Shared pieces built once per invocation.
struct Components {
    pipeline: PipelineConfig,
    loader: Arc<dyn PageLoader>,
}

impl Components {
    fn new(config: &Config) -> Self {
        let mut browser = BrowserConfig::from_env();
        if let Some(path) = &config.chrome_path {
            browser = browser.with_chrome_path(path.clone());
        }
        Self {
            pipeline: config.pipeline_config(),
            loader: Arc::new(ChromePageLoader::new(browser)),
        }
    }

    fn discoverer(&self, config: &Config) -> Result<SearchResultDiscoverer> {
        let browser = BrowserSearcher::new(self.loader.clone(), &self.pipeline.discovery);
        let mut discoverer =
            SearchResultDiscoverer::new(self.pipeline.discovery.clone()).with_browser(Arc::new(browser));

        if let Some(key) = &config.serpapi_api_key {
            let api = SerpApiSearcher::new(key.clone()).context("Failed to create search API client")?;
            discoverer = discoverer.with_api(Arc::new(api));
        } else {
            tracing::info!("SERPAPI_API_KEY not set; CAPTCHA blocks will not fall back to the search API");
        }
        Ok(discoverer)
    }

    fn fetcher(&self) -> Result<ContentFetcher> {
        ContentFetcher::from_config(&self.pipeline.fetch, Some(self.loader.clone()))
            .context("Failed to create HTTP client")
    }

    fn orchestrator(&self, config: &Config) -> Result<PipelineOrchestrator> {
        let tokens = Arc::new(StaticTokenProvider::new(config.gsc_access_token.clone()));
        let telemetry = Arc::new(SearchConsoleSource::new(tokens));
        let analyzer = build_analyzer(&self.pipeline.semantic, &config.llm_keys);

        Ok(PipelineOrchestrator::new(
            self.pipeline.clone(),
            telemetry,
            self.discoverer(config)?,
            Arc::new(self.fetcher()?),
            analyzer,
        ))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn analysis_request(
    site: &str,
    page: String,
    locale: String,
    keywords: Vec<String>,
    api_preferred: bool,
    as_of: Option<NaiveDate>,
) -> AnalysisRequest {
    let mut request = AnalysisRequest::new(SiteIdentifier::parse(site), page).with_locale(locale);
    if !keywords.is_empty() {
        request = request.with_keywords(keywords);
    }
    if api_preferred {
        request = request.with_api_preferred(true);
    }
    if let Some(day) = as_of {
        request = request.with_as_of(day);
    }
    request
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (stderr, so stdout stays machine-readable)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gap_analysis=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            site,
            page,
            keywords,
            locale,
            api_preferred,
            as_of,
        } => {
            let config = Config::from_env()?;
            let components = Components::new(&config);
            let orchestrator = components.orchestrator(&config)?;
            let request = analysis_request(&site, page, locale, keywords, api_preferred, as_of);

            tracing::info!(site = %request.site, page = %request.page_url, "Starting analysis");
            let report = orchestrator.run(&request).await.map_err(|e| {
                tracing::error!(error = %e, "Analysis failed");
                anyhow!(e.user_reason())
            })?;
            print_json(&report)?;
        }

        Commands::Detect { site, page, as_of } => {
            let config = Config::from_env()?;
            let components = Components::new(&config);
            let orchestrator = components.orchestrator(&config)?;
            let request = analysis_request(&site, page, "en".into(), Vec::new(), false, as_of);

            let output = orchestrator.run_keyword_stage(&request).await.map_err(|e| {
                tracing::error!(error = %e, "Keyword stage failed");
                anyhow!(e.user_reason())
            })?;
            print_json(&output)?;
        }

        Commands::Discover {
            keyword,
            page,
            locale,
            api_preferred,
            own_rank,
            retry_count,
        } => {
            let config = Config::from_env()?;
            let components = Components::new(&config);
            let discoverer = components.discoverer(&config)?;

            let mut request = DiscoveryRequest::new(keyword, page, locale)
                .with_config(&components.pipeline.discovery)
                .with_known_own_rank(own_rank);
            request.api_preferred |= api_preferred;
            if let Some(retries) = retry_count {
                request = request.with_retry_count(retries);
            }

            let competitors = discoverer
                .discover(&request)
                .await
                .context("Competitor discovery failed")?;
            print_json(&competitors)?;
        }

        Commands::Fetch { url } => {
            // Fetching needs no credentials.
            let _ = dotenvy::dotenv();
            let fetch_config = PipelineConfig::default().fetch;
            let loader: Arc<dyn PageLoader> = Arc::new(ChromePageLoader::new(BrowserConfig::from_env()));
            let fetcher = ContentFetcher::from_config(&fetch_config, Some(loader))
                .context("Failed to create HTTP client")?;

            let document = fetcher
                .fetch(&url)
                .await
                .with_context(|| format!("Failed to fetch {}", url))?;
            let quality = QualitySignalChecker::new().check(&document);

            print_json(&serde_json::json!({
                "document": document,
                "quality": quality,
            }))?;
        }
    }

    Ok(())
}
