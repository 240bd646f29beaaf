use anyhow::{bail, Context};
use api_client::{BinanceClient, CoinGeckoClient};
use clap::{Parser, Subcommand};
use comparator::{ComparisonEntity, ComparisonSet};
use configuration::Config;
use engine::{compare_set, AnalysisStep, ProgressObserver, StepUpdate, TokenAnalyzer, TokenReport};
use indicatif::ProgressStyle;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{Instrument, Span};
use tracing_indicatif::{span_ext::IndicatifSpanExt, IndicatifLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod export;
mod render;

type LiveAnalyzer = TokenAnalyzer<CoinGeckoClient, BinanceClient>;

/// Shortest accepted refresh period in watch mode; the aggregator's free tier
/// allows roughly ten calls per minute.
const MIN_WATCH_SECS: u64 = 10;

/// The main entry point for the Microanalyst CLI.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The .env file is optional; it usually carries the aggregator API key.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = configuration::load_config(cli.config.as_deref())
        .context("Failed to load configuration")?;
    init_tracing(&config.logging.level);

    match cli.command {
        Commands::Analyze(args) => handle_analyze(args, &config).await,
        Commands::Compare(args) => handle_compare(args, &config).await,
        Commands::Serve(args) => handle_serve(args, &config).await,
    }
}

/// Installs the `fmt` subscriber, routing log lines through the progress-bar layer so
/// they do not tear active bars.
fn init_tracing(default_level: &str) {
    let indicatif_layer = IndicatifLayer::new();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(indicatif_layer)
        .init();
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Market-health analytics and cross-token comparison for crypto assets.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single token.
    Analyze(AnalyzeArgs),
    /// Analyze several tokens and rank them against each other.
    Compare(CompareArgs),
    /// Serve the analysis over HTTP.
    Serve(ServeArgs),
}

#[derive(Parser)]
struct AnalyzeArgs {
    /// Token symbol or name (e.g. "btc", "solana").
    token: String,

    /// Look-back window in days.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    days: Option<u32>,

    /// Reference asset for the beta proxy; "none" disables it.
    #[arg(long)]
    reference: Option<String>,

    /// Print the report as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Also write the report as JSON to this path.
    #[arg(long)]
    export: Option<PathBuf>,

    /// Re-run the analysis every SECS seconds until interrupted.
    #[arg(long, value_name = "SECS")]
    watch: Option<u64>,
}

#[derive(Parser)]
struct CompareArgs {
    /// Token symbols or names.
    #[arg(required_unless_present = "input")]
    tokens: Vec<String>,

    /// Look-back window in days.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    days: Option<u32>,

    /// Comma-separated metrics to compare.
    #[arg(long, value_delimiter = ',')]
    metrics: Option<Vec<String>>,

    /// Reference asset for the beta proxy; "none" disables it.
    #[arg(long)]
    reference: Option<String>,

    /// Print the comparison as JSON instead of tables.
    #[arg(long)]
    json: bool,

    /// Also write the comparison as JSON to this path.
    #[arg(long)]
    export: Option<PathBuf>,

    /// Compare a previously exported JSON file instead of fetching live data.
    #[arg(long, conflicts_with = "tokens")]
    input: Option<PathBuf>,
}

#[derive(Parser)]
struct ServeArgs {
    /// Listen address, e.g. 127.0.0.1:3000.
    #[arg(long)]
    addr: Option<SocketAddr>,
}

// ==============================================================================
// Progress Reporting
// ==============================================================================

/// Drives a progress bar attached to a tracing span.
struct SpanProgress {
    span: Span,
}

impl SpanProgress {
    fn new(span: Span, tokens: usize) -> anyhow::Result<Self> {
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("#>-");
        span.pb_set_style(&style);
        span.pb_set_length((AnalysisStep::ALL.len() * tokens) as u64);
        Ok(Self { span })
    }
}

impl ProgressObserver for SpanProgress {
    fn on_step(&self, _step: AnalysisStep, update: StepUpdate<'_>) {
        match update {
            StepUpdate::Started(message) => self.span.pb_set_message(message),
            StepUpdate::Finished => self.span.pb_inc(1),
        }
    }
}

// ==============================================================================
// Command Logic
// ==============================================================================

/// Resolves the reference asset's volatility, or `None` when disabled or unavailable.
async fn reference_cv(
    analyzer: &LiveAnalyzer,
    requested: Option<&str>,
    config: &Config,
    days: u32,
) -> Option<f64> {
    let reference = requested.unwrap_or(config.defaults.reference_symbol.as_str());
    if reference.is_empty() || reference.eq_ignore_ascii_case("none") {
        return None;
    }
    match analyzer.reference_volatility(reference, days).await {
        Ok(cv) => Some(cv),
        Err(e) => {
            tracing::warn!(reference, error = %e, "Reference unavailable; beta proxy disabled");
            None
        }
    }
}

async fn handle_analyze(args: AnalyzeArgs, config: &Config) -> anyhow::Result<()> {
    let analyzer = LiveAnalyzer::from_config(config)?;
    let days = args.days.unwrap_or(config.defaults.days);

    let Some(secs) = args.watch else {
        return run_analysis(&analyzer, &args, config, days).await;
    };

    let period = Duration::from_secs(secs.max(MIN_WATCH_SECS));
    tracing::info!(token = %args.token, period_secs = period.as_secs(), "Watching; press Ctrl-C to stop");

    let mut ticker = tokio::time::interval(period);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Watch stopped");
                return Ok(());
            }
            _ = ticker.tick() => {
                if let Err(e) = run_analysis(&analyzer, &args, config, days).await {
                    tracing::error!(token = %args.token, error = %e, "Analysis cycle failed");
                }
            }
        }
    }
}

async fn run_analysis(
    analyzer: &LiveAnalyzer,
    args: &AnalyzeArgs,
    config: &Config,
    days: u32,
) -> anyhow::Result<()> {
    let reference = reference_cv(analyzer, args.reference.as_deref(), config, days).await;

    let span = tracing::info_span!("analyze", token = %args.token);
    let progress = SpanProgress::new(span.clone(), 1)?;
    let report = analyzer
        .analyze(&args.token, days, reference, &progress)
        .instrument(span)
        .await
        .with_context(|| format!("Failed to analyze '{}'", args.token))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", render::report_table(&report, config.display.precision));
    }

    if let Some(path) = &args.export {
        export::write_json_atomic(path, &report)?;
    }
    Ok(())
}

async fn handle_compare(args: CompareArgs, config: &Config) -> anyhow::Result<()> {
    let metrics = args
        .metrics
        .clone()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| config.comparison.metrics.clone());

    let (reports, set) = match &args.input {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let set = ComparisonSet::from_json_str(&raw)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            tracing::info!(entities = set.len(), path = %path.display(), "Loaded comparison set");
            (Vec::new(), set)
        }
        None => {
            let reports = fetch_reports(&args, config).await?;
            let set: ComparisonSet = reports.iter().map(ComparisonEntity::from).collect();
            (reports, set)
        }
    };
    let outcome = compare_set(&set, &metrics);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        let precision = config.display.precision;
        println!("{}", render::comparison_table(&outcome, &set, precision));
        println!("{}", render::summary_table(&outcome, precision));
        if let Some(table) = render::correlation_table(&outcome) {
            println!("{table}");
        }
    }

    if let Some(path) = &args.export {
        let document = export::ComparisonExport {
            generated_at: chrono::Utc::now(),
            reports: &reports,
            outcome: &outcome,
        };
        export::write_json_atomic(path, &document)?;
    }
    Ok(())
}

/// Analyzes every requested token; failures are logged and left out.
async fn fetch_reports(args: &CompareArgs, config: &Config) -> anyhow::Result<Vec<TokenReport>> {
    let analyzer = LiveAnalyzer::from_config(config)?;
    let days = args.days.unwrap_or(config.defaults.days);
    let reference = reference_cv(&analyzer, args.reference.as_deref(), config, days).await;

    let span = tracing::info_span!("compare", tokens = args.tokens.len());
    let progress = SpanProgress::new(span.clone(), args.tokens.len())?;
    let results = analyzer
        .analyze_many(&args.tokens, days, reference, &progress)
        .instrument(span)
        .await;

    let mut reports = Vec::with_capacity(results.len());
    for (token, result) in args.tokens.iter().zip(results) {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => tracing::warn!(token = %token, error = %e, "Skipping token"),
        }
    }

    if reports.is_empty() {
        bail!("None of the requested tokens could be analyzed");
    }
    Ok(reports)
}

async fn handle_serve(args: ServeArgs, config: &Config) -> anyhow::Result<()> {
    let addr = match args.addr {
        Some(addr) => addr,
        None => config
            .server
            .addr
            .parse()
            .with_context(|| format!("Invalid server address '{}'", config.server.addr))?,
    };
    web_server::run_server(addr, config).await
}
