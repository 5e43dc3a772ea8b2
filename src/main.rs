use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use trend_extractor::config::Config;
use trend_extractor::inference::gemini::GeminiClient;
use trend_extractor::output::terminal;
use trend_extractor::pipeline::cancel::CancelToken;
use trend_extractor::pipeline::error::ErrorKind;
use trend_extractor::pipeline::trends::TrendPipeline;
use trend_extractor::source::reddit::RedditClient;

/// Trend extractor: structured trend reports from Reddit's hot posts.
///
/// Pulls the current listing, distills it into a bounded corpus, and asks
/// Gemini for emerging topics, sentiment, entities, and a summary.
#[derive(Parser)]
#[command(name = "trend-extractor", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analysis once and print the report
    Report {
        /// Print the validated report as JSON instead of the terminal view
        #[arg(long)]
        json: bool,
    },

    /// Serve the analysis over HTTP (GET /api/trends)
    #[cfg(feature = "web")]
    Serve {
        /// Port to listen on (overrides TREND_PORT)
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind (overrides TREND_BIND)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Show the effective configuration (secrets redacted)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("trend_extractor=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report { json } => {
            let config = Config::load()?;
            config.require_gemini()?;
            let pipeline = build_pipeline(&config)?;

            // Ctrl-C aborts whichever stage is in flight
            let cancel = CancelToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, cancelling analysis");
                    on_signal.cancel();
                }
            });

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.set_message("Analyzing Reddit hot posts...");
            spinner.enable_steady_tick(Duration::from_millis(120));

            let result = pipeline.produce_trend_report_with(&cancel).await;
            spinner.finish_and_clear();

            match result {
                Ok(report) if json => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                Ok(report) => {
                    terminal::display_report(&report, chrono::Local::now());
                }
                Err(e) => {
                    terminal::display_error(&e);
                    std::process::exit(exit_code(e.kind()));
                }
            }
        }

        #[cfg(feature = "web")]
        Commands::Serve { port, bind } => {
            let mut config = Config::load()?;
            config.require_gemini()?;
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(bind) = bind {
                config.bind = bind;
            }

            let pipeline = build_pipeline(&config)?;
            info!(
                model = %config.model,
                cache_ttl_secs = config.cache_ttl.as_secs(),
                "Starting web server"
            );
            trend_extractor::web::run_server(&config, pipeline).await?;
        }

        Commands::Config => {
            let config = Config::load()?;
            let key_status = if config.gemini_api_key.is_empty() {
                "not set".red().to_string()
            } else {
                "set".green().to_string()
            };
            println!("{}", "Configuration".bold());
            println!("  GEMINI_API_KEY:     {key_status}");
            println!("  Model:              {}", config.model);
            println!("  Gemini endpoint:    {}", config.gemini_base_url);
            println!("  Listing URL:        {}", config.reddit_url);
            println!("  User-Agent:         {}", config.user_agent);
            println!("  Corpus budget:      {} chars", config.max_chars);
            println!("  Fetch timeout:      {}", describe_timeout(config.fetch_timeout));
            println!("  Inference timeout:  {}", describe_timeout(config.inference_timeout));
            println!("  Inference attempts: {}", config.inference_attempts);
            println!("  Cache TTL:          {}s", config.cache_ttl.as_secs());
            println!("  Listen address:     {}:{}", config.bind, config.port);
        }
    }

    Ok(())
}

/// Wire the Reddit source and Gemini client into a pipeline.
fn build_pipeline(config: &Config) -> Result<TrendPipeline> {
    let source = RedditClient::new(&config.reddit_url, &config.user_agent)?;
    let inference = GeminiClient::with_base_url(
        config.gemini_api_key.clone(),
        config.model.clone(),
        &config.gemini_base_url,
    );
    Ok(TrendPipeline::new(
        Arc::new(source),
        Arc::new(inference),
        config.pipeline_settings(),
    ))
}

fn describe_timeout(limit: Duration) -> String {
    if limit.is_zero() {
        "none".to_string()
    } else {
        format!("{}s", limit.as_secs())
    }
}

/// Distinct process exit code per failure kind.
fn exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::UpstreamFetch => 2,
        ErrorKind::EmptyCorpus => 3,
        ErrorKind::Inference => 4,
        ErrorKind::SchemaValidation => 5,
    }
}
