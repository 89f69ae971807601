//! SafeSpace command-line runner
//!
//! Reads one message per line from a file or stdin, moderates the batch and
//! prints either the full JSON report or the cleaned text.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use metrics_exporter_prometheus::PrometheusHandle;
use safespace_batch::{BatchPipeline, BatchReport, ConfigOverrides, EngineConfig};
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Full report: records, decisions, rewrites, cleaned text, stats
    Json,
    /// Cleaned text only; summary goes to stderr
    Text,
}

#[derive(Parser, Debug)]
#[command(name = "safespace")]
#[command(about = "Classify, remove or rewrite toxic messages in a batch", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "safespace.yaml")]
    config: PathBuf,

    /// Input file with one message per line, `-` for stdin
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// API key for the remote service
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Messages processed concurrently
    #[arg(short, long)]
    workers: Option<usize>,

    /// Keep the response cache in memory only
    #[arg(long)]
    no_cache: bool,

    /// Print Prometheus metrics to stderr after the batch
    #[arg(long)]
    metrics: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_json);

    let mut config = EngineConfig::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    config.apply(&ConfigOverrides {
        api_key: cli.api_key.clone(),
        workers: cli.workers,
        no_cache: cli.no_cache,
    });

    let metrics_handle = if cli.metrics { Some(init_metrics()?) } else { None };

    let messages = read_messages(&cli.input)?;
    info!("Read {} messages from {}", messages.len(), cli.input);

    let cancel = CancellationToken::new();
    let pipeline = BatchPipeline::from_config(&config, cancel.clone())?;

    // Cancelling stops new remote dispatches; the batch still completes on rules
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Shutdown signal received, no further remote calls will be made");
        signal_cancel.cancel();
    });

    let report = pipeline.run(&messages).await?;

    match cli.format {
        OutputFormat::Json => write_json(&report)?,
        OutputFormat::Text => {
            let mut stdout = io::stdout().lock();
            if !report.cleaned_text.is_empty() {
                writeln!(stdout, "{}", report.cleaned_text)?;
            }
            eprintln!("{}", report.stats);
        }
    }

    if let Some(handle) = metrics_handle {
        eprintln!("{}", handle.render());
    }

    Ok(())
}

/// Read non-blank lines from a file or stdin
fn read_messages(input: &str) -> Result<Vec<String>> {
    let reader: Box<dyn BufRead> = if input == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = std::fs::File::open(input)
            .with_context(|| format!("Failed to open input file {}", input))?;
        Box::new(BufReader::new(file))
    };

    let mut messages = Vec::new();
    for line in reader.lines() {
        let line = line.context("Failed to read input")?;
        let line = line.trim();
        if !line.is_empty() {
            messages.push(line.to_string());
        }
    }

    Ok(messages)
}

fn write_json(report: &BatchReport) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, report)?;
    writeln!(stdout)?;
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging on stderr
fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("safespace=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("safespace=info"))
    };

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

/// Install the Prometheus recorder and return a handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!("safespace_messages_total", "Messages processed");
    metrics::describe_counter!("safespace_toxic_total", "Messages judged toxic");
    metrics::describe_counter!(
        "safespace_decisions_total",
        "Remediation decisions by action"
    );
    metrics::describe_counter!(
        "safespace_remote_failures_total",
        "Remote calls that produced no usable answer, by task"
    );
    metrics::describe_counter!("safespace_cache_hits_total", "Response cache hits by task");
    metrics::describe_histogram!(
        "safespace_batch_latency_ms",
        metrics::Unit::Milliseconds,
        "Wall-clock time per batch"
    );

    Ok(handle)
}
