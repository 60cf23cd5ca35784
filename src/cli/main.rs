// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Lonkero Mutator - Structural HTTP Parameter Fuzzer
 * Standalone CLI that replays requests with mutated parameter names and values
 *
 * Features:
 * - URL lists and exported request files as input
 * - Nested JSON, form and XML body mutation
 * - Header overrides merged into every request
 * - Skip or exit on Ctrl+C while a request is in flight
 *
 * (c) 2026 Bountyy Oy
 */

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn, Level};

use lonkero_mutator::config::{ConfigFormat, ConfigLoader, ConfigValidator, MutatorConfig};
use lonkero_mutator::http_client::HttpDispatcher;
use lonkero_mutator::input::InputSource;
use lonkero_mutator::modifiers::ModifierCatalog;
use lonkero_mutator::reporting::ConsoleReporter;
use lonkero_mutator::runner::{Campaign, CtrlCInterrupt};

/// Lonkero Mutator - structural HTTP parameter fuzzer
#[derive(Parser)]
#[command(name = "lonkero-mutator")]
#[command(author = "Bountyy Oy <info@bountyy.fi>")]
#[command(version)]
#[command(about = "Replays HTTP requests with every parameter name and value mutated.", long_about = None)]
#[command(group(ArgGroup::new("input").required(true).args(["list", "json"])))]
struct Cli {
    /// Path to file with list of URLs
    #[arg(short, long)]
    list: Option<PathBuf>,

    /// Path to JSON file with exported requests
    #[arg(short, long)]
    json: Option<PathBuf>,

    /// Header override file (JSON, YAML or TOML name/value map)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Allow redirects
    #[arg(short, long, default_value = "true", value_parser = ["true", "false"])]
    redirect: String,

    /// Full settings file
    #[arg(long, env = "MUTATOR_SETTINGS")]
    settings: Option<PathBuf>,

    /// Proxy URL for every request
    #[arg(long)]
    proxy: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Accept invalid TLS certificates
    #[arg(long)]
    insecure: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Quiet mode - only show request results
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("lonkero-mutator")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;

    let source = match (&cli.list, &cli.json) {
        (Some(path), _) => InputSource::UrlList(path.clone()),
        (None, Some(path)) => InputSource::Exported(path.clone()),
        (None, None) => anyhow::bail!("Either --list or --json is required"),
    };
    let requests = source.load()?;
    info!("Loaded {} requests", requests.len());

    if requests.is_empty() {
        warn!("No valid requests to test");
        return Ok(());
    }

    let dispatcher = HttpDispatcher::with_config(&config.http)?;
    let campaign = Campaign::new(
        Arc::new(ModifierCatalog::builtin()),
        Arc::new(dispatcher),
        Arc::new(ConsoleReporter::new()),
    )
    .with_max_depth(config.engine.max_depth)
    .with_header_overrides(config.headers.clone())
    .with_interrupt(Arc::new(CtrlCInterrupt::install()));

    let started = Instant::now();
    let summary = campaign.run(requests).await;

    info!(
        "Finished in {:.1}s: {} requests, {} variants dispatched, {} failed, {} sections skipped, {} aborted",
        started.elapsed().as_secs_f64(),
        summary.requests,
        summary.variants_dispatched,
        summary.variants_failed,
        summary.sections_skipped,
        summary.sections_aborted
    );

    Ok(())
}

/// Settings file, then header overrides, then command line flags
fn build_config(cli: &Cli) -> Result<MutatorConfig> {
    let mut config = match &cli.settings {
        Some(path) => ConfigLoader::new(path)?
            .load_config()
            .with_context(|| format!("Failed to load settings from {:?}", path))?,
        None => MutatorConfig::from_env()?,
    };

    if let Some(path) = &cli.config {
        // Header files without a known extension are read as JSON
        let loader = ConfigLoader::new(path)
            .unwrap_or_else(|_| ConfigLoader::with_format(path, ConfigFormat::Json));
        let headers = loader.load_header_overrides()?;
        config.headers.extend(headers);
    }

    config.http.follow_redirects = cli.redirect == "true";

    if let Some(proxy) = &cli.proxy {
        config.http.proxy = Some(proxy.clone());
    }
    if let Some(timeout) = cli.timeout {
        config.http.timeout_secs = timeout;
    }
    if cli.insecure {
        config.http.accept_invalid_certs = true;
    }

    ConfigValidator::validate(&config)?;
    Ok(config)
}
