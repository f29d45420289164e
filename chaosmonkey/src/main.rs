//! Chaos monkey entry point
//!
//! Loads the configuration, discovers the cluster from its static node list,
//! schedules every valid service and serves the HTTP API until Ctrl+C.

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;

use chaosmonkey::{config::DEFAULT_CONFIG_PATH, services::StaticClusterInfoCollector, web, ChaosConfig, ChaosMonkey};
use shared::logging;

/// Periodically disrupts cluster services to test their resilience
#[derive(Parser, Debug)]
#[command(name = "chaosmonkey")]
#[command(about = "Probabilistic stop/kill/restart of cluster services over ssh")]
struct Args {
    /// Path to the JSON configuration file
    #[arg(long, env = "CHAOS_MONKEY_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Bind address for the HTTP API
    #[arg(long, default_value = "127.0.0.1:11020")]
    bind_addr: SocketAddr,

    /// Run the schedulers only, without the HTTP API
    #[arg(long)]
    no_api: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    logging::init_tracing_with_level(Some(&args.log_level));
    logging::log_startup("chaosmonkey", &format!("chaos monkey with {}", args.config.display()));

    let config = ChaosConfig::load(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;
    let collector = StaticClusterInfoCollector::new(config.nodes.clone());

    let (engine, rejected) = ChaosMonkey::from_config(&config, &collector)
        .await
        .context("Failed to build the chaos monkey")?;
    for error in &rejected {
        logging::log_error("chaosmonkey", "Service configuration", error);
    }
    tracing::info!(
        scheduled = ?engine.scheduled_services(),
        rejected = rejected.len(),
        "🐒 Chaos monkey running"
    );

    let api = if args.no_api {
        None
    } else {
        let (addr, handle, shutdown) = (args.bind_addr, engine.handle(), engine.shutdown_signal());
        Some(tokio::spawn(async move { web::serve(addr, handle, shutdown).await }))
    };

    match signal::ctrl_c().await {
        Ok(()) => logging::log_shutdown("chaosmonkey", "Received Ctrl+C signal"),
        Err(err) => logging::log_error("chaosmonkey", "Signal handling", &err),
    }

    let reports = engine.shutdown().await;
    for report in &reports {
        tracing::info!(
            session = %report.session_id,
            service = %report.service,
            batches = ?report.batch_sizes(),
            failures = report.failures.len(),
            interrupted = report.interrupted,
            "Rolling restart session drained"
        );
    }

    if let Some(api) = api {
        api.await.context("HTTP API task failed")??;
    }

    logging::log_success("chaosmonkey", "Chaos monkey stopped gracefully");
    Ok(())
}
