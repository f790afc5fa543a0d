//! Binary entry point: parses CLI args and environment, seeds process-wide
//! state, and serves the orchestration HTTP endpoint until shut down.

use cerebras_orchestrator::server::{router, AppState};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Server-side LLM orchestration engine.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Address to bind the HTTP server to.
    #[arg(long, default_value = "0.0.0.0:8080")]
    addr: String,

    /// Per-request timeout to the backend model endpoint, in seconds.
    #[arg(long, default_value_t = 60)]
    request_timeout_secs: u64,

    /// Overrides RUST_LOG when given.
    #[arg(long)]
    log_level: Option<String>,
}

fn parse_api_keys() -> Vec<String> {
    std::env::var("CEREBRAS_API_KEYS")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = match &args.log_level {
        Some(level) => EnvFilter::new(level.clone()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let api_keys = parse_api_keys();
    if api_keys.is_empty() {
        tracing::warn!("CEREBRAS_API_KEYS is unset or empty; every request will fail with a configuration error");
    }

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.request_timeout_secs))
        .build()?;

    let state = Arc::new(AppState { http, api_keys });
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&args.addr).await?;
    tracing::info!(addr = %args.addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_keys_trims_and_drops_empty_entries() {
        unsafe { std::env::set_var("CEREBRAS_API_KEYS", " key-a ,key-b,, key-c"); }
        let keys = parse_api_keys();
        assert_eq!(keys, vec!["key-a", "key-b", "key-c"]);
        unsafe { std::env::remove_var("CEREBRAS_API_KEYS"); }
    }

    #[test]
    fn test_parse_api_keys_empty_when_unset() {
        unsafe { std::env::remove_var("CEREBRAS_API_KEYS"); }
        assert!(parse_api_keys().is_empty());
    }
}
