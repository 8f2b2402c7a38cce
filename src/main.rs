use anyhow::{Context, Result};
use clap::Parser;
use reqwest::redirect::Policy;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use habr_relay::api::{create_router, ApiState};
use habr_relay::cache::{spawn_sweeper, SentCache};
use habr_relay::config::Config;
use habr_relay::delivery::Courier;
use habr_relay::feed::FeedFetcher;
use habr_relay::limiter::RateLimiter;
use habr_relay::pipeline::Pipeline;
use habr_relay::telegram::{run_polling, TelegramClient};

#[derive(Parser, Debug)]
#[command(
    name = "habr-relay",
    about = "Relays Habr information-security articles to Telegram and a web API"
)]
struct Args {
    /// TOML config file (defaults apply when omitted or missing)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Web server port, overrides PORT and the config file
    #[arg(long)]
    port: Option<u16>,

    /// Serve the web API only, even if a bot token is configured
    #[arg(long)]
    web_only: bool,
}

fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }

        tracing::debug!(to = %url, hop = attempt.previous().len() + 1, "Following redirect");
        attempt.follow()
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    config
        .apply_env()
        .context("Invalid environment configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    let feed_url = config.validate().context("Invalid configuration")?;
    tracing::debug!(config = ?config, "Effective configuration");

    let http_client = reqwest::Client::builder()
        .redirect(create_redirect_policy())
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .context("Failed to build HTTP client")?;

    let cache = Arc::new(SentCache::new(config.retention()));
    let _sweeper = spawn_sweeper(Arc::clone(&cache), config.sweep_interval());

    let fetcher = FeedFetcher::new(http_client.clone(), feed_url)
        .with_timeout(config.fetch_timeout());
    let pipeline = Arc::new(
        Pipeline::new(fetcher, Arc::clone(&cache)).with_max_results(config.max_results),
    );

    match config.bot_token().filter(|_| !args.web_only) {
        Some(token) => {
            let client = Arc::new(TelegramClient::new(http_client.clone(), token));
            let me = client
                .get_me()
                .await
                .context("Failed to authorize Telegram bot")?;
            tracing::info!(
                username = me.username.as_deref().unwrap_or("unknown"),
                "Authorized on Telegram"
            );

            let limiter = Arc::new(RateLimiter::new(
                config.rate_limit_interval(),
                1,
                config.rate_limit_scope,
            ));
            let courier = Arc::new(
                Courier::new(Arc::clone(&pipeline), client.clone(), limiter)
                    .with_send_delay(config.send_delay()),
            );
            tokio::spawn(run_polling(client, courier));
        }
        None => {
            tracing::info!("No Telegram bot token configured, running web API only");
        }
    }

    let addr = config.socket_addr()?;
    let router = create_router(ApiState::new(pipeline), config.static_dir());
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "Web server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server failed")?;

    tracing::info!("Stopped");
    Ok(())
}
