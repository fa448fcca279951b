use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};
use zark_checkout::application::quotes::{QuoteEngine, QuotePolicy};
use zark_checkout::config::Config;
use zark_checkout::domain::ports::SharedRateProvider;
use zark_checkout::infrastructure::cache::QuoteCache;
use zark_checkout::infrastructure::estimate::EstimateProvider;
use zark_checkout::infrastructure::melhor_envio::{MelhorEnvioConfig, MelhorEnvioProvider};
use zark_checkout::infrastructure::rate_limit::FixedWindowLimiter;
use zark_checkout::interfaces::http::{self, AppState};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to bind instead of 0.0.0.0:<PORT>.
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config = Config::load().into_diagnostic()?;

    let provider: SharedRateProvider = if let Some(token) = config.live_token() {
        info!("using live Melhor Envio rate provider");
        let live = MelhorEnvioProvider::new(MelhorEnvioConfig {
            token: token.to_string(),
            api_url: config.melhor_envio_api_url.clone(),
            from_zip: config.from_zip.clone(),
            timeout: config.provider_timeout,
        })
        .into_diagnostic()?;
        Arc::new(live)
    } else {
        info!("no carrier credentials configured, serving estimated shipping quotes");
        Arc::new(EstimateProvider::new(config.tiers.clone()))
    };

    let cache = QuoteCache::new(config.cache_ttl);
    cache.spawn_sweeper(config.sweep_interval);

    let engine = QuoteEngine::new(
        provider,
        cache,
        QuotePolicy {
            allowed_carriers: config.allowed_carriers.clone(),
            minimums: config.minimums,
        },
    );
    let limiter = FixedWindowLimiter::new(config.rate_limit_window, config.rate_limit_max);

    let state = AppState {
        engine: Arc::new(engine),
        limiter: Arc::new(limiter),
        origin: config.from_zip.clone(),
        pix: Arc::new(config.pix.clone()),
    };

    let addr = cli
        .bind
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], config.port)));
    http::serve(state, addr).await.into_diagnostic()?;

    Ok(())
}
