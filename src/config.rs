use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::shipping::{ParcelMinimums, PostalCode};
use crate::error::{CheckoutError, Result};
use crate::infrastructure::estimate::EstimateTiers;

/// PIX payee identity used for every generated charge.
#[derive(Debug, Clone)]
pub struct PixConfig {
    pub key: String,
    pub merchant_name: String,
    pub merchant_city: String,
    pub expiry_minutes: i64,
}

/// Process-wide configuration, loaded once at startup.
///
/// A missing `MELHOR_ENVIO_TOKEN` is a supported state: it selects the
/// estimate provider instead of failing startup. The origin CEP is
/// validated here so a misconfigured origin never reaches the quote path.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub melhor_envio_token: Option<String>,
    pub melhor_envio_api_url: String,
    pub from_zip: PostalCode,
    pub use_mock: bool,
    pub provider_timeout: Duration,
    pub allowed_carriers: Vec<String>,
    pub minimums: ParcelMinimums,
    pub tiers: EstimateTiers,
    pub cache_ttl: Duration,
    pub sweep_interval: Duration,
    pub rate_limit_window: Duration,
    pub rate_limit_max: u32,
    pub pix: PixConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        let from_zip_raw = var("MELHOR_ENVIO_FROM_ZIP").unwrap_or_else(|| {
            info!("MELHOR_ENVIO_FROM_ZIP not set, using default origin");
            "01310100".to_string()
        });
        let from_zip = PostalCode::parse(&from_zip_raw).map_err(|e| {
            CheckoutError::Configuration(format!("MELHOR_ENVIO_FROM_ZIP: {e}"))
        })?;

        Ok(Self {
            port: try_load("PORT", 3000),
            melhor_envio_token: var("MELHOR_ENVIO_TOKEN"),
            melhor_envio_api_url: var("MELHOR_ENVIO_API_URL")
                .unwrap_or_else(|| "https://sandbox.melhorenvio.com.br/api/v2".to_string()),
            from_zip,
            use_mock: var("MELHOR_ENVIO_USE_MOCK").is_some_and(|v| v == "true"),
            provider_timeout: Duration::from_secs(try_load("PROVIDER_TIMEOUT_SECS", 30)),
            allowed_carriers: vec!["correios".to_string(), "jadlog".to_string()],
            minimums: ParcelMinimums::default(),
            tiers: EstimateTiers::default(),
            cache_ttl: Duration::from_secs(try_load("SHIPPING_CACHE_TTL_SECS", 300)),
            sweep_interval: Duration::from_secs(try_load("SHIPPING_CACHE_SWEEP_SECS", 600)),
            rate_limit_window: Duration::from_secs(try_load("RATE_LIMIT_WINDOW_SECS", 60)),
            rate_limit_max: try_load("RATE_LIMIT_MAX", 10),
            pix: PixConfig {
                key: var("PIX_KEY").unwrap_or_else(|| "zark@zarabatanas.com.br".to_string()),
                merchant_name: var("PIX_MERCHANT_NAME").unwrap_or_else(|| "ZARK".to_string()),
                merchant_city: var("PIX_MERCHANT_CITY")
                    .unwrap_or_else(|| "Sao Paulo".to_string()),
                expiry_minutes: try_load("PIX_EXPIRY_MINUTES", 15),
            },
        })
    }

    /// The live-provider token, unless mock mode forces estimates.
    pub fn live_token(&self) -> Option<&str> {
        if self.use_mock {
            return None;
        }
        self.melhor_envio_token.as_deref()
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn try_load<T: FromStr>(key: &str, default: T) -> T
where
    T::Err: Display,
{
    match var(key) {
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("invalid {key} value: {e}, using default");
            default
        }),
        None => default,
    }
}
