use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, USER_AGENT};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::ports::RateProvider;
use crate::domain::shipping::{DeliveryRange, Parcel, PostalCode, RateOption};
use crate::error::{CheckoutError, Result};

/// Correios (PAC, SEDEX) and Jadlog service ids.
const SERVICES: &str = "1,2,3,4,17";

const AGENT: &str = "Zark E-commerce (contato@zark.com)";

/// Connection settings for the Melhor Envio shipment-calculate API.
#[derive(Debug, Clone)]
pub struct MelhorEnvioConfig {
    pub token: String,
    pub api_url: String,
    pub from_zip: PostalCode,
    pub timeout: Duration,
}

/// Live rate provider backed by the Melhor Envio HTTP API.
pub struct MelhorEnvioProvider {
    client: reqwest::Client,
    config: MelhorEnvioConfig,
}

impl MelhorEnvioProvider {
    pub fn new(config: MelhorEnvioConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CheckoutError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[derive(Serialize)]
struct CalculateRequest<'a> {
    from: Endpoint<'a>,
    to: Endpoint<'a>,
    products: &'a [Parcel],
    services: &'static str,
    options: RequestOptions,
}

#[derive(Serialize)]
struct Endpoint<'a> {
    postal_code: &'a str,
}

#[derive(Serialize)]
struct RequestOptions {
    insurance_value: i64,
    receipt: bool,
    own_hand: bool,
    reverse: bool,
    non_commercial: bool,
    platform: &'static str,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            insurance_value: 0,
            receipt: false,
            own_hand: false,
            reverse: false,
            non_commercial: false,
            platform: "zark-ecommerce",
        }
    }
}

/// One service entry of the provider response. Prices arrive in major
/// units; unavailable services carry an `error` field instead.
#[derive(Debug, Deserialize)]
struct CarrierQuote {
    name: String,
    #[serde(default)]
    price: Option<Decimal>,
    #[serde(default)]
    final_price: Option<Decimal>,
    #[serde(default)]
    delivery_time: Option<u32>,
    company: CarrierCompany,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CarrierCompany {
    id: u32,
    name: String,
    #[serde(default)]
    picture: Option<String>,
}

#[async_trait]
impl RateProvider for MelhorEnvioProvider {
    async fn fetch_rates(
        &self,
        destination: &PostalCode,
        parcels: &[Parcel],
    ) -> Result<Vec<RateOption>> {
        let url = format!(
            "{}/me/shipment/calculate",
            self.config.api_url.trim_end_matches('/')
        );
        let request = CalculateRequest {
            from: Endpoint {
                postal_code: self.config.from_zip.as_str(),
            },
            to: Endpoint {
                postal_code: destination.as_str(),
            },
            products: parcels,
            services: SERVICES,
            options: RequestOptions::default(),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.token)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, AGENT)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CheckoutError::UpstreamTimeout
                } else {
                    CheckoutError::Upstream(format!("request failed: {e}"))
                }
            })?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(CheckoutError::Configuration(
                    "rate provider rejected the configured credentials".to_string(),
                ));
            }
            status if !status.is_success() => {
                return Err(CheckoutError::Upstream(format!("status {status}")));
            }
            _ => {}
        }

        let quotes: Vec<CarrierQuote> = response
            .json()
            .await
            .map_err(|e| CheckoutError::Internal(format!("malformed provider response: {e}")))?;

        map_quotes(quotes)
    }
}

fn map_quotes(quotes: Vec<CarrierQuote>) -> Result<Vec<RateOption>> {
    let mut options = Vec::with_capacity(quotes.len());
    for quote in quotes {
        if let Some(message) = &quote.error {
            warn!(service = %quote.name, %message, "carrier declined to quote service");
            continue;
        }
        let (Some(final_price), Some(delivery_time)) = (quote.final_price, quote.delivery_time)
        else {
            warn!(service = %quote.name, "carrier quote missing price or delivery time");
            continue;
        };

        options.push(RateOption {
            id: format!(
                "{}-{}",
                quote.company.name.to_lowercase(),
                quote.name.to_lowercase().replace(' ', "-")
            ),
            name: quote.name,
            company: quote.company.name,
            company_id: quote.company.id,
            price: to_cents(final_price)?,
            original_price: to_cents(quote.price.unwrap_or(final_price))?,
            delivery_time,
            delivery_range: DeliveryRange {
                min: delivery_time.saturating_sub(2).max(1),
                max: delivery_time + 2,
            },
            is_cheapest: false,
            logo: quote.company.picture.unwrap_or_default(),
            currency: quote.currency.unwrap_or_else(|| "BRL".to_string()),
        });
    }
    Ok(options)
}

/// Melhor Envio prices quotes in reais; options are priced in cents.
fn to_cents(price: Decimal) -> Result<i64> {
    (price * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .ok_or_else(|| CheckoutError::Internal(format!("carrier price out of range: {price}")))
}
