use tracing::{debug, info};

use crate::domain::ports::SharedRateProvider;
use crate::domain::shipping::{CartItem, ParcelMinimums, PostalCode, Quote, fingerprint};
use crate::error::{CheckoutError, Result};
use crate::infrastructure::cache::QuoteCache;

/// Business rules applied to every quote: which carriers the store sells
/// and the parcel minimums of the contracted carrier.
#[derive(Debug, Clone)]
pub struct QuotePolicy {
    /// Lowercase fragments matched case-insensitively against the
    /// carrier company name.
    pub allowed_carriers: Vec<String>,
    pub minimums: ParcelMinimums,
}

impl Default for QuotePolicy {
    fn default() -> Self {
        Self {
            allowed_carriers: vec!["correios".to_string(), "jadlog".to_string()],
            minimums: ParcelMinimums::default(),
        }
    }
}

/// The main entry point for shipping quotes.
///
/// `QuoteEngine` owns the rate provider and the quote cache. It validates
/// the cart, clamps parcels to carrier minimums, short-circuits on cached
/// fingerprints and ranks whatever the provider returns. It either
/// produces a complete, consistent option list or fails outright; partial
/// quotes are never returned.
pub struct QuoteEngine {
    provider: SharedRateProvider,
    cache: QuoteCache,
    policy: QuotePolicy,
}

impl QuoteEngine {
    pub fn new(provider: SharedRateProvider, cache: QuoteCache, policy: QuotePolicy) -> Self {
        Self {
            provider,
            cache,
            policy,
        }
    }

    pub async fn calculate(&self, destination: &PostalCode, items: &[CartItem]) -> Result<Quote> {
        if items.is_empty() {
            return Err(CheckoutError::Validation("cart is empty".to_string()));
        }

        let parcels = items
            .iter()
            .map(|item| item.to_parcel(&self.policy.minimums))
            .collect::<Result<Vec<_>>>()?;

        let key = fingerprint(destination, items);
        if let Some(quote) = self.cache.get(&key).await {
            debug!(%destination, "returning cached shipping quote");
            return Ok(quote);
        }

        let raw = self.provider.fetch_rates(destination, &parcels).await?;
        let mut options: Vec<_> = raw
            .into_iter()
            .filter(|option| {
                let company = option.company.to_lowercase();
                self.policy
                    .allowed_carriers
                    .iter()
                    .any(|allowed| company.contains(allowed))
            })
            .collect();
        options.sort_by_key(|option| option.price);
        for (index, option) in options.iter_mut().enumerate() {
            option.is_cheapest = index == 0;
        }

        let quote = Quote {
            options,
            estimated: self.provider.is_estimate(),
        };
        info!(
            %destination,
            options = quote.options.len(),
            estimated = quote.estimated,
            "shipping quote computed"
        );
        self.cache.insert(key, quote.clone()).await;
        Ok(quote)
    }
}
