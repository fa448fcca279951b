use async_trait::async_trait;

use crate::domain::ports::RateProvider;
use crate::domain::shipping::{DeliveryRange, Parcel, PostalCode, RateOption};
use crate::error::Result;

/// Weight-tier price table for the estimate provider. Breakpoints are
/// inclusive upper bounds in kilograms, prices in cents. Business
/// configuration, not algorithmic constants.
#[derive(Debug, Clone)]
pub struct EstimateTiers {
    pub breakpoints: Vec<(f64, i64)>,
    pub heavy_price: i64,
    pub express_multiplier: f64,
    pub economy_multiplier: f64,
}

impl Default for EstimateTiers {
    fn default() -> Self {
        Self {
            breakpoints: vec![(0.1, 1200), (1.0, 1800), (5.0, 2500)],
            heavy_price: 4500,
            express_multiplier: 1.8,
            economy_multiplier: 1.4,
        }
    }
}

/// Deterministic fallback provider.
///
/// Synthesizes a standard, an express and an economy option from the
/// total shipment weight so checkout keeps working without carrier
/// credentials. Quotes are flagged as estimates so callers can tell them
/// apart from carrier-priced options.
pub struct EstimateProvider {
    tiers: EstimateTiers,
}

impl EstimateProvider {
    pub fn new(tiers: EstimateTiers) -> Self {
        Self { tiers }
    }

    fn base_price(&self, total_weight: f64) -> i64 {
        for (limit, price) in &self.tiers.breakpoints {
            if total_weight <= *limit {
                return *price;
            }
        }
        self.tiers.heavy_price
    }
}

#[async_trait]
impl RateProvider for EstimateProvider {
    async fn fetch_rates(
        &self,
        _destination: &PostalCode,
        parcels: &[Parcel],
    ) -> Result<Vec<RateOption>> {
        let total_weight: f64 = parcels
            .iter()
            .map(|parcel| parcel.weight * f64::from(parcel.quantity))
            .sum();
        let base = self.base_price(total_weight);
        let light = total_weight <= 1.0;

        let express = (base as f64 * self.tiers.express_multiplier).round() as i64;
        let economy = (base as f64 * self.tiers.economy_multiplier).round() as i64;

        Ok(vec![
            RateOption {
                id: "correios-pac".to_string(),
                name: "PAC".to_string(),
                company: "Correios".to_string(),
                company_id: 1,
                price: base,
                original_price: base,
                delivery_time: if light { 4 } else { 6 },
                delivery_range: DeliveryRange { min: 3, max: 7 },
                is_cheapest: false,
                logo: String::new(),
                currency: "BRL".to_string(),
            },
            RateOption {
                id: "correios-sedex".to_string(),
                name: "SEDEX".to_string(),
                company: "Correios".to_string(),
                company_id: 1,
                price: express,
                original_price: express,
                delivery_time: if light { 2 } else { 4 },
                delivery_range: DeliveryRange { min: 1, max: 5 },
                is_cheapest: false,
                logo: String::new(),
                currency: "BRL".to_string(),
            },
            RateOption {
                id: "jadlog-package".to_string(),
                name: "Package".to_string(),
                company: "Jadlog".to_string(),
                company_id: 2,
                price: economy,
                original_price: economy,
                delivery_time: if light { 3 } else { 5 },
                delivery_range: DeliveryRange { min: 2, max: 6 },
                is_cheapest: false,
                logo: String::new(),
                currency: "BRL".to_string(),
            },
        ])
    }

    fn is_estimate(&self) -> bool {
        true
    }
}
