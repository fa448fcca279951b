use std::sync::Arc;

use async_trait::async_trait;

use super::shipping::{Parcel, PostalCode, RateOption};
use crate::error::Result;

/// Carrier-rate capability consumed by the quote engine.
///
/// Two adapters implement it: the live Melhor Envio client and the
/// deterministic weight-tier estimator. Which one runs is decided once at
/// startup from configuration, never per request.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Prices the given parcels to the destination. Options come back
    /// unranked; filtering and sorting is the engine's job.
    async fn fetch_rates(
        &self,
        destination: &PostalCode,
        parcels: &[Parcel],
    ) -> Result<Vec<RateOption>>;

    /// True when quotes are synthesized locally instead of priced by the
    /// carrier API.
    fn is_estimate(&self) -> bool {
        false
    }
}

pub type SharedRateProvider = Arc<dyn RateProvider>;
