use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};

/// A Brazilian CEP normalized to its eight digits.
///
/// Parsing strips formatting characters, so `"01310-100"` and `"01310100"`
/// produce the same value. All-repeated-digit sequences are rejected as
/// placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostalCode(String);

impl PostalCode {
    pub fn parse(raw: &str) -> Result<Self> {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() != 8 {
            return Err(CheckoutError::Validation(format!(
                "invalid CEP {raw:?}: expected 8 digits"
            )));
        }
        let first = digits.as_bytes()[0];
        if digits.bytes().all(|b| b == first) {
            return Err(CheckoutError::Validation(format!(
                "invalid CEP {raw:?}: placeholder sequence"
            )));
        }
        Ok(Self(digits))
    }

    pub fn is_valid(raw: &str) -> bool {
        Self::parse(raw).is_ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PostalCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Carrier minimums applied to every parcel before quoting. The clamp is
/// one-way: a dimension is only ever raised to the minimum, never lowered.
#[derive(Debug, Clone, Copy)]
pub struct ParcelMinimums {
    pub width_cm: f64,
    pub height_cm: f64,
    pub length_cm: f64,
    pub weight_kg: f64,
}

impl Default for ParcelMinimums {
    fn default() -> Self {
        // Correios parcel floor: 11cm x 2cm x 16cm, 1g
        Self {
            width_cm: 11.0,
            height_cm: 2.0,
            length_cm: 16.0,
            weight_kg: 0.001,
        }
    }
}

/// A cart line item as handed over by the storefront.
///
/// Physical attributes are optional at the boundary so that a missing value
/// can be reported per product instead of failing deserialization wholesale.
#[derive(Debug, Clone, Deserialize)]
pub struct CartItem {
    pub id: String,
    #[serde(default)]
    pub price: Option<rust_decimal::Decimal>,
    pub quantity: u32,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub length: Option<f64>,
}

impl CartItem {
    /// Validates the physical attributes and applies the carrier minimum
    /// clamp, producing the provider-facing parcel.
    pub fn to_parcel(&self, minimums: &ParcelMinimums) -> Result<Parcel> {
        let attrs = match (self.weight, self.width, self.height, self.length) {
            (Some(weight), Some(width), Some(height), Some(length))
                if weight > 0.0 && width > 0.0 && height > 0.0 && length > 0.0 =>
            {
                (weight, width, height, length)
            }
            _ => {
                return Err(CheckoutError::Validation(format!(
                    "product {:?} is missing weight or dimensions",
                    self.id
                )));
            }
        };
        if self.quantity == 0 {
            return Err(CheckoutError::Validation(format!(
                "product {:?} has zero quantity",
                self.id
            )));
        }

        let (weight, width, height, length) = attrs;
        Ok(Parcel {
            id: self.id.clone(),
            weight: weight.max(minimums.weight_kg),
            width: width.max(minimums.width_cm),
            height: height.max(minimums.height_cm),
            length: length.max(minimums.length_cm),
            quantity: self.quantity,
        })
    }
}

/// Provider-facing view of a line item, dimensions already clamped.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Parcel {
    pub id: String,
    pub weight: f64,
    pub width: f64,
    pub height: f64,
    pub length: f64,
    pub quantity: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryRange {
    pub min: u32,
    pub max: u32,
}

/// A single priced shipping option, serialized camelCase for the
/// storefront client. Prices are integer cents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateOption {
    pub id: String,
    pub name: String,
    pub company: String,
    pub company_id: u32,
    pub price: i64,
    pub original_price: i64,
    pub delivery_time: u32,
    pub delivery_range: DeliveryRange,
    pub is_cheapest: bool,
    pub logo: String,
    pub currency: String,
}

/// The engine's result: ranked options plus whether they were synthesized
/// by the estimate provider instead of priced by the carrier API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub options: Vec<RateOption>,
    pub estimated: bool,
}

/// Cache key for a quote request: destination plus the ordered
/// product-id/quantity pairs.
pub fn fingerprint(destination: &PostalCode, items: &[CartItem]) -> String {
    let mut key = String::with_capacity(16 + items.len() * 8);
    key.push_str(destination.as_str());
    for item in items {
        key.push(':');
        key.push_str(&item.id);
        key.push('x');
        key.push_str(&item.quantity.to_string());
    }
    key
}
