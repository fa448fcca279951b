use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::AppState;
use crate::domain::pix::{self, PixCharge};
use crate::error::{CheckoutError, Result};

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub customer: Option<Customer>,
}

#[derive(Debug, Deserialize)]
pub struct Customer {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PixPayment {
    pub copy_paste: String,
    pub expires_at: String,
    pub amount: f64,
    pub description: String,
}

/// POST /pix/generate
pub async fn generate(State(state): State<AppState>, Json(body): Json<GenerateRequest>) -> Response {
    match build_payment(&state, body) {
        Ok(payment) => Json(json!({ "success": true, "pix": payment })).into_response(),
        Err(err) => {
            let status = match err {
                CheckoutError::Validation(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                status,
                Json(json!({ "success": false, "error": err.public_message() })),
            )
                .into_response()
        }
    }
}

fn build_payment(state: &AppState, request: GenerateRequest) -> Result<PixPayment> {
    let (Some(amount), Some(customer)) = (request.amount, request.customer) else {
        return Err(CheckoutError::Validation(
            "amount and customer are required".to_string(),
        ));
    };

    let cents_exact = (amount * 100.0).round();
    if !cents_exact.is_finite() || cents_exact.abs() > i64::MAX as f64 {
        return Err(CheckoutError::Validation("amount out of range".to_string()));
    }
    let cents = cents_exact as i64;

    let description = request
        .description
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| format!("Compra - {}", customer.name));

    let charge = PixCharge {
        key: state.pix.key.clone(),
        amount_cents: cents,
        merchant_name: state.pix.merchant_name.clone(),
        merchant_city: state.pix.merchant_city.clone(),
        txid: pix::generate_txid(),
    };
    let payload = charge.encode()?;

    let expires_at = Utc::now() + chrono::Duration::minutes(state.pix.expiry_minutes);

    Ok(PixPayment {
        copy_paste: payload,
        expires_at: expires_at.to_rfc3339(),
        amount,
        description,
    })
}
