use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::AppState;
use crate::domain::shipping::{CartItem, PostalCode, RateOption};
use crate::error::CheckoutError;

#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    #[serde(default)]
    pub cep: Option<String>,
    #[serde(default)]
    pub products: Vec<CartItem>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateResponse {
    pub success: bool,
    pub options: Vec<RateOption>,
    pub estimated: bool,
    pub from_zip: String,
    pub to_zip: String,
}

/// POST /shipping/calculate
pub async fn calculate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CalculateRequest>,
) -> Result<Json<CalculateResponse>, CheckoutError> {
    let client = client_address(&headers);
    if !state.limiter.allow(&client).await {
        return Err(CheckoutError::RateLimited);
    }

    let destination = PostalCode::parse(body.cep.as_deref().unwrap_or_default())?;
    let quote = state.engine.calculate(&destination, &body.products).await?;

    Ok(Json(CalculateResponse {
        success: true,
        options: quote.options,
        estimated: quote.estimated,
        from_zip: state.origin.to_string(),
        to_zip: destination.to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ValidateParams {
    #[serde(rename = "zipCode")]
    pub zip_code: Option<String>,
}

/// GET /shipping/calculate?zipCode=... — standalone CEP pre-validation.
pub async fn validate(Query(params): Query<ValidateParams>) -> Response {
    let Some(zip) = params.zip_code else {
        return CheckoutError::Validation("zipCode query parameter is required".to_string())
            .into_response();
    };

    let digits: String = zip.chars().filter(|c| c.is_ascii_digit()).collect();
    Json(json!({
        "valid": PostalCode::is_valid(&zip),
        "zipCode": digits,
    }))
    .into_response()
}

/// Client address for rate limiting: first `x-forwarded-for` entry, then
/// `x-real-ip`, then "unknown".
fn client_address(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok())
        && let Some(first) = forwarded.split(',').next()
        && !first.trim().is_empty()
    {
        return first.trim().to_string();
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
