use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, CheckoutError>;

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("{0}")]
    Validation(String),
    #[error("too many requests, wait a moment and try again")]
    RateLimited,
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("shipping quote timed out, try again")]
    UpstreamTimeout,
    #[error("rate provider error: {0}")]
    Upstream(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl CheckoutError {
    /// Message safe to put in a response body. Upstream and configuration
    /// detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            CheckoutError::Validation(_)
            | CheckoutError::RateLimited
            | CheckoutError::UpstreamTimeout => self.to_string(),
            CheckoutError::Configuration(_) => {
                "shipping service is misconfigured, contact support".to_string()
            }
            CheckoutError::Upstream(_) => {
                "could not quote shipping right now, try again later".to_string()
            }
            CheckoutError::Internal(_) => "internal server error".to_string(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            CheckoutError::Validation(_) => StatusCode::BAD_REQUEST,
            CheckoutError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            CheckoutError::UpstreamTimeout => StatusCode::SERVICE_UNAVAILABLE,
            CheckoutError::Configuration(_)
            | CheckoutError::Upstream(_)
            | CheckoutError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CheckoutError {
    fn into_response(self) -> Response {
        match &self {
            CheckoutError::Configuration(_)
            | CheckoutError::Upstream(_)
            | CheckoutError::Internal(_) => error!("{self}"),
            _ => {}
        }

        (self.status(), Json(json!({ "error": self.public_message() }))).into_response()
    }
}
