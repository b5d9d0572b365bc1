//! RPC surface for the provider engine.
//!
//! JSON-over-HTTP entry points, one per lifecycle method, dispatching to
//! the registered provider for the request's kind token. Validation
//! failures are response data; everything else maps onto an error body.

mod handlers;
mod routes;
mod types;

pub use routes::{ApiDoc, create_router};
pub use types::*;

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

use crate::adapter::ProviderRegistry;
use crate::error::ProviderError;

/// Shared application state.
pub struct AppState {
    pub registry: ProviderRegistry,
}

/// API error response.
#[derive(Serialize, ToSchema)]
pub struct ApiError {
    pub error: String,
    pub code: u32,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.code {
            400 => StatusCode::BAD_REQUEST,
            404 => StatusCode::NOT_FOUND,
            409 => StatusCode::CONFLICT,
            502 => StatusCode::BAD_GATEWAY,
            504 => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        let code = match &e {
            ProviderError::Decode(_) | ProviderError::Name(_) => 400,
            ProviderError::NotFound(_) => 404,
            ProviderError::Conflict(_) => 409,
            ProviderError::Remote(_) => 502,
            ProviderError::Convergence { .. } => 504,
            ProviderError::Contract(_) | ProviderError::Internal(_) => 500,
        };
        ApiError {
            error: e.to_string(),
            code,
        }
    }
}

impl ApiError {
    /// A request named a kind no provider is registered for. Upstream is
    /// expected to only dispatch known kinds, so this is a contract
    /// violation rather than a user error.
    fn unknown_kind(token: &str) -> Self {
        ApiError {
            error: format!("no provider registered for kind '{token}'"),
            code: 500,
        }
    }
}
