use super::{HandlerError, error_response};
use crate::AppState;
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status code the vendor API root answered with.
    vendor_status: u16,
}

pub async fn health_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, HandlerError> {
    match state.forwarder.vendor_status().await {
        Ok(status) => Ok(Json(HealthResponse {
            vendor_status: status.as_u16(),
        })),
        Err(err) => {
            warn!("Vendor API is unreachable: {err}");
            Err(error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "Unable to reach the vendor API.",
            ))
        }
    }
}
