mod forward;
mod health;
mod index;
mod signature;
mod table;
mod translate;

pub use health::*;
pub use index::*;
pub use signature::*;

use crate::{AppState, forwarder::ForwardError};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{Method, StatusCode},
    routing::{MethodRouter, on},
};
use std::{collections::BTreeMap, collections::HashMap, sync::Arc};
use table::ROUTES;
use tracing::{debug, error, warn};

#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    message: &'static str,
}

pub type HandlerError = (StatusCode, Json<ErrorResponse>);

fn error_response(status: StatusCode, message: &'static str) -> HandlerError {
    (status, Json(ErrorResponse { message }))
}

fn upstream_error(err: ForwardError) -> HandlerError {
    match err {
        ForwardError::Send(err) => {
            warn!("Failed to make request to upstream server: {err}");
            error_response(
                StatusCode::BAD_GATEWAY,
                "Failed to send request to upstream server.",
            )
        }
        ForwardError::DotSegment(param) => {
            debug!("Rejecting dot segment in path parameter '{param}'");
            error_response(
                StatusCode::BAD_REQUEST,
                "Path parameters cannot be '.' or '..'.",
            )
        }
        err @ (ForwardError::MissingParam(_) | ForwardError::CannotBeABase(_)) => {
            error!("Unable to build upstream request: {err}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "The proxy is unable to build a request for this route.",
            )
        }
    }
}

/// Router with one route per entry of the vendor route table.
pub fn vendor_routes() -> Router<Arc<AppState>> {
    let mut method_routers: BTreeMap<&'static str, MethodRouter<Arc<AppState>>> = BTreeMap::new();
    for route in ROUTES {
        let Some(filter) = route.method_filter() else {
            continue;
        };
        let method_router = if route.has_captures() {
            on(
                filter,
                move |State(state): State<Arc<AppState>>,
                      Path(params): Path<HashMap<String, String>>,
                      method: Method,
                      RawQuery(query): RawQuery,
                      body: Bytes| {
                    forward::forward_handler(route, state, params, method, query, body)
                },
            )
        } else {
            on(
                filter,
                move |State(state): State<Arc<AppState>>,
                      method: Method,
                      RawQuery(query): RawQuery,
                      body: Bytes| {
                    forward::forward_handler(route, state, HashMap::new(), method, query, body)
                },
            )
        };
        let merged = match method_routers.remove(route.path) {
            Some(existing) => existing.merge(method_router),
            None => method_router,
        };
        method_routers.insert(route.path, merged);
    }

    method_routers
        .into_iter()
        .fold(Router::new(), |router, (path, method_router)| {
            router.route(path, method_router)
        })
}
