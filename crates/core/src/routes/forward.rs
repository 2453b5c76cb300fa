use super::{
    HandlerError, error_response,
    table::{Credential, RouteSpec},
    translate::translate,
    upstream_error,
};
use crate::{
    AppState,
    forwarder::{ForwardError, ForwardRequest, LIBRARY_ID_PARAM},
};
use axum::{
    body::Bytes,
    http::{Method, StatusCode},
    response::Response,
};
use serde::de::IgnoredAny;
use std::{collections::HashMap, sync::Arc};
use tracing::debug;

/// Forward a client request to the vendor endpoint described by `route`.
pub async fn forward_handler(
    route: &'static RouteSpec,
    state: Arc<AppState>,
    params: HashMap<String, String>,
    method: Method,
    query: Option<String>,
    body: Bytes,
) -> Result<Response, HandlerError> {
    if !body.is_empty() && serde_json::from_slice::<IgnoredAny>(&body).is_err() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "The request body must be valid JSON.",
        ));
    }

    let library_key;
    let access_key = match route.credential {
        Credential::Account => Some(state.forwarder.account_key()),
        Credential::Library => {
            let library_id = params.get(LIBRARY_ID_PARAM).ok_or_else(|| {
                upstream_error(ForwardError::MissingParam(LIBRARY_ID_PARAM.to_owned()))
            })?;
            library_key = state
                .forwarder
                .library_key(library_id)
                .await
                .map_err(upstream_error)?;
            if library_key.is_none() {
                debug!("No access key available for library {library_id}, forwarding without one");
            }
            library_key.as_deref()
        }
    };

    let upstream_response = state
        .forwarder
        .forward(ForwardRequest {
            api: route.api,
            method,
            upstream: route.upstream,
            params: &params,
            query: query.as_deref(),
            access_key,
            body,
        })
        .await
        .map_err(upstream_error)?;

    let status = upstream_response.status();
    let upstream_body = upstream_response
        .bytes()
        .await
        .map_err(|err| upstream_error(err.into()))?;

    translate(route, status, upstream_body)
}
