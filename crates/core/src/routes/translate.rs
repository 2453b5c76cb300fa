use super::{
    HandlerError, error_response,
    table::{ResponseEntry, RouteSpec},
};
use axum::{
    Json,
    body::Bytes,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use mime::APPLICATION_JSON;
use serde::de::IgnoredAny;
use tracing::{debug, warn};

/// Body sent for vendor status codes a route does not declare.
pub const UNKNOWN_RESPONSE: &str = "Unknown response code.";

/// Turn a vendor response into the response declared by the route.
///
/// The vendor's status code is always kept.
pub fn translate(
    route: &RouteSpec,
    status: StatusCode,
    body: Bytes,
) -> Result<Response, HandlerError> {
    match route.response_for(status.as_u16()) {
        Some(ResponseEntry::PassThrough) => {
            if body.is_empty() {
                return Ok(status.into_response());
            }
            if let Err(err) = serde_json::from_slice::<IgnoredAny>(&body) {
                warn!("Vendor sent a non-JSON body for {} ({status}): {err}", route.path);
                return Err(error_response(
                    StatusCode::BAD_GATEWAY,
                    "Upstream server responded with a body that is not valid JSON.",
                ));
            }
            Ok((
                status,
                [(header::CONTENT_TYPE, APPLICATION_JSON.essence_str())],
                body,
            )
                .into_response())
        }
        Some(ResponseEntry::Message(message)) => Ok((status, Json(message)).into_response()),
        None => {
            debug!("{} has no declared response for {status}", route.path);
            Ok((status, Json(UNKNOWN_RESPONSE)).into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forwarder::VendorApi;
    use crate::routes::table::{Credential, Verb};
    use http_body_util::BodyExt;

    static ROUTE: RouteSpec = RouteSpec {
        path: "/storagezone",
        methods: &[Verb::Post],
        description: "Add Storage Zone",
        api: VendorApi::Account,
        upstream: "storagezone",
        credential: Credential::Account,
        responses: &[
            (200, ResponseEntry::PassThrough),
            (400, ResponseEntry::PassThrough),
            (401, ResponseEntry::Message("The request authorization failed")),
        ],
    };

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn passes_vendor_json_through_verbatim() {
        let body = Bytes::from_static(br#"{"Id": 7, "Name":"zone"}"#);
        let response = translate(&ROUTE, StatusCode::BAD_REQUEST, body.clone()).unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(body_string(response).await, r#"{"Id": 7, "Name":"zone"}"#);
    }

    #[tokio::test]
    async fn replaces_body_with_declared_message() {
        let response = translate(
            &ROUTE,
            StatusCode::UNAUTHORIZED,
            Bytes::from_static(br#"{"Message":"nope"}"#),
        )
        .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_string(response).await,
            r#""The request authorization failed""#
        );
    }

    #[tokio::test]
    async fn undeclared_status_keeps_code() {
        let response = translate(&ROUTE, StatusCode::IM_A_TEAPOT, Bytes::new()).unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(body_string(response).await, r#""Unknown response code.""#);
    }

    #[tokio::test]
    async fn empty_pass_through_body_stays_empty() {
        let response = translate(&ROUTE, StatusCode::OK, Bytes::new()).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.is_empty());
    }

    #[test]
    fn non_json_pass_through_is_bad_gateway() {
        let (status, _) =
            translate(&ROUTE, StatusCode::OK, Bytes::from_static(b"<html>")).unwrap_err();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
