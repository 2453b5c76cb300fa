use super::table::ROUTES;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RouteDescription {
    path: &'static str,
    methods: Vec<&'static str>,
    description: &'static str,
}

/// Lists every proxied vendor endpoint.
pub async fn index_handler() -> Json<Vec<RouteDescription>> {
    Json(
        ROUTES
            .iter()
            .map(|route| RouteDescription {
                path: route.path,
                methods: route.methods.iter().map(|verb| verb.as_str()).collect(),
                description: route.description,
            })
            .collect(),
    )
}
