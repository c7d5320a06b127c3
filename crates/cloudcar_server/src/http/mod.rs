//! Router assembly and cross-cutting layers.
//!
//! # Responsibility
//! - Map each REST route to one handler.
//! - Restrict browser access to the configured frontend origin.
//! - Log every request with method, path, status and duration.

mod customers;
mod financing;
mod sales;
mod test_drives;

use crate::store::Store;
use axum::extract::Request;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use log::info;
use serde_json::json;
use std::time::Instant;
use tower_http::cors::CorsLayer;

/// Builds the API router over `store`.
pub fn build_router(store: Store, allowed_origin: HeaderValue) -> Router {
    Router::new()
        .route("/", get(health))
        .route(
            "/api/clientes",
            get(customers::list).post(customers::create),
        )
        .route(
            "/api/clientes/buscar-ou-criar",
            post(customers::find_or_create),
        )
        .route(
            "/api/clientes/:id",
            get(customers::get)
                .put(customers::update)
                .delete(customers::remove),
        )
        .route(
            "/api/testdrives",
            get(test_drives::list).post(test_drives::create),
        )
        .route(
            "/api/financiamentos",
            get(financing::list).post(financing::create),
        )
        .route("/api/financiamentos/:id", delete(financing::remove))
        .route("/api/vendas", get(sales::list).post(sales::create))
        .fallback(route_not_found)
        .with_state(store)
        .layer(middleware::from_fn(log_request))
        .layer(cors_layer(allowed_origin))
}

fn cors_layer(allowed_origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

async fn health() -> &'static str {
    "CloudCar API is running"
}

async fn route_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "erro": "route not found" })),
    )
        .into_response()
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started_at = Instant::now();

    let response = next.run(request).await;
    info!(
        "event=http_request module=server method={} path={} status={} duration_ms={}",
        method,
        path,
        response.status().as_u16(),
        started_at.elapsed().as_millis()
    );
    response
}
