//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for Fitlog.
//! It includes:
//! - Auth endpoints (register, login, refresh, current user)
//! - Exercise catalog endpoints
//! - Workout and workout entry endpoints
//! - Statistics endpoint
//! - Health check

pub mod auth;
pub mod entries;
pub mod exercises;
pub mod health;
pub mod middleware;
pub mod stats;
pub mod workouts;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware, Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState, AuthenticatedUser, ResourceId, ValidatedJson};

/// Build the API router (mounted under `/api`)
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Protected routes (need a valid access token)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .merge(exercises::protected_router())
        .merge(workouts::router())
        .merge(entries::router())
        .merge(stats::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .nest("/auth", auth::public_router())
        .merge(exercises::public_router())
        .merge(health::router())
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let origin = if cors_origin == "*" {
        AllowOrigin::any()
    } else {
        match cors_origin.parse::<HeaderValue>() {
            Ok(origin) => AllowOrigin::exact(origin),
            Err(e) => {
                tracing::warn!("Invalid CORS origin '{}' ({}), allowing any origin", cors_origin, e);
                AllowOrigin::any()
            }
        }
    };

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .nest("/api", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
