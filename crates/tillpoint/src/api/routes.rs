//! API route definitions.

use axum::http::{HeaderValue, Method, header};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::auth::{AnyStaff, OwnerOnly, auth_middleware, require_policy};

use super::handlers;
use super::state::AppState;

/// Create the application router.
///
/// Public: `/health`, `/auth/login`. Everything else sits behind the bearer
/// token gate; sale orders additionally require `AnyStaff`, cashier
/// management `OwnerOnly`.
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.allowed_origins);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG));

    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/login", post(handlers::login))
        .with_state(state.clone());

    let sale_order_routes = Router::new()
        .route(
            "/sale-orders",
            get(handlers::list_sale_orders).post(handlers::create_sale_order),
        )
        .route(
            "/sale-orders/{id}",
            get(handlers::get_sale_order)
                .patch(handlers::update_sale_order)
                .delete(handlers::delete_sale_order),
        )
        .route_layer(middleware::from_fn(require_policy::<AnyStaff>));

    let cashier_routes = Router::new()
        .route(
            "/users/cashier",
            get(handlers::list_cashiers).post(handlers::create_cashier),
        )
        .route(
            "/users/cashier/{id}",
            get(handlers::get_cashier)
                .patch(handlers::update_cashier)
                .delete(handlers::delete_cashier),
        )
        .route_layer(middleware::from_fn(require_policy::<OwnerOnly>));

    // Role layers above run after the gate, which wraps the whole group.
    let protected_routes = Router::new()
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/me", get(handlers::me))
        .merge(sale_order_routes)
        .merge(cashier_routes)
        .route_layer(middleware::from_fn_with_state(auth_state, auth_middleware))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(cors)
        .layer(trace_layer)
}

/// Build the CORS layer. No configured origins means any origin.
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let headers = [header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT];

    if allowed_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(AllowOrigin::any())
            .allow_methods(methods)
            .allow_headers(headers);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("CORS: Invalid origin in config: {}", origin);
                None
            })
        })
        .collect();

    if origins.is_empty() {
        tracing::error!("CORS: All configured origins are invalid!");
        return CorsLayer::new().allow_origin(AllowOrigin::exact(HeaderValue::from_static("null")));
    }

    tracing::info!("CORS: Allowing {} origin(s)", origins.len());
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
}
