// src/lib.rs

// Declaração dos nossos módulos
pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppState;
use crate::middleware::auth::auth_guard;

/// Monta o router completo da API em cima de um `AppState` pronto.
/// O binário e os testes de integração usam exatamente a mesma função.
pub fn api_router(app_state: AppState) -> Router {
    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Rotas de usuário (protegidas pelo middleware)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let product_routes = Router::new()
        .route(
            "/",
            post(handlers::products::create_product).get(handlers::products::list_products),
        )
        .route(
            "/{id}",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::deactivate_product),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let location_routes = Router::new()
        .route(
            "/",
            post(handlers::products::create_location).get(handlers::products::list_locations),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let inventory_routes = Router::new()
        .route("/stock", get(handlers::inventory::get_stock))
        .route(
            "/movements",
            post(handlers::inventory::create_movement).get(handlers::inventory::list_movements),
        )
        .route("/adjust", post(handlers::inventory::adjust_stock))
        .route("/transfer", post(handlers::inventory::transfer_stock))
        .route(
            "/alerts/low-stock",
            get(handlers::inventory::low_stock_alerts),
        )
        .route(
            "/alerts/out-of-stock",
            get(handlers::inventory::out_of_stock_alerts),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let report_routes = Router::new()
        .route("/stock-value", get(handlers::reports::stock_value))
        .route(
            "/movements-summary",
            get(handlers::reports::movements_summary),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
        )
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/products", product_routes)
        .nest("/api/locations", location_routes)
        .nest("/api/inventory", inventory_routes)
        .nest("/api/reports", report_routes)
        .with_state(app_state)
}
