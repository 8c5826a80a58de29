// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,

        // --- Catalog ---
        handlers::products::create_product,
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::update_product,
        handlers::products::deactivate_product,
        handlers::products::create_location,
        handlers::products::list_locations,

        // --- Inventory ---
        handlers::inventory::get_stock,
        handlers::inventory::list_movements,
        handlers::inventory::create_movement,
        handlers::inventory::adjust_stock,
        handlers::inventory::transfer_stock,
        handlers::inventory::low_stock_alerts,
        handlers::inventory::out_of_stock_alerts,

        // --- Reports ---
        handlers::reports::stock_value,
        handlers::reports::movements_summary,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Catalog ---
            models::catalog::Product,
            models::catalog::Location,
            handlers::products::CreateProductPayload,
            handlers::products::UpdateProductPayload,
            handlers::products::CreateLocationPayload,

            // --- Inventory ---
            models::inventory::MovementKind,
            models::inventory::MovementDirection,
            models::inventory::StockLevel,
            models::inventory::Movement,
            models::inventory::StockOverview,
            models::inventory::StockValueReport,
            models::inventory::MovementStats,
            handlers::inventory::CreateMovementPayload,
            handlers::inventory::AdjustStockPayload,
            handlers::inventory::TransferStockPayload,
            handlers::inventory::MovementResponse,
            handlers::inventory::AdjustResponse,
            handlers::inventory::TransferResponse,

            // --- Alertas ---
            services::notification_service::LowStockAlert,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "Catalog", description = "Cadastro de Produtos e Locais"),
        (name = "Inventory", description = "Livro-razão de Estoque e Alertas"),
        (name = "Reports", description = "Relatórios Agregados")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
