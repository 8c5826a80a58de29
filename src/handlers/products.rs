// src/handlers/products.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        catalog::{Location, NewLocation, NewProduct, Product, ProductFilter, ProductUpdate},
        page::Page,
    },
};

// ---
// Validação Customizada
// ---
fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payload: CreateProduct
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, message = "O SKU é obrigatório."))]
    pub sku: String,

    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    pub description: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    pub unit_price: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)] // Se o JSON não tiver esse campo, assume 0
    pub cost_price: Decimal,

    // Threshold padrão para novos saldos deste produto.
    #[validate(range(min = 0, message = "O mínimo não pode ser negativo."))]
    #[serde(default)]
    pub min_stock_level: i64,

    #[validate(range(min = 0, message = "O máximo não pode ser negativo."))]
    pub max_stock_level: Option<i64>,
}

// ---
// Payload: UpdateProduct (SKU não muda depois de criado)
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    #[validate(length(min = 1, message = "O nome não pode ficar vazio."))]
    pub name: Option<String>,

    pub description: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    pub unit_price: Option<Decimal>,

    #[validate(custom(function = "validate_not_negative"))]
    pub cost_price: Option<Decimal>,

    #[validate(range(min = 0, message = "O mínimo não pode ser negativo."))]
    pub min_stock_level: Option<i64>,

    #[validate(range(min = 0, message = "O máximo não pode ser negativo."))]
    pub max_stock_level: Option<i64>,
}

// ---
// Payload: CreateLocation
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLocationPayload {
    #[validate(length(min = 1, message = "O código é obrigatório."))]
    pub code: String,

    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
}

// ---
// Handler: create_product
// ---
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Catalog",
    security(("api_jwt" = [])),
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 400, description = "Payload inválido"),
        (status = 409, description = "SKU já em uso"),
    )
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let product = app_state
        .catalog_service
        .create_product(NewProduct {
            sku: payload.sku,
            name: payload.name,
            description: payload.description,
            unit_price: payload.unit_price,
            cost_price: payload.cost_price,
            min_stock_level: payload.min_stock_level,
            max_stock_level: payload.max_stock_level,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

// ---
// Handler: list_products
// ---
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Catalog",
    security(("api_jwt" = [])),
    params(ProductFilter),
    responses(
        (status = 200, description = "Produtos paginados, mais recentes primeiro", body = Page<Product>),
    )
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Page<Product>>, AppError> {
    let page = app_state.catalog_service.list_products(filter).await?;
    Ok(Json(page))
}

// ---
// Handler: get_product
// ---
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Catalog",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto encontrado", body = Product),
        (status = 404, description = "Produto não encontrado"),
    )
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, AppError> {
    let product = app_state.catalog_service.get_product(id).await?;
    Ok(Json(product))
}

// ---
// Handler: update_product
// ---
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Catalog",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = UpdateProductPayload,
    responses(
        (status = 200, description = "Produto atualizado", body = Product),
        (status = 404, description = "Produto não encontrado"),
    )
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<Json<Product>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let product = app_state
        .catalog_service
        .update_product(
            id,
            ProductUpdate {
                name: payload.name,
                description: payload.description,
                unit_price: payload.unit_price,
                cost_price: payload.cost_price,
                min_stock_level: payload.min_stock_level,
                max_stock_level: payload.max_stock_level,
            },
        )
        .await?;

    Ok(Json(product))
}

// ---
// Handler: deactivate_product (soft delete)
// ---
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Catalog",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 204, description = "Produto desativado; histórico e saldos ficam"),
        (status = 404, description = "Produto não encontrado"),
    )
)]
pub async fn deactivate_product(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.catalog_service.deactivate_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---
// Handler: create_location
// ---
#[utoipa::path(
    post,
    path = "/api/locations",
    tag = "Catalog",
    security(("api_jwt" = [])),
    request_body = CreateLocationPayload,
    responses(
        (status = 201, description = "Local criado", body = Location),
        (status = 400, description = "Payload inválido"),
    )
)]
pub async fn create_location(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateLocationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let location = app_state
        .catalog_service
        .create_location(NewLocation {
            code: payload.code,
            name: payload.name,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(location)))
}

// ---
// Handler: list_locations
// ---
#[utoipa::path(
    get,
    path = "/api/locations",
    tag = "Catalog",
    security(("api_jwt" = [])),
    responses(
        (status = 200, description = "Todos os locais, por nome", body = [Location]),
    )
)]
pub async fn list_locations(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<Location>>, AppError> {
    let locations = app_state.catalog_service.list_locations().await?;
    Ok(Json(locations))
}
