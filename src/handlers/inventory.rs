// src/handlers/inventory.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::inventory::{
        Movement, MovementFilter, MovementKind, StockFilter, StockLevel, StockOverview,
    },
    models::page::Page,
};

// ---
// Payload: movimentação simples (entrada ou saída)
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMovementPayload {
    pub product_id: Uuid,
    pub location_id: Uuid,

    // Só IN e OUT entram por aqui; o service recusa os outros tipos.
    #[serde(rename = "type")]
    pub kind: MovementKind,

    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: i64,

    pub notes: Option<String>,
}

// ---
// Payload: ajuste por contagem física
// ---
// `quantity` é a quantidade FINAL contada, não um delta.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockPayload {
    pub product_id: Uuid,
    pub location_id: Uuid,

    #[validate(range(min = 0, message = "A quantidade final não pode ser negativa."))]
    pub quantity: i64,

    pub notes: Option<String>,
}

// ---
// Payload: transferência entre locais
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferStockPayload {
    pub product_id: Uuid,
    pub source_location_id: Uuid,
    pub destination_location_id: Uuid,

    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: i64,

    pub notes: Option<String>,
}

// Filtro das rotas de alerta.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct AlertFilter {
    pub location_id: Option<Uuid>,
}

// ---
// Respostas
// ---
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovementResponse {
    pub movement: Movement,
    pub stock_level: StockLevel,
}

// O ajuste pode não gerar movimentação (contagem bateu com o sistema).
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustResponse {
    pub movement: Option<Movement>,
    pub stock_level: StockLevel,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub outbound: Movement,
    pub inbound: Movement,
    pub source_level: StockLevel,
    pub destination_level: StockLevel,
}

// ---
// Handler: consulta de saldos
// ---
#[utoipa::path(
    get,
    path = "/api/inventory/stock",
    tag = "Inventory",
    security(("api_jwt" = [])),
    params(StockFilter),
    responses(
        (status = 200, description = "Saldos por produto e local", body = [StockOverview]),
    )
)]
pub async fn get_stock(
    State(app_state): State<AppState>,
    Query(filter): Query<StockFilter>,
) -> Result<Json<Vec<StockOverview>>, AppError> {
    let stock = app_state.ledger_service.list_stock(filter).await?;
    Ok(Json(stock))
}

// ---
// Handler: histórico de movimentações (paginado)
// ---
#[utoipa::path(
    get,
    path = "/api/inventory/movements",
    tag = "Inventory",
    security(("api_jwt" = [])),
    params(MovementFilter),
    responses(
        (status = 200, description = "Histórico, mais recentes primeiro", body = Page<Movement>),
    )
)]
pub async fn list_movements(
    State(app_state): State<AppState>,
    Query(filter): Query<MovementFilter>,
) -> Result<Json<Page<Movement>>, AppError> {
    let page = app_state.ledger_service.list_movements(filter).await?;
    Ok(Json(page))
}

// ---
// Handler: registrar entrada/saída
// ---
#[utoipa::path(
    post,
    path = "/api/inventory/movements",
    tag = "Inventory",
    security(("api_jwt" = [])),
    request_body = CreateMovementPayload,
    responses(
        (status = 201, description = "Movimentação registrada", body = MovementResponse),
        (status = 400, description = "Payload ou tipo de movimentação inválido"),
        (status = 404, description = "Produto ou local não encontrado"),
        (status = 409, description = "Estoque insuficiente"),
    )
)]
pub async fn create_movement(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateMovementPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let (movement, stock_level) = app_state
        .ledger_service
        .record_movement(
            user.id,
            payload.product_id,
            payload.location_id,
            payload.kind,
            payload.quantity,
            payload.notes,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MovementResponse {
            movement,
            stock_level,
        }),
    ))
}

// ---
// Handler: ajuste de contagem
// ---
#[utoipa::path(
    post,
    path = "/api/inventory/adjust",
    tag = "Inventory",
    security(("api_jwt" = [])),
    request_body = AdjustStockPayload,
    responses(
        (status = 200, description = "Saldo ajustado para a quantidade contada", body = AdjustResponse),
        (status = 400, description = "Payload inválido"),
        (status = 404, description = "Produto ou local não encontrado"),
    )
)]
pub async fn adjust_stock(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<AdjustStockPayload>,
) -> Result<Json<AdjustResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let (movement, stock_level) = app_state
        .ledger_service
        .adjust_stock(
            user.id,
            payload.product_id,
            payload.location_id,
            payload.quantity,
            payload.notes,
        )
        .await?;

    Ok(Json(AdjustResponse {
        movement,
        stock_level,
    }))
}

// ---
// Handler: transferência entre locais
// ---
#[utoipa::path(
    post,
    path = "/api/inventory/transfer",
    tag = "Inventory",
    security(("api_jwt" = [])),
    request_body = TransferStockPayload,
    responses(
        (status = 201, description = "Transferência registrada (duas pernas)", body = TransferResponse),
        (status = 400, description = "Payload inválido ou locais iguais"),
        (status = 404, description = "Produto ou local não encontrado"),
        (status = 409, description = "Estoque insuficiente na origem"),
    )
)]
pub async fn transfer_stock(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<TransferStockPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let outcome = app_state
        .ledger_service
        .transfer_stock(
            user.id,
            payload.product_id,
            payload.source_location_id,
            payload.destination_location_id,
            payload.quantity,
            payload.notes,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TransferResponse {
            outbound: outcome.outbound,
            inbound: outcome.inbound,
            source_level: outcome.source_level,
            destination_level: outcome.destination_level,
        }),
    ))
}

// ---
// Handler: alertas de estoque baixo
// ---
#[utoipa::path(
    get,
    path = "/api/inventory/alerts/low-stock",
    tag = "Inventory",
    security(("api_jwt" = [])),
    params(AlertFilter),
    responses(
        (status = 200, description = "Saldos no mínimo ou abaixo, mais críticos primeiro", body = [StockOverview]),
    )
)]
pub async fn low_stock_alerts(
    State(app_state): State<AppState>,
    Query(filter): Query<AlertFilter>,
) -> Result<Json<Vec<StockOverview>>, AppError> {
    let alerts = app_state.ledger_service.low_stock(filter.location_id).await?;
    Ok(Json(alerts))
}

// ---
// Handler: alertas de estoque zerado
// ---
#[utoipa::path(
    get,
    path = "/api/inventory/alerts/out-of-stock",
    tag = "Inventory",
    security(("api_jwt" = [])),
    params(AlertFilter),
    responses(
        (status = 200, description = "Pares rastreados com saldo zero", body = [StockOverview]),
    )
)]
pub async fn out_of_stock_alerts(
    State(app_state): State<AppState>,
    Query(filter): Query<AlertFilter>,
) -> Result<Json<Vec<StockOverview>>, AppError> {
    let alerts = app_state
        .ledger_service
        .out_of_stock(filter.location_id)
        .await?;
    Ok(Json(alerts))
}
