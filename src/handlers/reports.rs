// src/handlers/reports.rs

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    models::inventory::{MovementStats, StockValueReport},
};

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct StockValueFilter {
    pub location_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct MovementSummaryFilter {
    pub location_id: Option<Uuid>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

// ---
// Handler: valor total do estoque
// ---
#[utoipa::path(
    get,
    path = "/api/reports/stock-value",
    tag = "Reports",
    security(("api_jwt" = [])),
    params(StockValueFilter),
    responses(
        (status = 200, description = "Valores agregados do estoque ativo", body = StockValueReport),
    )
)]
pub async fn stock_value(
    State(app_state): State<AppState>,
    Query(filter): Query<StockValueFilter>,
) -> Result<Json<StockValueReport>, AppError> {
    let report = app_state
        .report_service
        .stock_value(filter.location_id)
        .await?;
    Ok(Json(report))
}

// ---
// Handler: resumo das movimentações no período
// ---
#[utoipa::path(
    get,
    path = "/api/reports/movements-summary",
    tag = "Reports",
    security(("api_jwt" = [])),
    params(MovementSummaryFilter),
    responses(
        (status = 200, description = "Contagens e somas por tipo de movimentação", body = MovementStats),
    )
)]
pub async fn movements_summary(
    State(app_state): State<AppState>,
    Query(filter): Query<MovementSummaryFilter>,
) -> Result<Json<MovementStats>, AppError> {
    let stats = app_state
        .report_service
        .movements_summary(filter.location_id, filter.date_from, filter.date_to)
        .await?;
    Ok(Json(stats))
}
