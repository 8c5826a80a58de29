// src/services/report_service.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::LedgerStore,
    models::inventory::{MovementStats, StockValueReport},
};

// Relatórios agregados. Leitura pura: o banco faz a conta.
#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn LedgerStore>,
}

impl ReportService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Valor total do estoque (preço de venda e de custo), opcionalmente
    /// restrito a um local.
    pub async fn stock_value(
        &self,
        location_id: Option<Uuid>,
    ) -> Result<StockValueReport, AppError> {
        self.store.total_value(location_id).await
    }

    /// Contagens e somas das movimentações no período.
    pub async fn movements_summary(
        &self,
        location_id: Option<Uuid>,
        date_from: Option<DateTime<Utc>>,
        date_to: Option<DateTime<Utc>>,
    ) -> Result<MovementStats, AppError> {
        self.store.movement_stats(location_id, date_from, date_to).await
    }
}
