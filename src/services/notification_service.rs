// src/services/notification_service.rs

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{catalog::Product, inventory::StockLevel},
};

// --- Alerta de estoque baixo / zerado ---
// Carrega os dados do produto junto, para o canal de entrega não precisar
// consultar o banco de novo.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LowStockAlert {
    pub product_id: Uuid,
    pub product_sku: String,
    pub product_name: String,
    pub location_id: Uuid,
    pub quantity: i64,
    pub min_stock_level: i64,
    pub out_of_stock: bool,
}

// O canal de entrega é um trait injetado: em produção é o log estruturado,
// nos testes é um coletor em memória. E-mail/webhook entrariam aqui.
#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    async fn dispatch(&self, alert: LowStockAlert) -> Result<(), AppError>;
}

// Canal padrão: só registra no log.
pub struct LogDispatcher;

#[async_trait]
impl AlertDispatcher for LogDispatcher {
    async fn dispatch(&self, alert: LowStockAlert) -> Result<(), AppError> {
        if alert.out_of_stock {
            tracing::warn!(
                "⚠️ Estoque ZERADO: {} ({}) no local {}",
                alert.product_name,
                alert.product_sku,
                alert.location_id
            );
        } else {
            tracing::warn!(
                "⚠️ Estoque baixo: {} ({}) no local {}: {} unidades (mínimo {})",
                alert.product_name,
                alert.product_sku,
                alert.location_id,
                alert.quantity,
                alert.min_stock_level
            );
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct NotificationService {
    dispatcher: Arc<dyn AlertDispatcher>,
}

impl NotificationService {
    pub fn new(dispatcher: Arc<dyn AlertDispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn log_only() -> Self {
        Self::new(Arc::new(LogDispatcher))
    }

    /// Avalia o saldo DEPOIS do commit. O alerta nunca segura nem desfaz a
    /// movimentação: o envio roda numa task separada e falha de envio só
    /// aparece no log.
    pub fn notify_level(&self, product: &Product, level: &StockLevel) {
        let alert = if level.quantity == 0 {
            LowStockAlert {
                product_id: product.id,
                product_sku: product.sku.clone(),
                product_name: product.name.clone(),
                location_id: level.location_id,
                quantity: 0,
                min_stock_level: level.min_stock_level,
                out_of_stock: true,
            }
        } else if level.quantity <= level.min_stock_level {
            LowStockAlert {
                product_id: product.id,
                product_sku: product.sku.clone(),
                product_name: product.name.clone(),
                location_id: level.location_id,
                quantity: level.quantity,
                min_stock_level: level.min_stock_level,
                out_of_stock: false,
            }
        } else {
            return;
        };

        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move {
            if let Err(e) = dispatcher.dispatch(alert).await {
                tracing::error!("Falha ao enviar alerta de estoque: {}", e);
            }
        });
    }
}
