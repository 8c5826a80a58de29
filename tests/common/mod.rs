// tests/common/mod.rs

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use uuid::Uuid;

use estoque_api::{
    common::error::AppError,
    config::AppState,
    db::{LedgerStore, MemLedgerStore},
    models::catalog::{Location, NewLocation, NewProduct, Product},
    services::notification_service::{AlertDispatcher, LowStockAlert, NotificationService},
};

pub const TEST_JWT_SECRET: &str = "segredo-de-teste";

/// Estado completo em cima do armazenamento em memória.
pub fn test_state() -> (AppState, Arc<MemLedgerStore>) {
    let store = Arc::new(MemLedgerStore::new());
    let state = AppState::with_store(store.clone(), TEST_JWT_SECRET.to_string());
    (state, store)
}

/// Igual ao `test_state`, mas com os alertas indo para um canal que o teste
/// pode inspecionar.
pub fn test_state_with_alerts() -> (AppState, Arc<MemLedgerStore>, mpsc::UnboundedReceiver<LowStockAlert>) {
    let store = Arc::new(MemLedgerStore::new());
    let (dispatcher, rx) = ChannelDispatcher::new();
    let state = AppState::with_notifications(
        store.clone(),
        TEST_JWT_SECRET.to_string(),
        NotificationService::new(Arc::new(dispatcher)),
    );
    (state, store, rx)
}

// Coletor de alertas para os testes.
pub struct ChannelDispatcher {
    tx: mpsc::UnboundedSender<LowStockAlert>,
}

impl ChannelDispatcher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LowStockAlert>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl AlertDispatcher for ChannelDispatcher {
    async fn dispatch(&self, alert: LowStockAlert) -> Result<(), AppError> {
        let _ = self.tx.send(alert);
        Ok(())
    }
}

pub async fn seed_product(store: &dyn LedgerStore, sku: &str, min_stock_level: i64) -> Product {
    store
        .create_product(NewProduct {
            sku: sku.to_string(),
            name: format!("Produto {sku}"),
            description: None,
            unit_price: Decimal::new(1000, 2), // 10.00
            cost_price: Decimal::new(600, 2),  // 6.00
            min_stock_level,
            max_stock_level: None,
        })
        .await
        .expect("falha ao criar produto de teste")
}

pub async fn seed_location(store: &dyn LedgerStore, code: &str) -> Location {
    store
        .create_location(NewLocation {
            code: code.to_string(),
            name: format!("Local {code}"),
        })
        .await
        .expect("falha ao criar local de teste")
}

pub async fn seed_user(store: &dyn LedgerStore, email: &str) -> Uuid {
    store
        .create_user(email, "$2b$12$hashfalsoapenasparateste")
        .await
        .expect("falha ao criar usuário de teste")
        .id
}
