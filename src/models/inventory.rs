// src/models/inventory.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- 1. Tipo de Movimentação ---
// O tipo diferencia as duas pernas de uma transferência.
// ADJUSTMENT é sempre gravado com a magnitude; a direção vai no campo `direction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "movement_kind", rename_all = "SCREAMING_SNAKE_CASE")] // Banco
#[serde(rename_all = "SCREAMING_SNAKE_CASE")] // JSON
pub enum MovementKind {
    In,          // Vira "IN"
    Out,         // Vira "OUT"
    TransferIn,  // Vira "TRANSFER_IN"
    TransferOut, // Vira "TRANSFER_OUT"
    Adjustment,  // Vira "ADJUSTMENT"
}

impl MovementKind {
    /// Entradas somam ao saldo; saídas subtraem.
    pub fn is_inbound(&self) -> bool {
        matches!(self, MovementKind::In | MovementKind::TransferIn)
    }

    pub fn is_outbound(&self) -> bool {
        matches!(self, MovementKind::Out | MovementKind::TransferOut)
    }
}

// Direção de um ajuste (IN = saldo subiu, OUT = saldo desceu).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "movement_direction", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementDirection {
    In,
    Out,
}

// --- 2. Saldo de Estoque ---
// Uma linha por par (produto, local). Criada na primeira entrada e nunca
// apagada: saldo zero continua sendo uma linha válida ("rastreado, mas vazio").
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub id: Uuid,
    pub product_id: Uuid,
    pub location_id: Uuid,

    pub quantity: i64, // Sempre >= 0. Nada de clamp: saída sem saldo é erro.

    pub min_stock_level: i64,
    pub max_stock_level: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

// Resultado do "find or create" dentro da transação.
// O chamador consegue distinguir primeira-criação de atualização.
#[derive(Debug, Clone)]
pub enum LevelLookup {
    Found(StockLevel),
    Created(StockLevel),
}

impl LevelLookup {
    pub fn into_inner(self) -> StockLevel {
        match self {
            LevelLookup::Found(level) | LevelLookup::Created(level) => level,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, LevelLookup::Created(_))
    }
}

// --- 3. Movimentação (Histórico) ---
// Livro-razão imutável: uma linha por evento aceito, nunca alterada.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub id: Uuid,
    pub product_id: Uuid,
    pub location_id: Uuid,
    pub kind: MovementKind,
    pub quantity: i64, // Magnitude, sempre > 0 no banco
    pub direction: Option<MovementDirection>,
    pub notes: Option<String>,
    pub user_id: Uuid,
    pub source_location_id: Option<Uuid>,
    pub destination_location_id: Option<Uuid>,
    pub reference_movement_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// Dados de inserção (ainda sem id/created_at, que o armazenamento gera).
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub product_id: Uuid,
    pub location_id: Uuid,
    pub kind: MovementKind,
    pub quantity: i64,
    pub direction: Option<MovementDirection>,
    pub notes: Option<String>,
    pub user_id: Uuid,
    pub source_location_id: Option<Uuid>,
    pub destination_location_id: Option<Uuid>,
    pub reference_movement_id: Option<Uuid>,
}

// --- 4. Visão de Estoque (com dados do catálogo) ---
// Usada nas listagens e nos alertas, espelhando o join saldo + produto + local.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockOverview {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_sku: String,
    pub location_id: Uuid,
    pub location_name: String,
    pub quantity: i64,
    pub min_stock_level: i64,
    pub max_stock_level: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

// --- 5. Filtros de consulta ---
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct StockFilter {
    pub product_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    #[serde(default)]
    pub low_stock: bool,
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct MovementFilter {
    pub product_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: Option<MovementKind>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

// --- 6. Relatórios ---
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockValueReport {
    pub total_value: rust_decimal::Decimal,
    pub total_cost: rust_decimal::Decimal,
    pub total_products: i64,
    pub total_quantity: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovementStats {
    pub total_movements: i64,
    pub inbound_movements: i64,
    pub outbound_movements: i64,
    pub adjustments: i64,
    pub total_inbound_quantity: i64,
    pub total_outbound_quantity: i64,
}
