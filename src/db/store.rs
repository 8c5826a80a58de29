// src/db/store.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::User,
        catalog::{Location, NewLocation, NewProduct, Product, ProductFilter, ProductUpdate},
        inventory::{
            LevelLookup, Movement, MovementFilter, MovementStats, NewMovement, StockFilter,
            StockLevel, StockOverview, StockValueReport,
        },
        page::Page,
    },
};

// ---
// A "porta" de armazenamento do livro-razão
// ---
// O Ledger nunca fala com uma conexão global: ele recebe este trait injetado
// e abre uma transação explícita em volta de cada operação de múltiplos passos.
// Em produção a implementação é Postgres (`PgLedgerStore`); os testes e o modo
// de demonstração usam a versão em memória (`MemLedgerStore`).
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Abre a unidade de trabalho transacional. Tudo que mexe em saldo +
    /// histórico passa por aqui; largar a transação sem `commit` desfaz tudo.
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, AppError>;

    // --- Catálogo: produtos ---
    async fn create_product(&self, data: NewProduct) -> Result<Product, AppError>;
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, AppError>;
    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<Product>, AppError>;
    async fn list_products(&self, filter: ProductFilter) -> Result<Page<Product>, AppError>;
    async fn update_product(
        &self,
        id: Uuid,
        changes: ProductUpdate,
    ) -> Result<Option<Product>, AppError>;
    /// Desativação lógica (o produto some das listagens, o histórico fica).
    async fn deactivate_product(&self, id: Uuid) -> Result<bool, AppError>;

    // --- Catálogo: locais ---
    async fn create_location(&self, data: NewLocation) -> Result<Location, AppError>;
    async fn find_location(&self, id: Uuid) -> Result<Option<Location>, AppError>;
    async fn list_locations(&self) -> Result<Vec<Location>, AppError>;

    // --- Usuários ---
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    // --- Lado de leitura do estoque (fora de transação) ---
    async fn list_stock(&self, filter: StockFilter) -> Result<Vec<StockOverview>, AppError>;
    /// Saldos com `quantity <= min_stock_level`, mais críticos primeiro.
    async fn low_stock(&self, location_id: Option<Uuid>) -> Result<Vec<StockOverview>, AppError>;
    async fn out_of_stock(&self, location_id: Option<Uuid>)
    -> Result<Vec<StockOverview>, AppError>;
    async fn total_value(&self, location_id: Option<Uuid>) -> Result<StockValueReport, AppError>;
    async fn list_movements(&self, filter: MovementFilter) -> Result<Page<Movement>, AppError>;
    async fn movement_stats(
        &self,
        location_id: Option<Uuid>,
        date_from: Option<DateTime<Utc>>,
        date_to: Option<DateTime<Utc>>,
    ) -> Result<MovementStats, AppError>;
}

// ---
// A unidade de trabalho
// ---
// As leituras aqui dentro travam a linha (SELECT ... FOR UPDATE no Postgres;
// o guard do mutex na versão em memória), então a sequência
// ler-checar-escrever do Ledger é atômica em relação a outros escritores.
#[async_trait]
pub trait LedgerTx: Send {
    /// Lê o saldo do par (produto, local) já travado para escrita.
    async fn level_for_update(
        &mut self,
        product_id: Uuid,
        location_id: Uuid,
    ) -> Result<Option<StockLevel>, AppError>;

    /// Busca o saldo travado ou cria a linha zerada (semeada com os thresholds
    /// padrão do produto). O variant devolvido diz qual dos dois aconteceu.
    async fn find_or_create_level(
        &mut self,
        product_id: Uuid,
        location_id: Uuid,
        min_stock_level: i64,
        max_stock_level: Option<i64>,
    ) -> Result<LevelLookup, AppError>;

    /// Escreve a quantidade final (o Ledger já calculou o novo valor).
    async fn set_level_quantity(
        &mut self,
        level_id: Uuid,
        quantity: i64,
    ) -> Result<StockLevel, AppError>;

    /// Acrescenta uma linha ao histórico imutável.
    async fn insert_movement(&mut self, data: NewMovement) -> Result<Movement, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}
