// src/services/catalog_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::LedgerStore,
    models::{
        catalog::{Location, NewLocation, NewProduct, Product, ProductFilter, ProductUpdate},
        page::Page,
    },
};

// Cadastro de produtos e locais. CRUD simples; a parte interessante do
// domínio mora no LedgerService.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn LedgerStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    // --- Produtos ---

    pub async fn create_product(&self, data: NewProduct) -> Result<Product, AppError> {
        // Checagem amigável antes do insert; a constraint UNIQUE no banco
        // continua sendo a palavra final.
        if self.store.find_product_by_sku(&data.sku).await?.is_some() {
            return Err(AppError::SkuAlreadyExists);
        }
        self.store.create_product(data).await
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product, AppError> {
        self.store
            .find_product(id)
            .await?
            .ok_or(AppError::ProductNotFound)
    }

    pub async fn list_products(&self, filter: ProductFilter) -> Result<Page<Product>, AppError> {
        self.store.list_products(filter).await
    }

    pub async fn update_product(
        &self,
        id: Uuid,
        changes: ProductUpdate,
    ) -> Result<Product, AppError> {
        self.store
            .update_product(id, changes)
            .await?
            .ok_or(AppError::ProductNotFound)
    }

    /// Desativação lógica: o produto some das listagens e recusa novas
    /// movimentações, mas o histórico e os saldos existentes ficam.
    pub async fn deactivate_product(&self, id: Uuid) -> Result<(), AppError> {
        if !self.store.deactivate_product(id).await? {
            return Err(AppError::ProductNotFound);
        }
        Ok(())
    }

    // --- Locais ---

    pub async fn create_location(&self, data: NewLocation) -> Result<Location, AppError> {
        self.store.create_location(data).await
    }

    pub async fn get_location(&self, id: Uuid) -> Result<Location, AppError> {
        self.store
            .find_location(id)
            .await?
            .ok_or(AppError::LocationNotFound)
    }

    pub async fn list_locations(&self) -> Result<Vec<Location>, AppError> {
        self.store.list_locations().await
    }
}
