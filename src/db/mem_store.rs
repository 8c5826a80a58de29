// src/db/mem_store.rs

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::{LedgerStore, LedgerTx},
    models::{
        auth::User,
        catalog::{Location, NewLocation, NewProduct, Product, ProductFilter, ProductUpdate},
        inventory::{
            LevelLookup, Movement, MovementFilter, MovementStats, NewMovement, StockFilter,
            StockLevel, StockOverview, StockValueReport,
        },
        page::{Page, Pagination, clamp_page_params},
    },
};

// ---
// Armazenamento em memória
// ---
// Usado pelos testes de integração e pelo modo de demonstração (sem Postgres).
// Um único mutex guarda o estado inteiro: `begin` segura o guard até o commit,
// então cada unidade de trabalho é serializada em relação às outras — a mesma
// garantia que o FOR UPDATE dá no Postgres, só que mais grossa.
#[derive(Debug, Default, Clone)]
struct MemState {
    products: HashMap<Uuid, Product>,
    locations: HashMap<Uuid, Location>,
    users: HashMap<Uuid, User>,
    // chave: (product_id, location_id)
    levels: HashMap<(Uuid, Uuid), StockLevel>,
    movements: Vec<Movement>,
}

#[derive(Clone, Default)]
pub struct MemLedgerStore {
    state: Arc<Mutex<MemState>>,
}

impl MemLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_search(product: &Product, search: &str) -> bool {
    let needle = search.to_lowercase();
    product.name.to_lowercase().contains(&needle)
        || product.sku.to_lowercase().contains(&needle)
        || product
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&needle))
}

fn overview(state: &MemState, level: &StockLevel) -> Option<StockOverview> {
    let product = state.products.get(&level.product_id)?;
    if !product.is_active {
        return None;
    }
    let location = state.locations.get(&level.location_id)?;
    Some(StockOverview {
        id: level.id,
        product_id: level.product_id,
        product_name: product.name.clone(),
        product_sku: product.sku.clone(),
        location_id: level.location_id,
        location_name: location.name.clone(),
        quantity: level.quantity,
        min_stock_level: level.min_stock_level,
        max_stock_level: level.max_stock_level,
        updated_at: level.updated_at,
    })
}

fn in_date_range(
    at: DateTime<Utc>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> bool {
    from.is_none_or(|f| at >= f) && to.is_none_or(|t| at <= t)
}

#[async_trait]
impl LedgerStore for MemLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, AppError> {
        let guard = self.state.clone().lock_owned().await;
        // As escritas acontecem numa cópia; o commit troca o estado inteiro.
        // Largar a transação sem commit descarta a cópia e nada muda.
        let work = guard.clone();
        Ok(Box::new(MemLedgerTx { guard, work }))
    }

    // --- Produtos ---

    async fn create_product(&self, data: NewProduct) -> Result<Product, AppError> {
        let mut state = self.state.lock().await;
        if state.products.values().any(|p| p.sku == data.sku) {
            return Err(AppError::SkuAlreadyExists);
        }
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            sku: data.sku,
            name: data.name,
            description: data.description,
            unit_price: data.unit_price,
            cost_price: data.cost_price,
            min_stock_level: data.min_stock_level,
            max_stock_level: data.max_stock_level,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        Ok(self.state.lock().await.products.get(&id).cloned())
    }

    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<Product>, AppError> {
        let state = self.state.lock().await;
        Ok(state.products.values().find(|p| p.sku == sku).cloned())
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Page<Product>, AppError> {
        let (page, limit) = clamp_page_params(filter.page, filter.limit, 10);
        let state = self.state.lock().await;

        let mut matched: Vec<Product> = state
            .products
            .values()
            .filter(|p| filter.is_active.is_none_or(|active| p.is_active == active))
            .filter(|p| {
                filter
                    .search
                    .as_deref()
                    .is_none_or(|search| matches_search(p, search))
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let pagination = Pagination::new(page, limit, matched.len() as u64);
        let data = matched
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(limit as usize)
            .collect();
        Ok(Page { data, pagination })
    }

    async fn update_product(
        &self,
        id: Uuid,
        changes: ProductUpdate,
    ) -> Result<Option<Product>, AppError> {
        let mut state = self.state.lock().await;
        let Some(product) = state.products.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            product.name = name;
        }
        if let Some(description) = changes.description {
            product.description = Some(description);
        }
        if let Some(unit_price) = changes.unit_price {
            product.unit_price = unit_price;
        }
        if let Some(cost_price) = changes.cost_price {
            product.cost_price = cost_price;
        }
        if let Some(min) = changes.min_stock_level {
            product.min_stock_level = min;
        }
        if let Some(max) = changes.max_stock_level {
            product.max_stock_level = Some(max);
        }
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn deactivate_product(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.lock().await;
        match state.products.get_mut(&id) {
            Some(product) if product.is_active => {
                product.is_active = false;
                product.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    // --- Locais ---

    async fn create_location(&self, data: NewLocation) -> Result<Location, AppError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let location = Location {
            id: Uuid::new_v4(),
            code: data.code,
            name: data.name,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn find_location(&self, id: Uuid) -> Result<Option<Location>, AppError> {
        Ok(self.state.lock().await.locations.get(&id).cloned())
    }

    async fn list_locations(&self) -> Result<Vec<Location>, AppError> {
        let state = self.state.lock().await;
        let mut locations: Vec<Location> = state.locations.values().cloned().collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }

    // --- Usuários ---

    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, AppError> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|u| u.email == email) {
            return Err(AppError::EmailAlreadyExists);
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_owned(),
            password_hash: password_hash.to_owned(),
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    // --- Lado de leitura do estoque ---

    async fn list_stock(&self, filter: StockFilter) -> Result<Vec<StockOverview>, AppError> {
        let state = self.state.lock().await;
        let mut rows: Vec<StockOverview> = state
            .levels
            .values()
            .filter(|l| filter.product_id.is_none_or(|p| l.product_id == p))
            .filter(|l| filter.location_id.is_none_or(|loc| l.location_id == loc))
            .filter(|l| !filter.low_stock || l.quantity <= l.min_stock_level)
            .filter_map(|l| overview(&state, l))
            .collect();
        rows.sort_by(|a, b| a.product_name.cmp(&b.product_name));
        Ok(rows)
    }

    async fn low_stock(&self, location_id: Option<Uuid>) -> Result<Vec<StockOverview>, AppError> {
        let state = self.state.lock().await;
        let mut rows: Vec<StockOverview> = state
            .levels
            .values()
            .filter(|l| l.quantity <= l.min_stock_level)
            .filter(|l| location_id.is_none_or(|loc| l.location_id == loc))
            .filter_map(|l| overview(&state, l))
            .collect();
        rows.sort_by_key(|row| row.quantity);
        Ok(rows)
    }

    async fn out_of_stock(
        &self,
        location_id: Option<Uuid>,
    ) -> Result<Vec<StockOverview>, AppError> {
        let state = self.state.lock().await;
        let mut rows: Vec<StockOverview> = state
            .levels
            .values()
            .filter(|l| l.quantity == 0)
            .filter(|l| location_id.is_none_or(|loc| l.location_id == loc))
            .filter_map(|l| overview(&state, l))
            .collect();
        rows.sort_by(|a, b| a.product_name.cmp(&b.product_name));
        Ok(rows)
    }

    async fn total_value(&self, location_id: Option<Uuid>) -> Result<StockValueReport, AppError> {
        let state = self.state.lock().await;
        let mut report = StockValueReport {
            total_value: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            total_products: 0,
            total_quantity: 0,
        };
        let mut seen_products = std::collections::HashSet::new();
        for level in state.levels.values() {
            if location_id.is_some_and(|loc| level.location_id != loc) {
                continue;
            }
            let Some(product) = state.products.get(&level.product_id) else {
                continue;
            };
            if !product.is_active {
                continue;
            }
            let quantity = Decimal::from(level.quantity);
            report.total_value += quantity * product.unit_price;
            report.total_cost += quantity * product.cost_price;
            report.total_quantity += level.quantity;
            seen_products.insert(level.product_id);
        }
        report.total_products = seen_products.len() as i64;
        Ok(report)
    }

    async fn list_movements(&self, filter: MovementFilter) -> Result<Page<Movement>, AppError> {
        let (page, limit) = clamp_page_params(filter.page, filter.limit, 20);
        let state = self.state.lock().await;

        // O vetor está em ordem de inserção; a listagem é sempre o mais
        // recente primeiro, como no relatório original.
        let matched: Vec<Movement> = state
            .movements
            .iter()
            .rev()
            .filter(|m| filter.product_id.is_none_or(|p| m.product_id == p))
            .filter(|m| filter.location_id.is_none_or(|loc| m.location_id == loc))
            .filter(|m| filter.kind.is_none_or(|kind| m.kind == kind))
            .filter(|m| in_date_range(m.created_at, filter.date_from, filter.date_to))
            .cloned()
            .collect();

        let pagination = Pagination::new(page, limit, matched.len() as u64);
        let data = matched
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(limit as usize)
            .collect();
        Ok(Page { data, pagination })
    }

    async fn movement_stats(
        &self,
        location_id: Option<Uuid>,
        date_from: Option<DateTime<Utc>>,
        date_to: Option<DateTime<Utc>>,
    ) -> Result<MovementStats, AppError> {
        let state = self.state.lock().await;
        let mut stats = MovementStats::default();
        for movement in state.movements.iter() {
            if location_id.is_some_and(|loc| movement.location_id != loc) {
                continue;
            }
            if !in_date_range(movement.created_at, date_from, date_to) {
                continue;
            }
            stats.total_movements += 1;
            if movement.kind.is_inbound() {
                stats.inbound_movements += 1;
                stats.total_inbound_quantity += movement.quantity;
            } else if movement.kind.is_outbound() {
                stats.outbound_movements += 1;
                stats.total_outbound_quantity += movement.quantity;
            } else {
                stats.adjustments += 1;
            }
        }
        Ok(stats)
    }
}

// ---
// A transação em memória
// ---
pub struct MemLedgerTx {
    guard: OwnedMutexGuard<MemState>,
    work: MemState,
}

#[async_trait]
impl LedgerTx for MemLedgerTx {
    async fn level_for_update(
        &mut self,
        product_id: Uuid,
        location_id: Uuid,
    ) -> Result<Option<StockLevel>, AppError> {
        Ok(self.work.levels.get(&(product_id, location_id)).cloned())
    }

    async fn find_or_create_level(
        &mut self,
        product_id: Uuid,
        location_id: Uuid,
        min_stock_level: i64,
        max_stock_level: Option<i64>,
    ) -> Result<LevelLookup, AppError> {
        if let Some(level) = self.work.levels.get(&(product_id, location_id)) {
            return Ok(LevelLookup::Found(level.clone()));
        }
        let level = StockLevel {
            id: Uuid::new_v4(),
            product_id,
            location_id,
            quantity: 0,
            min_stock_level,
            max_stock_level,
            updated_at: Utc::now(),
        };
        self.work
            .levels
            .insert((product_id, location_id), level.clone());
        Ok(LevelLookup::Created(level))
    }

    async fn set_level_quantity(
        &mut self,
        level_id: Uuid,
        quantity: i64,
    ) -> Result<StockLevel, AppError> {
        let level = self
            .work
            .levels
            .values_mut()
            .find(|l| l.id == level_id)
            .ok_or(AppError::StockLevelNotFound)?;
        level.quantity = quantity;
        level.updated_at = Utc::now();
        Ok(level.clone())
    }

    async fn insert_movement(&mut self, data: NewMovement) -> Result<Movement, AppError> {
        let movement = Movement {
            id: Uuid::new_v4(),
            product_id: data.product_id,
            location_id: data.location_id,
            kind: data.kind,
            quantity: data.quantity,
            direction: data.direction,
            notes: data.notes,
            user_id: data.user_id,
            source_location_id: data.source_location_id,
            destination_location_id: data.destination_location_id,
            reference_movement_id: data.reference_movement_id,
            created_at: Utc::now(),
        };
        self.work.movements.push(movement.clone());
        Ok(movement)
    }

    async fn commit(mut self: Box<Self>) -> Result<(), AppError> {
        *self.guard = self.work;
        Ok(())
    }
}
