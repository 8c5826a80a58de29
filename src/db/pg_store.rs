// src/db/pg_store.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};
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

// Colunas na ordem das structs, para não depender de SELECT *.
const LEVEL_COLS: &str =
    "id, product_id, location_id, quantity, min_stock_level, max_stock_level, updated_at";
const MOVEMENT_COLS: &str = "id, product_id, location_id, kind, quantity, direction, notes, \
     user_id, source_location_id, destination_location_id, reference_movement_id, created_at";
const PRODUCT_COLS: &str = "id, sku, name, description, unit_price, cost_price, \
     min_stock_level, max_stock_level, is_active, created_at, updated_at";

// ---
// Tradução de erros do Postgres
// ---
// Conflito de serialização/deadlock vira `ConcurrencyConflict` (o chamador
// tenta de novo); violação de unicidade vira o conflito específico.
fn map_db_err(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if let Some(code) = db_err.code() {
            // 40001 = serialization_failure, 40P01 = deadlock_detected
            if code == "40001" || code == "40P01" {
                return AppError::ConcurrencyConflict;
            }
        }
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or_default();
            if constraint.contains("sku") {
                return AppError::SkuAlreadyExists;
            }
            if constraint.contains("email") {
                return AppError::EmailAlreadyExists;
            }
        }
    }
    AppError::DatabaseError(err)
}

#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, AppError> {
        let tx = self.pool.begin().await.map_err(map_db_err)?;
        Ok(Box::new(PgLedgerTx { tx }))
    }

    // --- Produtos ---

    async fn create_product(&self, data: NewProduct) -> Result<Product, AppError> {
        let sql = format!(
            "INSERT INTO products (sku, name, description, unit_price, cost_price, \
             min_stock_level, max_stock_level) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {PRODUCT_COLS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(&data.sku)
            .bind(&data.name)
            .bind(&data.description)
            .bind(data.unit_price)
            .bind(data.cost_price)
            .bind(data.min_stock_level)
            .bind(data.max_stock_level)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let sql = format!("SELECT {PRODUCT_COLS} FROM products WHERE id = $1");
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)
    }

    async fn find_product_by_sku(&self, sku: &str) -> Result<Option<Product>, AppError> {
        let sql = format!("SELECT {PRODUCT_COLS} FROM products WHERE sku = $1");
        sqlx::query_as::<_, Product>(&sql)
            .bind(sku)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Page<Product>, AppError> {
        let (page, limit) = clamp_page_params(filter.page, filter.limit, 10);

        // Busca livre por nome, SKU ou descrição, como no frontend antigo.
        let where_clause = "($1::text IS NULL \
               OR name ILIKE '%' || $1 || '%' \
               OR sku ILIKE '%' || $1 || '%' \
               OR COALESCE(description, '') ILIKE '%' || $1 || '%') \
             AND ($2::boolean IS NULL OR is_active = $2)";

        let count_sql = format!("SELECT COUNT(*) FROM products WHERE {where_clause}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(&filter.search)
            .bind(filter.is_active)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)?;

        let pagination = Pagination::new(page, limit, total as u64);
        let sql = format!(
            "SELECT {PRODUCT_COLS} FROM products WHERE {where_clause} \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        );
        let data = sqlx::query_as::<_, Product>(&sql)
            .bind(&filter.search)
            .bind(filter.is_active)
            .bind(limit as i64)
            .bind(pagination.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;

        Ok(Page { data, pagination })
    }

    async fn update_product(
        &self,
        id: Uuid,
        changes: ProductUpdate,
    ) -> Result<Option<Product>, AppError> {
        let sql = format!(
            "UPDATE products SET \
               name = COALESCE($2, name), \
               description = COALESCE($3, description), \
               unit_price = COALESCE($4, unit_price), \
               cost_price = COALESCE($5, cost_price), \
               min_stock_level = COALESCE($6, min_stock_level), \
               max_stock_level = COALESCE($7, max_stock_level), \
               updated_at = NOW() \
             WHERE id = $1 RETURNING {PRODUCT_COLS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(&changes.name)
            .bind(&changes.description)
            .bind(changes.unit_price)
            .bind(changes.cost_price)
            .bind(changes.min_stock_level)
            .bind(changes.max_stock_level)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)
    }

    async fn deactivate_product(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE products SET is_active = FALSE, updated_at = NOW() \
             WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    // --- Locais ---

    async fn create_location(&self, data: NewLocation) -> Result<Location, AppError> {
        sqlx::query_as::<_, Location>(
            "INSERT INTO locations (code, name) VALUES ($1, $2) \
             RETURNING id, code, name, is_active, created_at, updated_at",
        )
        .bind(&data.code)
        .bind(&data.name)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn find_location(&self, id: Uuid) -> Result<Option<Location>, AppError> {
        sqlx::query_as::<_, Location>(
            "SELECT id, code, name, is_active, created_at, updated_at \
             FROM locations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn list_locations(&self) -> Result<Vec<Location>, AppError> {
        sqlx::query_as::<_, Location>(
            "SELECT id, code, name, is_active, created_at, updated_at \
             FROM locations ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)
    }

    // --- Usuários ---

    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) \
             RETURNING id, email, password_hash, created_at, updated_at",
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at, updated_at \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at, updated_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)
    }

    // --- Lado de leitura do estoque ---

    async fn list_stock(&self, filter: StockFilter) -> Result<Vec<StockOverview>, AppError> {
        sqlx::query_as::<_, StockOverview>(
            "SELECT sl.id, sl.product_id, p.name AS product_name, p.sku AS product_sku, \
                    sl.location_id, l.name AS location_name, sl.quantity, \
                    sl.min_stock_level, sl.max_stock_level, sl.updated_at \
             FROM stock_levels sl \
             JOIN products p ON p.id = sl.product_id \
             JOIN locations l ON l.id = sl.location_id \
             WHERE p.is_active = TRUE \
               AND ($1::uuid IS NULL OR sl.product_id = $1) \
               AND ($2::uuid IS NULL OR sl.location_id = $2) \
               AND (NOT $3 OR sl.quantity <= sl.min_stock_level) \
             ORDER BY p.name ASC",
        )
        .bind(filter.product_id)
        .bind(filter.location_id)
        .bind(filter.low_stock)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn low_stock(&self, location_id: Option<Uuid>) -> Result<Vec<StockOverview>, AppError> {
        // Ordenado por quantidade crescente: o mais crítico aparece primeiro.
        sqlx::query_as::<_, StockOverview>(
            "SELECT sl.id, sl.product_id, p.name AS product_name, p.sku AS product_sku, \
                    sl.location_id, l.name AS location_name, sl.quantity, \
                    sl.min_stock_level, sl.max_stock_level, sl.updated_at \
             FROM stock_levels sl \
             JOIN products p ON p.id = sl.product_id \
             JOIN locations l ON l.id = sl.location_id \
             WHERE p.is_active = TRUE \
               AND sl.quantity <= sl.min_stock_level \
               AND ($1::uuid IS NULL OR sl.location_id = $1) \
             ORDER BY sl.quantity ASC",
        )
        .bind(location_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn out_of_stock(
        &self,
        location_id: Option<Uuid>,
    ) -> Result<Vec<StockOverview>, AppError> {
        sqlx::query_as::<_, StockOverview>(
            "SELECT sl.id, sl.product_id, p.name AS product_name, p.sku AS product_sku, \
                    sl.location_id, l.name AS location_name, sl.quantity, \
                    sl.min_stock_level, sl.max_stock_level, sl.updated_at \
             FROM stock_levels sl \
             JOIN products p ON p.id = sl.product_id \
             JOIN locations l ON l.id = sl.location_id \
             WHERE p.is_active = TRUE \
               AND sl.quantity = 0 \
               AND ($1::uuid IS NULL OR sl.location_id = $1) \
             ORDER BY p.name ASC",
        )
        .bind(location_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn total_value(&self, location_id: Option<Uuid>) -> Result<StockValueReport, AppError> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(sl.quantity * p.unit_price), 0) AS total_value, \
                    COALESCE(SUM(sl.quantity * p.cost_price), 0) AS total_cost, \
                    COUNT(DISTINCT sl.product_id) AS total_products, \
                    COALESCE(SUM(sl.quantity), 0)::BIGINT AS total_quantity \
             FROM stock_levels sl \
             JOIN products p ON p.id = sl.product_id \
             WHERE p.is_active = TRUE \
               AND ($1::uuid IS NULL OR sl.location_id = $1)",
        )
        .bind(location_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(StockValueReport {
            total_value: row.try_get("total_value").map_err(map_db_err)?,
            total_cost: row.try_get("total_cost").map_err(map_db_err)?,
            total_products: row.try_get("total_products").map_err(map_db_err)?,
            total_quantity: row.try_get("total_quantity").map_err(map_db_err)?,
        })
    }

    async fn list_movements(&self, filter: MovementFilter) -> Result<Page<Movement>, AppError> {
        let (page, limit) = clamp_page_params(filter.page, filter.limit, 20);

        let where_clause = "($1::uuid IS NULL OR product_id = $1) \
             AND ($2::uuid IS NULL OR location_id = $2) \
             AND ($3::movement_kind IS NULL OR kind = $3) \
             AND ($4::timestamptz IS NULL OR created_at >= $4) \
             AND ($5::timestamptz IS NULL OR created_at <= $5)";

        let count_sql = format!("SELECT COUNT(*) FROM movements WHERE {where_clause}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(filter.product_id)
            .bind(filter.location_id)
            .bind(filter.kind)
            .bind(filter.date_from)
            .bind(filter.date_to)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)?;

        let pagination = Pagination::new(page, limit, total as u64);
        let sql = format!(
            "SELECT {MOVEMENT_COLS} FROM movements WHERE {where_clause} \
             ORDER BY created_at DESC LIMIT $6 OFFSET $7"
        );
        let data = sqlx::query_as::<_, Movement>(&sql)
            .bind(filter.product_id)
            .bind(filter.location_id)
            .bind(filter.kind)
            .bind(filter.date_from)
            .bind(filter.date_to)
            .bind(limit as i64)
            .bind(pagination.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;

        Ok(Page { data, pagination })
    }

    async fn movement_stats(
        &self,
        location_id: Option<Uuid>,
        date_from: Option<DateTime<Utc>>,
        date_to: Option<DateTime<Utc>>,
    ) -> Result<MovementStats, AppError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total_movements, \
                    COUNT(*) FILTER (WHERE kind IN ('IN', 'TRANSFER_IN')) AS inbound_movements, \
                    COUNT(*) FILTER (WHERE kind IN ('OUT', 'TRANSFER_OUT')) AS outbound_movements, \
                    COUNT(*) FILTER (WHERE kind = 'ADJUSTMENT') AS adjustments, \
                    COALESCE(SUM(quantity) FILTER (WHERE kind IN ('IN', 'TRANSFER_IN')), 0)::BIGINT \
                        AS total_inbound_quantity, \
                    COALESCE(SUM(quantity) FILTER (WHERE kind IN ('OUT', 'TRANSFER_OUT')), 0)::BIGINT \
                        AS total_outbound_quantity \
             FROM movements \
             WHERE ($1::uuid IS NULL OR location_id = $1) \
               AND ($2::timestamptz IS NULL OR created_at >= $2) \
               AND ($3::timestamptz IS NULL OR created_at <= $3)",
        )
        .bind(location_id)
        .bind(date_from)
        .bind(date_to)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(MovementStats {
            total_movements: row.try_get("total_movements").map_err(map_db_err)?,
            inbound_movements: row.try_get("inbound_movements").map_err(map_db_err)?,
            outbound_movements: row.try_get("outbound_movements").map_err(map_db_err)?,
            adjustments: row.try_get("adjustments").map_err(map_db_err)?,
            total_inbound_quantity: row.try_get("total_inbound_quantity").map_err(map_db_err)?,
            total_outbound_quantity: row.try_get("total_outbound_quantity").map_err(map_db_err)?,
        })
    }
}

// ---
// A transação Postgres
// ---
// `Pool::begin` devolve uma Transaction que é dona da conexão, então o trait
// object não precisa carregar lifetime nenhum. Drop sem commit = ROLLBACK.
pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn level_for_update(
        &mut self,
        product_id: Uuid,
        location_id: Uuid,
    ) -> Result<Option<StockLevel>, AppError> {
        // FOR UPDATE: segura a linha até o fim da transação. Dois escritores
        // no mesmo par (produto, local) são serializados aqui.
        let sql = format!(
            "SELECT {LEVEL_COLS} FROM stock_levels \
             WHERE product_id = $1 AND location_id = $2 FOR UPDATE"
        );
        sqlx::query_as::<_, StockLevel>(&sql)
            .bind(product_id)
            .bind(location_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_err)
    }

    async fn find_or_create_level(
        &mut self,
        product_id: Uuid,
        location_id: Uuid,
        min_stock_level: i64,
        max_stock_level: Option<i64>,
    ) -> Result<LevelLookup, AppError> {
        if let Some(level) = self.level_for_update(product_id, location_id).await? {
            return Ok(LevelLookup::Found(level));
        }

        // ON CONFLICT DO NOTHING: se outro escritor criar a linha entre o
        // SELECT acima e este INSERT, caímos no re-SELECT travado abaixo.
        let insert_sql = format!(
            "INSERT INTO stock_levels (product_id, location_id, quantity, \
             min_stock_level, max_stock_level) \
             VALUES ($1, $2, 0, $3, $4) \
             ON CONFLICT (product_id, location_id) DO NOTHING \
             RETURNING {LEVEL_COLS}"
        );
        let inserted = sqlx::query_as::<_, StockLevel>(&insert_sql)
            .bind(product_id)
            .bind(location_id)
            .bind(min_stock_level)
            .bind(max_stock_level)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_err)?;

        if let Some(level) = inserted {
            return Ok(LevelLookup::Created(level));
        }

        match self.level_for_update(product_id, location_id).await? {
            Some(level) => Ok(LevelLookup::Found(level)),
            // A linha sumiu depois do conflito de INSERT: só outra transação
            // não commitada explica isso, então devolve o erro de corrida.
            None => Err(AppError::ConcurrencyConflict),
        }
    }

    async fn set_level_quantity(
        &mut self,
        level_id: Uuid,
        quantity: i64,
    ) -> Result<StockLevel, AppError> {
        let sql = format!(
            "UPDATE stock_levels SET quantity = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {LEVEL_COLS}"
        );
        sqlx::query_as::<_, StockLevel>(&sql)
            .bind(level_id)
            .bind(quantity)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_db_err)
    }

    async fn insert_movement(&mut self, data: NewMovement) -> Result<Movement, AppError> {
        let sql = format!(
            "INSERT INTO movements (product_id, location_id, kind, quantity, direction, \
             notes, user_id, source_location_id, destination_location_id, reference_movement_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {MOVEMENT_COLS}"
        );
        sqlx::query_as::<_, Movement>(&sql)
            .bind(data.product_id)
            .bind(data.location_id)
            .bind(data.kind)
            .bind(data.quantity)
            .bind(data.direction)
            .bind(&data.notes)
            .bind(data.user_id)
            .bind(data.source_location_id)
            .bind(data.destination_location_id)
            .bind(data.reference_movement_id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_db_err)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await.map_err(map_db_err)
    }
}
