// src/services/ledger_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::LedgerStore,
    models::{
        catalog::{Location, Product},
        inventory::{
            Movement, MovementDirection, MovementFilter, MovementKind, NewMovement, StockFilter,
            StockLevel, StockOverview,
        },
        page::Page,
    },
    services::notification_service::NotificationService,
};

// A soma de entrada nunca pode estourar o i64: estouro viraria saldo
// negativo no modo em memória e um erro opaco de banco no Postgres.
fn checked_total(current: i64, incoming: i64) -> Result<i64, AppError> {
    current.checked_add(incoming).ok_or_else(|| {
        AppError::InvalidMovement(
            "A quantidade informada excede o limite de saldo suportado.".into(),
        )
    })
}

// Resultado de uma transferência: as duas pernas e os dois saldos finais.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub outbound: Movement,
    pub inbound: Movement,
    pub source_level: StockLevel,
    pub destination_level: StockLevel,
}

// ---
// O livro-razão de estoque
// ---
// Toda mudança de saldo passa por aqui e vira exatamente uma linha de
// histórico (duas, no caso de transferência). Saldo e histórico são gravados
// na MESMA transação: ou os dois entram, ou nenhum.
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    notifications: NotificationService,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>, notifications: NotificationService) -> Self {
        Self {
            store,
            notifications,
        }
    }

    // --- ENTRADA / SAÍDA SIMPLES ---
    // Aceita só IN e OUT: ajuste e transferência têm as próprias operações,
    // que gravam os campos extras que esses tipos exigem.
    pub async fn record_movement(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        location_id: Uuid,
        kind: MovementKind,
        quantity: i64,
        notes: Option<String>,
    ) -> Result<(Movement, StockLevel), AppError> {
        if !matches!(kind, MovementKind::In | MovementKind::Out) {
            return Err(AppError::InvalidMovement(
                "Use as operações de ajuste ou transferência para este tipo de movimentação."
                    .into(),
            ));
        }
        if quantity <= 0 {
            return Err(AppError::InvalidMovement(
                "A quantidade deve ser maior que zero.".into(),
            ));
        }

        let product = self.active_product(product_id).await?;
        self.active_location(location_id).await?;

        let mut tx = self.store.begin().await?;

        let level = if kind == MovementKind::In {
            // Primeira entrada cria a linha zerada, já com os thresholds
            // padrão do produto.
            let lookup = tx
                .find_or_create_level(
                    product_id,
                    location_id,
                    product.min_stock_level,
                    product.max_stock_level,
                )
                .await?;
            if lookup.was_created() {
                tracing::debug!(
                    "Par produto {} / local {} passa a ser rastreado",
                    product_id,
                    location_id
                );
            }
            let level = lookup.into_inner();
            let new_quantity = checked_total(level.quantity, quantity)?;
            tx.set_level_quantity(level.id, new_quantity).await?
        } else {
            // Saída sem linha de saldo é o mesmo que saldo zero: erro, nunca clamp.
            let level = tx
                .level_for_update(product_id, location_id)
                .await?
                .ok_or(AppError::InsufficientStock {
                    available: 0,
                    requested: quantity,
                })?;
            if level.quantity < quantity {
                return Err(AppError::InsufficientStock {
                    available: level.quantity,
                    requested: quantity,
                });
            }
            tx.set_level_quantity(level.id, level.quantity - quantity)
                .await?
        };

        let movement = tx
            .insert_movement(NewMovement {
                product_id,
                location_id,
                kind,
                quantity,
                direction: None,
                notes,
                user_id,
                source_location_id: None,
                destination_location_id: None,
                reference_movement_id: None,
            })
            .await?;

        tx.commit().await?;

        // Alerta só depois do commit: a movimentação já está no livro.
        self.notifications.notify_level(&product, &level);

        Ok((movement, level))
    }

    // --- AJUSTE (CONTAGEM FÍSICA) ---
    // O chamador informa a quantidade FINAL contada; o delta vira a
    // movimentação. Reaplicar o mesmo ajuste é idempotente: delta zero não
    // grava nada no histórico.
    pub async fn adjust_stock(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        location_id: Uuid,
        new_quantity: i64,
        notes: Option<String>,
    ) -> Result<(Option<Movement>, StockLevel), AppError> {
        if new_quantity < 0 {
            return Err(AppError::InvalidMovement(
                "A quantidade final não pode ser negativa.".into(),
            ));
        }

        let product = self.active_product(product_id).await?;
        self.active_location(location_id).await?;

        let mut tx = self.store.begin().await?;

        let level = tx
            .find_or_create_level(
                product_id,
                location_id,
                product.min_stock_level,
                product.max_stock_level,
            )
            .await?
            .into_inner();

        let delta = new_quantity - level.quantity;
        if delta == 0 {
            // Contagem bateu com o sistema. Commit mesmo assim: se a linha
            // acabou de ser criada, o par passa a ser rastreado com saldo zero.
            tx.commit().await?;
            return Ok((None, level));
        }

        let updated = tx.set_level_quantity(level.id, new_quantity).await?;

        let direction = if delta > 0 {
            MovementDirection::In
        } else {
            MovementDirection::Out
        };
        let movement = tx
            .insert_movement(NewMovement {
                product_id,
                location_id,
                kind: MovementKind::Adjustment,
                quantity: delta.abs(),
                direction: Some(direction),
                notes,
                user_id,
                source_location_id: None,
                destination_location_id: None,
                reference_movement_id: None,
            })
            .await?;

        tx.commit().await?;

        self.notifications.notify_level(&product, &updated);

        Ok((Some(movement), updated))
    }

    // --- TRANSFERÊNCIA ENTRE LOCAIS ---
    // Duas pernas (TRANSFER_OUT + TRANSFER_IN) e dois saldos, tudo numa
    // transação só. A perna de entrada aponta para a de saída via
    // `reference_movement_id`.
    pub async fn transfer_stock(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        source_location_id: Uuid,
        destination_location_id: Uuid,
        quantity: i64,
        notes: Option<String>,
    ) -> Result<TransferOutcome, AppError> {
        if quantity <= 0 {
            return Err(AppError::InvalidMovement(
                "A quantidade deve ser maior que zero.".into(),
            ));
        }
        if source_location_id == destination_location_id {
            return Err(AppError::InvalidMovement(
                "Os locais de origem e destino devem ser diferentes.".into(),
            ));
        }

        let product = self.active_product(product_id).await?;
        self.active_location(source_location_id).await?;
        self.active_location(destination_location_id).await?;

        let mut tx = self.store.begin().await?;

        // A origem trava primeiro, sempre. A checagem de saldo acontece antes
        // de qualquer escrita: se faltar estoque, nada mudou.
        let source = tx
            .level_for_update(product_id, source_location_id)
            .await?
            .ok_or(AppError::InsufficientStock {
                available: 0,
                requested: quantity,
            })?;
        if source.quantity < quantity {
            return Err(AppError::InsufficientStock {
                available: source.quantity,
                requested: quantity,
            });
        }

        let destination = tx
            .find_or_create_level(
                product_id,
                destination_location_id,
                product.min_stock_level,
                product.max_stock_level,
            )
            .await?
            .into_inner();
        let destination_quantity = checked_total(destination.quantity, quantity)?;

        let source_level = tx
            .set_level_quantity(source.id, source.quantity - quantity)
            .await?;
        let destination_level = tx
            .set_level_quantity(destination.id, destination_quantity)
            .await?;

        let outbound = tx
            .insert_movement(NewMovement {
                product_id,
                location_id: source_location_id,
                kind: MovementKind::TransferOut,
                quantity,
                direction: None,
                notes: notes.clone(),
                user_id,
                source_location_id: None,
                destination_location_id: Some(destination_location_id),
                reference_movement_id: None,
            })
            .await?;
        let inbound = tx
            .insert_movement(NewMovement {
                product_id,
                location_id: destination_location_id,
                kind: MovementKind::TransferIn,
                quantity,
                direction: None,
                notes,
                user_id,
                source_location_id: Some(source_location_id),
                destination_location_id: None,
                reference_movement_id: Some(outbound.id),
            })
            .await?;

        tx.commit().await?;

        // Só a origem pode ter caído abaixo do mínimo.
        self.notifications.notify_level(&product, &source_level);

        Ok(TransferOutcome {
            outbound,
            inbound,
            source_level,
            destination_level,
        })
    }

    // --- LADO DE LEITURA ---

    pub async fn list_stock(&self, filter: StockFilter) -> Result<Vec<StockOverview>, AppError> {
        self.store.list_stock(filter).await
    }

    pub async fn low_stock(
        &self,
        location_id: Option<Uuid>,
    ) -> Result<Vec<StockOverview>, AppError> {
        self.store.low_stock(location_id).await
    }

    pub async fn out_of_stock(
        &self,
        location_id: Option<Uuid>,
    ) -> Result<Vec<StockOverview>, AppError> {
        self.store.out_of_stock(location_id).await
    }

    pub async fn list_movements(
        &self,
        filter: MovementFilter,
    ) -> Result<Page<Movement>, AppError> {
        self.store.list_movements(filter).await
    }

    // --- Pré-checagens de catálogo (fora da transação) ---

    async fn active_product(&self, product_id: Uuid) -> Result<Product, AppError> {
        let product = self
            .store
            .find_product(product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;
        if !product.is_active {
            return Err(AppError::InvalidMovement(
                "Produto desativado não pode ser movimentado.".into(),
            ));
        }
        Ok(product)
    }

    async fn active_location(&self, location_id: Uuid) -> Result<Location, AppError> {
        let location = self
            .store
            .find_location(location_id)
            .await?
            .ok_or(AppError::LocationNotFound)?;
        if !location.is_active {
            return Err(AppError::InvalidMovement(
                "Local de estoque desativado.".into(),
            ));
        }
        Ok(location)
    }
}
